//! Binary `CompactBlock` decoder (SPEC_FULL.md §3): a flat, pool-indexed
//! encoding of a `FrameExpr` tree meant to be produced by a client library
//! rather than hand-written, the same "small fixed header + side pool"
//! shape av1an's own packed chunk/grain structures use.
//!
//! Word layout (each `u64` in `words` describes one tree node):
//!
//! ```text
//! bit 63 62 | ...
//!      00   | literal pool reference, index in bits [31:0]
//!      01   | source pool reference, index in bits [31:0]
//!      10   | filter node:
//!            bits [61:48] function pool index
//!            bits [47:40] positional argument count n
//!            bits [39:32] kwarg pair count k
//!            bits [31:0]  starting offset into arg_words
//! ```
//!
//! A filter node's `arg_words` slice holds `n + 2*k` `u32`s: the first `n`
//! are positional argument node indices, the remaining `k` pairs are
//! `(key pool index, node index)` for kwargs. `k` is carried per node on the
//! wire rather than derived from the filter's registered signature — a
//! signature's kwarg slots include `opt(...)` entries the sender may omit,
//! so the slot count and the pair count actually present are not the same
//! number.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::expr::{FrameExpr, SourceId, SourceIndex};
use crate::registry;
use crate::value::Data;

const TAG_SHIFT: u32 = 62;
const TAG_LITERAL: u64 = 0b00;
const TAG_SOURCE: u64 = 0b01;
const TAG_FILTER: u64 = 0b10;

const FUNC_SHIFT: u32 = 48;
const FUNC_MASK: u64 = 0x3FFF; // 14 bits
const ARITY_SHIFT: u32 = 40;
const ARITY_MASK: u64 = 0xFF; // 8 bits
const KWARG_COUNT_SHIFT: u32 = 32;
const KWARG_COUNT_MASK: u64 = 0xFF; // 8 bits
const INDEX_MASK: u64 = 0xFFFF_FFFF; // 32 bits

/// A decoded reference to a source frame, stored in the block's source pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactSourceRef {
    pub video: SourceId,
    pub index: SourceIndex,
}

/// The flat, pool-indexed wire form of a `FrameExpr` tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompactBlock {
    pub words: Vec<u64>,
    pub arg_words: Vec<u32>,
    pub literal_pool: Vec<Data>,
    pub source_pool: Vec<CompactSourceRef>,
    pub function_pool: Vec<String>,
    pub key_pool: Vec<String>,
    /// Index into `words` of the tree's root expression.
    pub root: u32,
}

/// Maximum recursion depth a decoded tree may reach before we give up and
/// report it as too deep (also catches cycles, since a cyclic tree never
/// terminates otherwise).
const MAX_DEPTH: usize = 256;

impl CompactBlock {
    pub fn decode(&self) -> Result<FrameExpr, DecodeError> {
        self.decode_node(self.root, 0)
    }

    fn decode_node(&self, index: u32, depth: usize) -> Result<FrameExpr, DecodeError> {
        if depth >= MAX_DEPTH {
            return Err(DecodeError::CyclicOrTooDeep(format!(
                "node {index} exceeds max depth {MAX_DEPTH}"
            )));
        }
        let word = *self
            .words
            .get(index as usize)
            .ok_or(DecodeError::CorruptEnvelope)?;
        let tag = word >> TAG_SHIFT;
        match tag {
            TAG_LITERAL => {
                let pool_index = (word & INDEX_MASK) as usize;
                let value = self
                    .literal_pool
                    .get(pool_index)
                    .cloned()
                    .ok_or(DecodeError::OutOfRangePoolRef {
                        pool: "literal",
                        index: pool_index,
                        len: self.literal_pool.len(),
                    })?;
                Ok(FrameExpr::Data { value })
            }
            TAG_SOURCE => {
                let pool_index = (word & INDEX_MASK) as usize;
                let reference = self
                    .source_pool
                    .get(pool_index)
                    .cloned()
                    .ok_or(DecodeError::OutOfRangePoolRef {
                        pool: "source",
                        index: pool_index,
                        len: self.source_pool.len(),
                    })?;
                Ok(FrameExpr::Source {
                    video: reference.video,
                    index: reference.index,
                })
            }
            TAG_FILTER => self.decode_filter_node(word, depth),
            _ => Err(DecodeError::CorruptEnvelope),
        }
    }

    fn decode_filter_node(&self, word: u64, depth: usize) -> Result<FrameExpr, DecodeError> {
        let func_index = ((word >> FUNC_SHIFT) & FUNC_MASK) as usize;
        let n = ((word >> ARITY_SHIFT) & ARITY_MASK) as usize;
        let k = ((word >> KWARG_COUNT_SHIFT) & KWARG_COUNT_MASK) as usize;
        let offset = (word & INDEX_MASK) as usize;

        let name = self
            .function_pool
            .get(func_index)
            .cloned()
            .ok_or(DecodeError::OutOfRangePoolRef {
                pool: "function",
                index: func_index,
                len: self.function_pool.len(),
            })?;

        let signature = registry::lookup(&name).ok_or_else(|| DecodeError::UnknownFilter(name.clone()))?;
        if n != signature.frame_arity {
            return Err(DecodeError::ArityMismatch {
                name: name.clone(),
                expected: signature.frame_arity,
                actual: n,
            });
        }
        let total_words = n + 2 * k;
        let slice = self
            .arg_words
            .get(offset..offset + total_words)
            .ok_or(DecodeError::CorruptEnvelope)?;

        let mut args = Vec::with_capacity(n);
        for &node_index in &slice[..n] {
            args.push(self.decode_node(node_index, depth + 1)?);
        }

        let mut kwargs = Vec::with_capacity(k);
        let mut seen_keys = std::collections::HashSet::new();
        let mut present_keys = Vec::with_capacity(k);
        for pair in slice[n..].chunks_exact(2) {
            let key_index = pair[0] as usize;
            let node_index = pair[1];
            let key = self
                .key_pool
                .get(key_index)
                .cloned()
                .ok_or(DecodeError::OutOfRangePoolRef {
                    pool: "key",
                    index: key_index,
                    len: self.key_pool.len(),
                })?;
            if !seen_keys.insert(key.clone()) {
                return Err(DecodeError::DuplicateKwarg(key));
            }
            if !signature.has_kwarg(&key) {
                return Err(DecodeError::UnknownKwarg {
                    filter: name.clone(),
                    key,
                });
            }
            let value = self.decode_node(node_index, depth + 1)?;
            present_keys.push(key.clone());
            kwargs.push((key, value));
        }

        let missing = signature.required_kwargs_present(&present_keys);
        if !missing.is_empty() {
            return Err(DecodeError::MissingRequiredKwarg {
                filter: name.clone(),
                keys: missing.into_iter().map(str::to_string).collect(),
            });
        }

        Ok(FrameExpr::Filter { name, args, kwargs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rational::Rational;

    fn black_filter_word(func_index: u64, n: u64, k: u64, offset: u64) -> u64 {
        (TAG_FILTER << TAG_SHIFT) | (func_index << FUNC_SHIFT) | (n << ARITY_SHIFT) | (k << KWARG_COUNT_SHIFT) | offset
    }

    #[test]
    fn decodes_literal_root() {
        let block = CompactBlock {
            words: vec![0u64], // tag literal, index 0
            literal_pool: vec![Data::Int(42)],
            root: 0,
            ..Default::default()
        };
        let expr = block.decode().unwrap();
        assert_eq!(expr, FrameExpr::Data { value: Data::Int(42) });
    }

    #[test]
    fn decodes_source_reference() {
        let reference = CompactSourceRef {
            video: SourceId("cam1".into()),
            index: SourceIndex::ILoc { index: 7 },
        };
        let word = (TAG_SOURCE << TAG_SHIFT) | 0;
        let block = CompactBlock {
            words: vec![word],
            source_pool: vec![reference.clone()],
            root: 0,
            ..Default::default()
        };
        let expr = block.decode().unwrap();
        assert_eq!(
            expr,
            FrameExpr::Source {
                video: reference.video,
                index: reference.index,
            }
        );
    }

    #[test]
    fn decodes_black_filter_with_kwargs() {
        // node 0: literal width=64, node 1: literal height=48, node 2: literal pix_fmt
        let literal_pool = vec![Data::Int(64), Data::Int(48), Data::String("bgr24".into())];
        let key_pool = vec!["width".to_string(), "height".to_string(), "pix_fmt".to_string()];
        let function_pool = vec!["_black".to_string()];

        // arg_words: n=0 positional, then 3 kwarg pairs (key idx, node idx)
        let arg_words = vec![0u32, 0u32, 1u32, 1u32, 2u32, 2u32];

        let filter_word = black_filter_word(0, 0, 3, 0);
        let words = vec![0u64, 0u64, 0u64, filter_word];
        // words[0..3] are the literal nodes referenced by arg_words' node indices
        let words = {
            let mut w = words;
            w[0] = 0; // literal pool index 0 (width)
            w[1] = 1; // literal pool index 1 (height)
            w[2] = 2; // literal pool index 2 (pix_fmt)
            w
        };

        let block = CompactBlock {
            words,
            arg_words,
            literal_pool,
            key_pool,
            function_pool,
            root: 3,
            ..Default::default()
        };

        let expr = block.decode().unwrap();
        match expr {
            FrameExpr::Filter { name, args, kwargs } => {
                assert_eq!(name, "_black");
                assert!(args.is_empty());
                assert_eq!(kwargs.len(), 3);
                assert_eq!(kwargs[0].0, "width");
            }
            _ => panic!("expected filter node"),
        }
    }

    #[test]
    fn rejects_cyclic_tree() {
        // node 0 is a filter referencing itself as its own positional arg.
        let function_pool = vec!["Scale".to_string()];
        let key_pool = vec!["width".to_string(), "height".to_string(), "pix_fmt".to_string()];
        let literal_pool = vec![Data::Int(1), Data::Int(2)];
        let arg_words = vec![0u32, 0u32, 0u32, 0u32, 1u32, 1u32];
        let word = (TAG_FILTER << TAG_SHIFT) | (0u64 << FUNC_SHIFT) | (1u64 << ARITY_SHIFT) | 0u64;
        let block = CompactBlock {
            words: vec![word],
            arg_words,
            literal_pool,
            key_pool,
            function_pool,
            root: 0,
            ..Default::default()
        };
        let err = block.decode().unwrap_err();
        assert!(matches!(err, DecodeError::CyclicOrTooDeep(_)));
    }

    #[test]
    fn rejects_unknown_filter() {
        let block = CompactBlock {
            words: vec![(TAG_FILTER << TAG_SHIFT)],
            function_pool: vec!["not.a.filter".to_string()],
            root: 0,
            ..Default::default()
        };
        let err = block.decode().unwrap_err();
        assert!(matches!(err, DecodeError::UnknownFilter(_)));
    }

    #[test]
    fn rational_round_trips_through_source_index() {
        let t = Rational::new(3, 2);
        let reference = CompactSourceRef {
            video: SourceId("a".into()),
            index: SourceIndex::IT { t },
        };
        let block = CompactBlock {
            words: vec![TAG_SOURCE << TAG_SHIFT],
            source_pool: vec![reference],
            root: 0,
            ..Default::default()
        };
        match block.decode().unwrap() {
            FrameExpr::Source { index: SourceIndex::IT { t: got }, .. } => assert_eq!(got, t),
            _ => panic!("expected IT index"),
        }
    }
}
