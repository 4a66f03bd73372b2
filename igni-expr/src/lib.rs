//! Frame expression model, decoder, and dependency resolver.
//!
//! This crate is intentionally free of any dependency on source or spec
//! state: it knows how to parse and walk expression trees, and it exposes
//! the [`resolve::SourceLookup`] trait for callers that need to translate
//! `ILoc` indices without creating a dependency cycle.

pub mod compact;
pub mod envelope;
pub mod error;
pub mod expr;
pub mod rational;
pub mod registry;
pub mod resolve;
pub mod validate;
pub mod value;

pub use compact::{CompactBlock, CompactSourceRef};
pub use envelope::{decode_compact, decode_nested};
pub use error::DecodeError;
pub use expr::{FrameExpr, SourceId, SourceIndex};
pub use rational::Rational;
pub use registry::{lookup as lookup_filter, FilterSignature};
pub use resolve::{resolve_roots, SourceLookup};
pub use validate::validate;
pub use value::Data;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_and_compact_forms_agree_on_a_black_frame() {
        let nested = FrameExpr::filter(
            "_black",
            vec![],
            vec![
                ("width".into(), FrameExpr::data(Data::Int(64))),
                ("height".into(), FrameExpr::data(Data::Int(48))),
                ("pix_fmt".into(), FrameExpr::data(Data::String("bgr24".into()))),
            ],
        );

        let block = compact::CompactBlock {
            words: vec![0u64, 1u64, 2u64, {
                const TAG_FILTER: u64 = 0b10;
                (TAG_FILTER << 62) | (0u64 << 48) | (0u64 << 40) | (3u64 << 32) | 0u64
            }],
            arg_words: vec![0, 0, 1, 1, 2, 2],
            literal_pool: vec![Data::Int(64), Data::Int(48), Data::String("bgr24".into())],
            key_pool: vec!["width".into(), "height".into(), "pix_fmt".into()],
            function_pool: vec!["_black".into()],
            source_pool: vec![],
            root: 3,
        };

        let decoded = block.decode().unwrap();
        assert_eq!(decoded, nested);
    }
}
