//! Push-time structural validation (SPEC_FULL.md §4.1, §9): the same checks
//! [`crate::compact::CompactBlock::decode`] already runs against the binary
//! wire form — unknown filter, arity mismatch, duplicate/unknown/missing
//! kwargs — plus an `ILoc` range check against the source's timestamp
//! table, run here against an already-reified [`FrameExpr`] tree so both
//! wire forms are rejected at ingest rather than only at segment build.

use std::collections::HashSet;

use crate::error::DecodeError;
use crate::expr::{FrameExpr, SourceIndex};
use crate::registry;
use crate::resolve::SourceLookup;

const MAX_DEPTH: usize = 256;

/// Validates one root expression tree against the filter registry and a
/// source lookup, recursing into every argument and kwarg value.
pub fn validate(root: &FrameExpr, lookup: &dyn SourceLookup) -> Result<(), DecodeError> {
    validate_node(root, lookup, 0)
}

fn validate_node(expr: &FrameExpr, lookup: &dyn SourceLookup, depth: usize) -> Result<(), DecodeError> {
    if depth >= MAX_DEPTH {
        return Err(DecodeError::CyclicOrTooDeep(format!(
            "expression tree exceeds max depth {MAX_DEPTH}"
        )));
    }
    match expr {
        FrameExpr::Data { .. } => Ok(()),
        FrameExpr::Source { video, index } => {
            if let SourceIndex::ILoc { index } = index {
                lookup.pts_at(video, *index).ok_or_else(|| DecodeError::ILocOutOfRange {
                    source: video.to_string(),
                    index: *index,
                    len: 0,
                })?;
            }
            Ok(())
        }
        FrameExpr::Filter { name, args, kwargs } => {
            let signature = registry::lookup(name).ok_or_else(|| DecodeError::UnknownFilter(name.clone()))?;
            if args.len() != signature.frame_arity {
                return Err(DecodeError::ArityMismatch {
                    name: name.clone(),
                    expected: signature.frame_arity,
                    actual: args.len(),
                });
            }

            let mut seen = HashSet::new();
            let mut present = Vec::with_capacity(kwargs.len());
            for (key, _) in kwargs {
                if !seen.insert(key.clone()) {
                    return Err(DecodeError::DuplicateKwarg(key.clone()));
                }
                if !signature.has_kwarg(key) {
                    return Err(DecodeError::UnknownKwarg {
                        filter: name.clone(),
                        key: key.clone(),
                    });
                }
                present.push(key.clone());
            }
            let missing = signature.required_kwargs_present(&present);
            if !missing.is_empty() {
                return Err(DecodeError::MissingRequiredKwarg {
                    filter: name.clone(),
                    keys: missing.into_iter().map(str::to_string).collect(),
                });
            }

            for arg in args {
                validate_node(arg, lookup, depth + 1)?;
            }
            for (_, value) in kwargs {
                validate_node(value, lookup, depth + 1)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{SourceId, SourceIndex};
    use crate::value::Data;
    use std::collections::HashMap;

    struct FakeLookup(HashMap<String, usize>);

    impl SourceLookup for FakeLookup {
        fn pts_at(&self, source: &SourceId, index: i64) -> Option<crate::rational::Rational> {
            let len = *self.0.get(&source.0)?;
            if index >= 0 && (index as usize) < len {
                Some(crate::rational::Rational::new(index, 30))
            } else {
                None
            }
        }
    }

    fn lookup_with(video: &str, len: usize) -> FakeLookup {
        let mut m = HashMap::new();
        m.insert(video.to_string(), len);
        FakeLookup(m)
    }

    #[test]
    fn unknown_filter_is_rejected() {
        let expr = FrameExpr::filter("not.a.filter", vec![], vec![]);
        let err = validate(&expr, &lookup_with("cam1", 10)).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownFilter(_)));
    }

    #[test]
    fn arity_mismatch_is_rejected() {
        let expr = FrameExpr::filter(
            "Scale",
            vec![FrameExpr::data(Data::Int(1)), FrameExpr::data(Data::Int(2))],
            vec![
                ("width".into(), FrameExpr::data(Data::Int(64))),
                ("height".into(), FrameExpr::data(Data::Int(48))),
                ("pix_fmt".into(), FrameExpr::data(Data::String("bgr24".into()))),
            ],
        );
        let err = validate(&expr, &lookup_with("cam1", 10)).unwrap_err();
        assert!(matches!(err, DecodeError::ArityMismatch { .. }));
    }

    #[test]
    fn missing_required_kwarg_is_rejected() {
        let expr = FrameExpr::filter(
            "cv2.rectangle",
            vec![FrameExpr::filter(
                "_black",
                vec![],
                vec![
                    ("width".into(), FrameExpr::data(Data::Int(64))),
                    ("height".into(), FrameExpr::data(Data::Int(48))),
                    ("pix_fmt".into(), FrameExpr::data(Data::String("bgr24".into()))),
                ],
            )],
            vec![
                ("pt1".into(), FrameExpr::data(Data::List(vec![Data::Int(0), Data::Int(0)]))),
                ("pt2".into(), FrameExpr::data(Data::List(vec![Data::Int(1), Data::Int(1)]))),
            ],
        );
        let err = validate(&expr, &lookup_with("cam1", 10)).unwrap_err();
        assert!(matches!(err, DecodeError::MissingRequiredKwarg { .. }));
    }

    #[test]
    fn unknown_kwarg_is_rejected() {
        let expr = FrameExpr::filter(
            "_black",
            vec![],
            vec![
                ("width".into(), FrameExpr::data(Data::Int(64))),
                ("height".into(), FrameExpr::data(Data::Int(48))),
                ("pix_fmt".into(), FrameExpr::data(Data::String("bgr24".into()))),
                ("bogus".into(), FrameExpr::data(Data::Int(1))),
            ],
        );
        let err = validate(&expr, &lookup_with("cam1", 10)).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownKwarg { .. }));
    }

    #[test]
    fn out_of_range_iloc_is_rejected() {
        let expr = FrameExpr::source("cam1", SourceIndex::ILoc { index: 99 });
        let err = validate(&expr, &lookup_with("cam1", 10)).unwrap_err();
        assert!(matches!(err, DecodeError::ILocOutOfRange { .. }));
    }

    #[test]
    fn in_range_iloc_and_well_formed_filter_pass() {
        let expr = FrameExpr::filter(
            "Scale",
            vec![FrameExpr::source("cam1", SourceIndex::ILoc { index: 3 })],
            vec![
                ("width".into(), FrameExpr::data(Data::Int(64))),
                ("height".into(), FrameExpr::data(Data::Int(48))),
                ("pix_fmt".into(), FrameExpr::data(Data::String("bgr24".into()))),
            ],
        );
        assert!(validate(&expr, &lookup_with("cam1", 10)).is_ok());
    }
}
