//! Dependency resolution (C3): walk a set of root expressions and collect,
//! per source, the sorted-unique set of presentation timestamps the decode
//! planner will need to produce.
//!
//! `ILoc` leaves are translated to PTS right here so everything downstream
//! works in one coordinate system, per the distilled spec. That requires
//! knowing each source's timestamp table, which lives in the source
//! registry crate — pulling that in directly would make `igni-expr` depend
//! on `igni-source`, which itself depends back on `igni-expr` for its probe
//! cache keys. Taking the lookup as a trait object keeps this crate the
//! leaf of the dependency graph, same role `av1an_core::chunk` plays as a
//! dependency-free data type other crates build on.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::DecodeError;
use crate::expr::{FrameExpr, SourceId, SourceIndex};
use crate::rational::Rational;

/// Supplies the information the resolver needs about a registered source
/// without requiring a dependency on whatever crate owns source state.
pub trait SourceLookup {
    /// The presentation timestamp of frame `index` in `source`'s timestamp
    /// table, or `None` if `index` is out of range.
    fn pts_at(&self, source: &SourceId, index: i64) -> Option<Rational>;
}

const MAX_DEPTH: usize = 256;

/// Walks every root expression, returning the per-source sorted-unique PTS
/// sets needed to decode them.
pub fn resolve_roots(
    roots: &[FrameExpr],
    lookup: &dyn SourceLookup,
) -> Result<BTreeMap<SourceId, BTreeSet<Rational>>, DecodeError> {
    let mut out: BTreeMap<SourceId, BTreeSet<Rational>> = BTreeMap::new();
    for root in roots {
        walk(root, lookup, &mut out, 0)?;
    }
    Ok(out)
}

fn walk(
    expr: &FrameExpr,
    lookup: &dyn SourceLookup,
    out: &mut BTreeMap<SourceId, BTreeSet<Rational>>,
    depth: usize,
) -> Result<(), DecodeError> {
    if depth >= MAX_DEPTH {
        return Err(DecodeError::CyclicOrTooDeep(format!(
            "expression tree exceeds max depth {MAX_DEPTH}"
        )));
    }
    match expr {
        FrameExpr::Source { video, index } => {
            let pts = match index {
                SourceIndex::IT { t } => *t,
                SourceIndex::ILoc { index } => {
                    lookup
                        .pts_at(video, *index)
                        .ok_or_else(|| DecodeError::ILocOutOfRange {
                            source: video.to_string(),
                            index: *index,
                            len: 0,
                        })?
                }
            };
            out.entry(video.clone()).or_default().insert(pts);
            Ok(())
        }
        FrameExpr::Filter { args, kwargs, .. } => {
            for arg in args {
                walk(arg, lookup, out, depth + 1)?;
            }
            for (_, value) in kwargs {
                walk(value, lookup, out, depth + 1)?;
            }
            Ok(())
        }
        FrameExpr::Data { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Data;
    use std::collections::HashMap;

    struct FakeRegistry(HashMap<String, Vec<Rational>>);

    impl SourceLookup for FakeRegistry {
        fn pts_at(&self, source: &SourceId, index: i64) -> Option<Rational> {
            self.0.get(&source.0)?.get(usize::try_from(index).ok()?).copied()
        }
    }

    #[test]
    fn collects_sorted_unique_pts_across_sources() {
        let mut table = HashMap::new();
        table.insert(
            "cam1".to_string(),
            vec![Rational::new(0, 1), Rational::new(1, 30), Rational::new(2, 30)],
        );
        let lookup = FakeRegistry(table);

        let root = FrameExpr::filter(
            "cv2.addWeighted",
            vec![
                FrameExpr::source("cam1", SourceIndex::ILoc { index: 2 }),
                FrameExpr::source("cam1", SourceIndex::ILoc { index: 0 }),
            ],
            vec![
                ("alpha".into(), FrameExpr::data(Data::Float(0.5))),
                ("beta".into(), FrameExpr::data(Data::Float(0.5))),
                ("gamma".into(), FrameExpr::data(Data::Float(0.0))),
            ],
        );

        let deps = resolve_roots(std::slice::from_ref(&root), &lookup).unwrap();
        let cam1_pts: Vec<_> = deps[&SourceId("cam1".into())].iter().copied().collect();
        assert_eq!(cam1_pts, vec![Rational::new(0, 1), Rational::new(2, 30)]);
    }

    #[test]
    fn out_of_range_iloc_is_an_error() {
        let lookup = FakeRegistry(HashMap::new());
        let root = FrameExpr::source("cam1", SourceIndex::ILoc { index: 5 });
        let err = resolve_roots(&[root], &lookup).unwrap_err();
        assert!(matches!(err, DecodeError::ILocOutOfRange { .. }));
    }

    #[test]
    fn it_leaves_pass_through_without_a_lookup() {
        let lookup = FakeRegistry(HashMap::new());
        let t = Rational::new(7, 2);
        let root = FrameExpr::source("cam1", SourceIndex::IT { t });
        let deps = resolve_roots(&[root], &lookup).unwrap();
        assert!(deps[&SourceId("cam1".into())].contains(&t));
    }
}
