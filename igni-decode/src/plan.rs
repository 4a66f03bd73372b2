//! Seek planning (C4): for a source's required PTS list, group requests
//! that share a keyframe run so the worker only seeks once per run instead
//! of once per requested frame.

use igni_expr::Rational;
use igni_source::TsEntry;

/// One keyframe-anchored group of frames to decode in a single forward
/// pass starting at `keyframe_pts`.
#[derive(Debug, Clone, PartialEq)]
pub struct SeekGroup {
    pub keyframe_pts: Rational,
    pub required: Vec<Rational>,
}

/// Builds seek groups for a sorted-unique set of required PTS values
/// against a source's probed timestamp table.
///
/// Follows the greatest-keyframe-at-or-before rule exactly: consecutive
/// required PTS values that resolve to the same keyframe are grouped, so
/// the worker reads forward from that keyframe once and extracts every
/// frame in the group in one pass.
pub fn build_plan(required: &[Rational], ts: &[TsEntry]) -> Vec<SeekGroup> {
    let keyframes: Vec<Rational> = ts.iter().filter(|e| e.is_keyframe).map(|e| e.pts).collect();

    let mut groups: Vec<SeekGroup> = Vec::new();
    for &pts in required {
        let kf = nearest_keyframe_at_or_before(&keyframes, pts);
        match groups.last_mut() {
            Some(group) if group.keyframe_pts == kf => group.required.push(pts),
            _ => groups.push(SeekGroup {
                keyframe_pts: kf,
                required: vec![pts],
            }),
        }
    }
    groups
}

fn nearest_keyframe_at_or_before(keyframes: &[Rational], pts: Rational) -> Rational {
    let idx = keyframes.partition_point(|&k| k <= pts);
    if idx == 0 {
        keyframes.first().copied().unwrap_or(Rational::zero())
    } else {
        keyframes[idx - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(num: i64, den: i64, kf: bool) -> TsEntry {
        TsEntry {
            pts: Rational::new(num, den),
            is_keyframe: kf,
        }
    }

    #[test]
    fn groups_consecutive_requests_sharing_a_keyframe() {
        let ts = vec![
            entry(0, 1, true),
            entry(1, 30, false),
            entry(2, 30, false),
            entry(3, 30, true),
            entry(4, 30, false),
        ];
        let required = vec![Rational::new(1, 30), Rational::new(2, 30), Rational::new(4, 30)];
        let groups = build_plan(&required, &ts);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].keyframe_pts, Rational::new(0, 1));
        assert_eq!(groups[0].required.len(), 2);
        assert_eq!(groups[1].keyframe_pts, Rational::new(3, 30));
        assert_eq!(groups[1].required.len(), 1);
    }

    #[test]
    fn pts_before_first_keyframe_clamps_to_it() {
        let ts = vec![entry(5, 1, true), entry(6, 1, false)];
        let groups = build_plan(&[Rational::new(0, 1)], &ts);
        assert_eq!(groups[0].keyframe_pts, Rational::new(5, 1));
    }
}
