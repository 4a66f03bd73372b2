//! The spec state machine (C7, SPEC_FULL.md §4.7): parts, contiguous
//! applied-frontier, termination. Mutation is serialized under a per-spec
//! `parking_lot::Mutex`, the same "hold the lock only across the
//! synchronous transition, never across an await point" rule
//! `igni-source::SourceRegistry` already follows with its `RwLock`.

use std::time::{Duration, SystemTime};

use igni_expr::{FrameExpr, Rational};

use crate::error::StateError;
use crate::ids::{SpecId, TenantId};

/// `pos -> PartRow`; `pos` is the first frame index the part covers.
#[derive(Debug, Clone)]
pub struct PartRow {
    pub frames: Vec<(Rational, FrameExpr)>,
    pub terminal: bool,
}

impl PartRow {
    pub fn len(&self) -> u64 {
        self.frames.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Static descriptor, fixed at `POST /v2/spec` time.
#[derive(Debug, Clone)]
pub struct SpecDescriptor {
    pub id: SpecId,
    pub tenant: TenantId,
    pub width: u32,
    pub height: u32,
    pub pix_fmt: String,
    pub segment_length: Rational,
    pub frame_rate: Rational,
    pub ready_hook: Option<String>,
    pub steer_hook: Option<String>,
    pub created_at: SystemTime,
    pub expires_at: SystemTime,
}

impl SpecDescriptor {
    /// Frames per segment, `L · frame_rate` (SPEC_FULL.md §3's `R_k`).
    pub fn segment_frames(&self) -> u64 {
        let r = self.segment_length * self.frame_rate;
        r.to_f64().round() as u64
    }
}

/// The mutable part of a spec: parts, frontier, termination.
#[derive(Debug, Default)]
pub struct SpecState {
    parts: std::collections::BTreeMap<u64, PartRow>,
    /// Next position not yet absorbed into the committed frame count.
    frontier: u64,
    terminal_pos: Option<u64>,
    closed: bool,
}

impl SpecState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frontier(&self) -> u64 {
        self.frontier
    }

    pub fn closed(&self) -> bool {
        self.closed
    }

    pub fn terminal_pos(&self) -> Option<u64> {
        self.terminal_pos
    }

    /// Highest committed frame index, `N` in SPEC_FULL.md §3 — equal to the
    /// frontier once the spec is closed, since the frontier cannot advance
    /// any further past the terminal part.
    pub fn committed_frames(&self) -> u64 {
        self.frontier
    }

    /// `push_part(pos, frames, terminal)` (SPEC_FULL.md §4.7). Validates,
    /// inserts, then advances the frontier as far as contiguous parts allow.
    pub fn push_part(&mut self, pos: u64, frames: Vec<(Rational, FrameExpr)>, terminal: bool) -> Result<(), StateError> {
        if self.closed {
            return Err(StateError::Terminated);
        }
        if !terminal && frames.is_empty() {
            return Err(StateError::EmptyNonTerminal(pos));
        }
        if self.parts.contains_key(&pos) {
            return Err(StateError::AlreadyExists(pos));
        }
        let len = frames.len() as u64;
        if let Some(terminal_pos) = self.terminal_pos {
            if pos + len > terminal_pos + 1 {
                return Err(StateError::PastTerminal { pos, len, terminal_pos });
            }
        }

        self.parts.insert(pos, PartRow { frames, terminal });
        if terminal {
            // A terminal part of length 0 closes at `pos - 1`: nothing past
            // the frontier already committed is ever written.
            self.terminal_pos = Some(if len == 0 { pos.saturating_sub(1) } else { pos + len - 1 });
        }

        while let Some(row) = self.parts.get(&self.frontier) {
            if row.is_empty() {
                break;
            }
            self.frontier += row.len();
        }

        if let Some(terminal_pos) = self.terminal_pos {
            if self.frontier > terminal_pos {
                self.closed = true;
            }
        }
        Ok(())
    }

    /// Frames the contiguous frontier has absorbed for expression roots,
    /// used to fetch the `[start, end)` slice of a ready segment.
    pub fn frames_in(&self, start: u64, end: u64) -> Vec<FrameExpr> {
        let mut out = Vec::with_capacity((end - start) as usize);
        for (&pos, row) in self.parts.range(..end) {
            if pos + row.len() <= start {
                continue;
            }
            for (i, (_, expr)) in row.frames.iter().enumerate() {
                let idx = pos + i as u64;
                if idx >= start && idx < end {
                    out.push(expr.clone());
                }
            }
        }
        out
    }
}

pub fn expiry_deadline(ttl: Duration) -> SystemTime {
    SystemTime::now() + ttl
}

#[cfg(test)]
mod tests {
    use super::*;
    use igni_expr::Data;

    fn frames(n: u64) -> Vec<(Rational, FrameExpr)> {
        (0..n)
            .map(|i| (Rational::new(i as i64, 30), FrameExpr::data(Data::Int(i as i64))))
            .collect()
    }

    #[test]
    fn frontier_advances_contiguously() {
        let mut state = SpecState::new();
        state.push_part(0, frames(3), false).unwrap();
        assert_eq!(state.frontier(), 3);
        state.push_part(3, frames(3), false).unwrap();
        assert_eq!(state.frontier(), 6);
    }

    #[test]
    fn backward_push_applies_once_gap_fills() {
        let mut state = SpecState::new();
        state.push_part(3, frames(3), false).unwrap();
        assert_eq!(state.frontier(), 0);
        state.push_part(0, frames(3), false).unwrap();
        assert_eq!(state.frontier(), 6);
    }

    #[test]
    fn duplicate_pos_is_rejected() {
        let mut state = SpecState::new();
        state.push_part(0, frames(1), false).unwrap();
        let err = state.push_part(0, frames(1), false).unwrap_err();
        assert_eq!(err, StateError::AlreadyExists(0));
    }

    #[test]
    fn empty_non_terminal_is_rejected() {
        let mut state = SpecState::new();
        let err = state.push_part(0, Vec::new(), false).unwrap_err();
        assert_eq!(err, StateError::EmptyNonTerminal(0));
    }

    #[test]
    fn push_past_terminal_is_rejected() {
        let mut state = SpecState::new();
        state.push_part(0, frames(3), true).unwrap();
        assert!(state.closed());
        let err = state.push_part(3, frames(1), false).unwrap_err();
        assert!(matches!(err, StateError::PastTerminal { .. }));
    }

    #[test]
    fn order_independence_of_push() {
        let build = |order: &[u64]| {
            let mut state = SpecState::new();
            let parts: std::collections::HashMap<u64, (Vec<(Rational, FrameExpr)>, bool)> = [
                (0u64, (frames(3), false)),
                (3, (frames(3), false)),
                (6, (Vec::new(), true)),
            ]
            .into_iter()
            .collect();
            for &pos in order {
                let (f, t) = parts[&pos].clone();
                state.push_part(pos, f, t).unwrap();
            }
            (state.frontier(), state.closed())
        };
        assert_eq!(build(&[0, 3, 6]), build(&[6, 0, 3]));
        assert_eq!(build(&[0, 3, 6]), build(&[3, 6, 0]));
    }

    /// S3: a wider arrival shuffle than [`order_independence_of_push`]'s
    /// three-part case, covering six parts across a handful of distinct
    /// hand-picked orderings (no `rand` dependency in this workspace).
    #[test]
    fn push_order_independence_stress() {
        let parts: std::collections::HashMap<u64, (Vec<(Rational, FrameExpr)>, bool)> = [
            (0u64, (frames(4), false)),
            (4, (frames(4), false)),
            (8, (frames(4), false)),
            (12, (frames(4), false)),
            (16, (frames(4), false)),
            (20, (Vec::new(), true)),
        ]
        .into_iter()
        .collect();
        let positions: Vec<u64> = parts.keys().copied().collect();

        let build = |order: &[u64]| {
            let mut state = SpecState::new();
            for &pos in order {
                let (f, t) = parts[&pos].clone();
                state.push_part(pos, f, t).unwrap();
            }
            (state.frontier(), state.closed())
        };

        let orderings: [&[u64]; 4] = [
            &[0, 4, 8, 12, 16, 20],
            &[20, 16, 12, 8, 4, 0],
            &[8, 0, 20, 4, 16, 12],
            &[12, 20, 0, 16, 8, 4],
        ];
        let expected = build(&positions);
        for ordering in orderings {
            assert_eq!(build(ordering), expected);
        }
        assert_eq!(expected, (20, true));
    }
}
