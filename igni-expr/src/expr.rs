//! The `FrameExpression` tree (SPEC_FULL.md §3) and its nested-JSON wire
//! form. `Source`, `Filter`, and `Data` are the three node kinds; whether a
//! given node evaluates to a frame or to data is determined by the static
//! filter registry (SPEC_FULL.md §4.1), not re-encoded on the wire.

use serde::{Deserialize, Serialize};

use crate::rational::Rational;

/// Opaque reference to a registered source, as carried in expression trees.
/// Kept as an owned string here rather than a UUID so this crate has no
/// dependency on the source registry: `igni-source` is free to key its own
/// handles however it likes as long as it can look one up by this id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceId(pub String);

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        SourceId(s.to_owned())
    }
}

/// How a source frame is addressed: by integer index into its timestamp
/// table, or by rational presentation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SourceIndex {
    ILoc { index: i64 },
    IT { t: Rational },
}

/// A node in the frame expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum FrameExpr {
    Source {
        video: SourceId,
        index: SourceIndex,
    },
    Filter {
        name: String,
        args: Vec<FrameExpr>,
        kwargs: Vec<(String, FrameExpr)>,
    },
    Data {
        value: crate::value::Data,
    },
}

impl FrameExpr {
    pub fn data(value: crate::value::Data) -> Self {
        FrameExpr::Data { value }
    }

    pub fn source(video: impl Into<SourceId>, index: SourceIndex) -> Self {
        FrameExpr::Source {
            video: video.into(),
            index,
        }
    }

    pub fn filter(
        name: impl Into<String>,
        args: Vec<FrameExpr>,
        kwargs: Vec<(String, FrameExpr)>,
    ) -> Self {
        FrameExpr::Filter {
            name: name.into(),
            args,
            kwargs,
        }
    }
}
