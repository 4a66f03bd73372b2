//! The static filter catalog (SPEC_FULL.md §4.1): name → arity/kwarg
//! schema. Populated once via `once_cell::sync::Lazy` and never mutated,
//! the idiom `av1an-core` uses throughout for process-wide statics (see
//! e.g. `av1an/src/main.rs::version()`).
//!
//! Design rule followed by every entry here: positional `args` are always
//! frame-kind inputs (source frames to composite), and `kwargs` are always
//! data-kind parameters (geometry, colors, text, ...). This is what makes
//! "argument kinds must match (frame vs data)" a single structural check
//! at decode time rather than a per-filter special case.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// One named, optionally-required kwarg slot.
#[derive(Debug, Clone, Copy)]
pub struct KwargSlot {
    pub name: &'static str,
    pub required: bool,
}

const fn req(name: &'static str) -> KwargSlot {
    KwargSlot {
        name,
        required: true,
    }
}

const fn opt(name: &'static str) -> KwargSlot {
    KwargSlot {
        name,
        required: false,
    }
}

#[derive(Debug, Clone)]
pub struct FilterSignature {
    /// Number of positional (frame-kind) arguments this filter takes.
    pub frame_arity: usize,
    /// Kwarg schema (data-kind parameters).
    pub kwargs: &'static [KwargSlot],
}

impl FilterSignature {
    pub fn required_kwargs_present(&self, present: &[String]) -> Vec<&'static str> {
        self.kwargs
            .iter()
            .filter(|slot| slot.required && !present.iter().any(|p| p == slot.name))
            .map(|slot| slot.name)
            .collect()
    }

    /// Whether `key` is a declared slot (required or `opt`) on this signature.
    pub fn has_kwarg(&self, key: &str) -> bool {
        self.kwargs.iter().any(|slot| slot.name == key)
    }
}

macro_rules! sig {
    ($arity:expr, [$($slot:expr),* $(,)?]) => {
        FilterSignature {
            frame_arity: $arity,
            kwargs: &[$($slot),*],
        }
    };
}

pub static FILTER_REGISTRY: Lazy<HashMap<&'static str, FilterSignature>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("Scale", sig!(1, [req("width"), req("height"), req("pix_fmt")]));
    m.insert(
        "_black",
        sig!(0, [req("width"), req("height"), req("pix_fmt"), opt("color")]),
    );
    m.insert(
        "_inline_mat",
        sig!(
            0,
            [
                req("width"),
                req("height"),
                req("pix_fmt"),
                req("data"),
                opt("compression"),
            ]
        ),
    );
    m.insert(
        "_slice_mat",
        sig!(1, [req("y0"), req("y1"), req("x0"), req("x1")]),
    );
    m.insert(
        "_slice_write_mat",
        sig!(2, [req("y0"), req("y1"), req("x0"), req("x1")]),
    );
    m.insert(
        "cv2.rectangle",
        sig!(
            1,
            [
                req("pt1"),
                req("pt2"),
                req("color"),
                opt("thickness"),
                opt("lineType"),
                opt("shift"),
            ]
        ),
    );
    m.insert(
        "cv2.circle",
        sig!(
            1,
            [
                req("center"),
                req("radius"),
                req("color"),
                opt("thickness"),
                opt("lineType"),
                opt("shift"),
            ]
        ),
    );
    m.insert(
        "cv2.line",
        sig!(
            1,
            [
                req("pt1"),
                req("pt2"),
                req("color"),
                opt("thickness"),
                opt("lineType"),
                opt("shift"),
            ]
        ),
    );
    m.insert(
        "cv2.ellipse",
        sig!(
            1,
            [
                req("center"),
                req("axes"),
                req("angle"),
                req("startAngle"),
                req("endAngle"),
                req("color"),
                opt("thickness"),
                opt("lineType"),
                opt("shift"),
            ]
        ),
    );
    m.insert(
        "cv2.arrowedLine",
        sig!(
            1,
            [
                req("pt1"),
                req("pt2"),
                req("color"),
                opt("thickness"),
                opt("lineType"),
                opt("shift"),
                opt("tipLength"),
            ]
        ),
    );
    m.insert(
        "cv2.polylines",
        sig!(
            1,
            [
                req("pts"),
                req("isClosed"),
                req("color"),
                opt("thickness"),
                opt("lineType"),
                opt("shift"),
            ]
        ),
    );
    m.insert(
        "cv2.fillPoly",
        sig!(1, [req("pts"), req("color"), opt("lineType"), opt("shift")]),
    );
    m.insert(
        "cv2.drawMarker",
        sig!(
            1,
            [
                req("position"),
                req("color"),
                opt("markerType"),
                opt("markerSize"),
                opt("thickness"),
                opt("line_type"),
            ]
        ),
    );
    m.insert(
        "cv2.drawContours",
        sig!(
            1,
            [
                req("contours"),
                req("contourIdx"),
                req("color"),
                opt("thickness"),
                opt("lineType"),
            ]
        ),
    );
    m.insert(
        "cv2.putText",
        sig!(
            1,
            [
                req("text"),
                req("org"),
                req("fontFace"),
                req("fontScale"),
                req("color"),
                opt("thickness"),
                opt("lineType"),
                opt("bottomLeftOrigin"),
            ]
        ),
    );
    m.insert(
        "cv2.addWeighted",
        sig!(2, [req("alpha"), req("beta"), req("gamma")]),
    );
    m
});

pub fn lookup(name: &str) -> Option<&'static FilterSignature> {
    FILTER_REGISTRY.get(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_is_registered() {
        let sig = lookup("Scale").unwrap();
        assert_eq!(sig.frame_arity, 1);
        assert!(sig.kwargs.iter().any(|s| s.name == "width"));
    }

    #[test]
    fn unknown_filter_absent() {
        assert!(lookup("cv2.doesNotExist").is_none());
    }

    #[test]
    fn missing_required_kwarg_detected() {
        let sig = lookup("cv2.rectangle").unwrap();
        let present = vec!["pt1".to_string(), "pt2".to_string()];
        let missing = sig.required_kwargs_present(&present);
        assert_eq!(missing, vec!["color"]);
    }
}
