//! Filter executor (C5): `Scale`, hand-rolled cv2-style drawing filters,
//! and the bottom-up expression tree evaluator.

pub mod draw;
pub mod error;
pub mod eval;
pub mod geometry;
pub mod scale;
pub mod text;

pub use error::RenderError;
pub use eval::{eval_root, eval_segment};
pub use scale::scale;
