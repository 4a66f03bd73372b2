//! Primitive literal values carried by `Data` expression leaves and filter
//! `kwargs`/`args`, per the wire format in SPEC_FULL.md §6
//! (`String/Int/Float/Bool/List/Bytes`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Data {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Data>),
    Bytes(Vec<u8>),
}

impl Data {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Data::Int(i) => Some(*i),
            Data::Float(f) => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Data::Int(i) => Some(*i as f64),
            Data::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Data::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Data::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Data]> {
        match self {
            Data::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Data::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Interprets a `List` of two `Int`s as an `(x, y)` point, the
    /// convention used by every cv2 geometry filter argument.
    pub fn as_point(&self) -> Option<(i64, i64)> {
        let items = self.as_list()?;
        if items.len() != 2 {
            return None;
        }
        Some((items[0].as_int()?, items[1].as_int()?))
    }

    /// Interprets a `List` of 3 or 4 `Int`s as a BGR(A) color tuple.
    pub fn as_color(&self) -> Option<[i64; 4]> {
        let items = self.as_list()?;
        match items.len() {
            3 => Some([
                items[0].as_int()?,
                items[1].as_int()?,
                items[2].as_int()?,
                255,
            ]),
            4 => Some([
                items[0].as_int()?,
                items[1].as_int()?,
                items[2].as_int()?,
                items[3].as_int()?,
            ]),
            _ => None,
        }
    }
}
