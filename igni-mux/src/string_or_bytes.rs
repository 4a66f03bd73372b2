//! A captured process stream that might not be valid UTF-8, carried
//! verbatim from `av1an_core::broker::StringOrBytes` — a crashed encoder's
//! stderr is still worth reporting even when it isn't text.

use std::fmt::{self, Debug};

#[derive(Clone)]
pub enum StringOrBytes {
    String(String),
    Bytes(Vec<u8>),
}

impl Debug for StringOrBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Bytes(b) => write!(f, "raw bytes: {b:?}"),
        }
    }
}

impl From<Vec<u8>> for StringOrBytes {
    fn from(bytes: Vec<u8>) -> Self {
        match simdutf8::basic::from_utf8(&bytes) {
            Ok(_) => Self::String(unsafe { String::from_utf8_unchecked(bytes) }),
            Err(_) => Self::Bytes(bytes),
        }
    }
}

impl From<String> for StringOrBytes {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_utf8_becomes_string_variant() {
        let sb: StringOrBytes = b"hello".to_vec().into();
        assert!(matches!(sb, StringOrBytes::String(_)));
    }

    #[test]
    fn invalid_utf8_becomes_bytes_variant() {
        let sb: StringOrBytes = vec![0xff, 0xfe, 0x00].into();
        assert!(matches!(sb, StringOrBytes::Bytes(_)));
    }
}
