//! The outer envelope wrapping a wire-form expression submission: an
//! optional gzip layer around either the nested-tree JSON form or a
//! [`CompactBlock`](crate::compact::CompactBlock).

use std::io::Read;

use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;

use crate::compact::CompactBlock;
use crate::error::DecodeError;
use crate::expr::FrameExpr;

fn maybe_decompress(bytes: &[u8], gzip: bool) -> Result<Vec<u8>, DecodeError> {
    if !gzip {
        return Ok(bytes.to_vec());
    }
    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(DecodeError::CompressionError)?;
    Ok(out)
}

fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    serde_json::from_slice(bytes).map_err(|e| DecodeError::SchemaMismatch(e.to_string()))
}

/// Decodes a nested-tree submission: one [`FrameExpr`] per requested frame.
pub fn decode_nested(bytes: &[u8], gzip: bool) -> Result<Vec<FrameExpr>, DecodeError> {
    let raw = maybe_decompress(bytes, gzip)?;
    parse_json(&raw)
}

/// Decodes a [`CompactBlock`] submission and reifies every `frame_exprs`
/// root into a full [`FrameExpr`] tree, in order.
pub fn decode_compact(bytes: &[u8], gzip: bool) -> Result<Vec<FrameExpr>, DecodeError> {
    let raw = maybe_decompress(bytes, gzip)?;

    #[derive(serde::Deserialize)]
    struct Envelope {
        block: CompactBlock,
        frame_exprs: Vec<u32>,
    }

    let envelope: Envelope = parse_json(&raw)?;
    envelope
        .frame_exprs
        .into_iter()
        .map(|root| {
            let mut block = envelope.block.clone();
            block.root = root;
            block.decode()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Data;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn round_trips_nested_form_through_gzip() {
        let exprs = vec![FrameExpr::data(Data::Int(7))];
        let json = serde_json::to_vec(&exprs).unwrap();
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&json).unwrap();
        let gzipped = enc.finish().unwrap();

        let decoded = decode_nested(&gzipped, true).unwrap();
        assert_eq!(decoded, exprs);
    }

    #[test]
    fn rejects_corrupt_gzip() {
        let err = decode_nested(b"not gzip", true).unwrap_err();
        assert!(matches!(err, DecodeError::CompressionError(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = decode_nested(b"{not json", false).unwrap_err();
        assert!(matches!(err, DecodeError::SchemaMismatch(_)));
    }
}
