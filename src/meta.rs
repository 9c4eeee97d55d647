//! Result-metadata extraction
//!
//! The network's result metadata has evolved through schema versions; a
//! terminal `Success` carries a blob whose first byte tags the version.
//! Extraction dispatches through a single table probed newest-first — one
//! decode function per version, no nested optional-field sniffing. A blob
//! missing its execution section is an error, never a silent `None`;
//! a present section with no emitted value is the legitimate void outcome.
//!
//! Blob layout (after the version tag):
//! - v3: flags `u8` (bit 0 = execution section present); if present, a
//!   marker `u8` (0 = void, 1 = wire value follows).
//! - v4: as v3, followed by a `u32` big-endian diagnostic-event count and
//!   that many length-prefixed opaque event blobs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;
use tracing::trace;

use crate::codec::{self, CodecError, Decoded, WireValue};

pub const META_V3: u8 = 3;
pub const META_V4: u8 = 4;

const FLAG_EXECUTION: u8 = 0b0000_0001;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetaError {
    /// No decoder matched the version tag
    #[error("unsupported result metadata version {version}")]
    UnsupportedVersion { version: u8 },

    /// Structural inconsistency: a section the version requires is missing
    #[error("incomplete result metadata: {0}")]
    Incomplete(&'static str),

    /// Blob is not parseable at all
    #[error("malformed result metadata: {0}")]
    Malformed(String),

    /// The embedded return value failed to decode
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Execution section common to all supported versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMeta {
    /// The invoked function's return value; `None` for void functions
    pub return_value: Option<WireValue>,
}

/// Parsed metadata, tagged by schema version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionMeta {
    V3 {
        execution: Option<ExecutionMeta>,
    },
    V4 {
        execution: Option<ExecutionMeta>,
        diagnostic_events: u32,
    },
}

impl TransactionMeta {
    fn execution(&self) -> Option<&ExecutionMeta> {
        match self {
            Self::V3 { execution } | Self::V4 { execution, .. } => execution.as_ref(),
        }
    }
}

type MetaDecoder = fn(&[u8]) -> Result<TransactionMeta, MetaError>;

/// Version dispatch table, newest first.
const DECODERS: &[(u8, MetaDecoder)] = &[(META_V4, decode_v4), (META_V3, decode_v3)];

/// Parse a raw metadata blob (without base64 wrapping).
pub fn parse_meta(bytes: &[u8]) -> Result<TransactionMeta, MetaError> {
    let (&version, body) = bytes
        .split_first()
        .ok_or_else(|| MetaError::Malformed("empty blob".to_string()))?;
    let decoder = DECODERS
        .iter()
        .find(|(tag, _)| *tag == version)
        .map(|(_, f)| f)
        .ok_or(MetaError::UnsupportedVersion { version })?;
    trace!(version, len = bytes.len(), "decoding result metadata");
    decoder(body)
}

/// Locate and decode the invoked function's return value.
///
/// `meta` is the base64 blob attached to a terminal `Success` status;
/// its absence is a structural inconsistency, not a void return.
pub fn extract_return_value(meta: Option<&str>) -> Result<Decoded, MetaError> {
    let encoded = meta.ok_or(MetaError::Incomplete("result metadata missing"))?;
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| MetaError::Malformed(format!("base64: {e}")))?;
    let parsed = parse_meta(&bytes)?;
    let execution = parsed
        .execution()
        .ok_or(MetaError::Incomplete("execution meta section missing"))?;
    match &execution.return_value {
        None => Ok(Decoded::Absent),
        Some(wire) => Ok(codec::decode(wire)),
    }
}

fn decode_execution(body: &[u8]) -> Result<(Option<ExecutionMeta>, usize), MetaError> {
    let flags = *body
        .first()
        .ok_or_else(|| MetaError::Malformed("missing flags byte".to_string()))?;
    if flags & FLAG_EXECUTION == 0 {
        return Ok((None, 1));
    }
    let marker = *body
        .get(1)
        .ok_or_else(|| MetaError::Malformed("missing return marker".to_string()))?;
    match marker {
        0 => Ok((Some(ExecutionMeta { return_value: None }), 2)),
        1 => {
            let (wire, consumed) = read_wire_value(&body[2..])?;
            Ok((
                Some(ExecutionMeta {
                    return_value: Some(wire),
                }),
                2 + consumed,
            ))
        }
        other => Err(MetaError::Malformed(format!("return marker {other}"))),
    }
}

// Wire values are self-delimiting; parse one and report how many bytes it
// spanned so the surrounding body can continue.
fn read_wire_value(bytes: &[u8]) -> Result<(WireValue, usize), MetaError> {
    let mut reader = crate::codec::reader::Reader::new(bytes);
    let wire = WireValue::read(&mut reader)?;
    let consumed = bytes.len() - reader.remaining();
    Ok((wire, consumed))
}

fn decode_v3(body: &[u8]) -> Result<TransactionMeta, MetaError> {
    let (execution, consumed) = decode_execution(body)?;
    if consumed != body.len() {
        return Err(MetaError::Malformed(format!(
            "{} trailing bytes in v3 body",
            body.len() - consumed
        )));
    }
    Ok(TransactionMeta::V3 { execution })
}

fn decode_v4(body: &[u8]) -> Result<TransactionMeta, MetaError> {
    let (execution, consumed) = decode_execution(body)?;
    let rest = &body[consumed..];
    if rest.len() < 4 {
        return Err(MetaError::Malformed(
            "v4 body missing event count".to_string(),
        ));
    }
    let count = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]);
    let mut cursor = &rest[4..];
    for _ in 0..count {
        if cursor.len() < 4 {
            return Err(MetaError::Malformed("truncated event".to_string()));
        }
        let len = u32::from_be_bytes([cursor[0], cursor[1], cursor[2], cursor[3]]) as usize;
        if cursor.len() < 4 + len {
            return Err(MetaError::Malformed("truncated event body".to_string()));
        }
        cursor = &cursor[4 + len..];
    }
    if !cursor.is_empty() {
        return Err(MetaError::Malformed(format!(
            "{} trailing bytes in v4 body",
            cursor.len()
        )));
    }
    Ok(TransactionMeta::V4 {
        execution,
        diagnostic_events: count,
    })
}

/// Encode a v3 blob. Tests and mock nodes produce these; a real node emits
/// them from its side of the wire.
pub fn encode_meta_v3(return_value: Option<&WireValue>) -> String {
    STANDARD.encode(encode_body(META_V3, return_value, None))
}

/// Encode a v4 blob with opaque diagnostic events.
pub fn encode_meta_v4(return_value: Option<&WireValue>, events: &[Vec<u8>]) -> String {
    STANDARD.encode(encode_body(META_V4, return_value, Some(events)))
}

/// Encode a blob whose execution section is absent — structurally
/// inconsistent on purpose, for exercising the `Incomplete` path.
pub fn encode_meta_without_execution(version: u8) -> String {
    STANDARD.encode(match version {
        META_V4 => vec![version, 0u8, 0, 0, 0, 0],
        _ => vec![version, 0u8],
    })
}

fn encode_body(version: u8, return_value: Option<&WireValue>, events: Option<&[Vec<u8>]>) -> Vec<u8> {
    let mut out = vec![version, FLAG_EXECUTION];
    match return_value {
        None => out.push(0),
        Some(wire) => {
            out.push(1);
            out.extend_from_slice(&wire.to_bytes());
        }
    }
    if let Some(events) = events {
        out.extend_from_slice(&(events.len() as u32).to_be_bytes());
        for event in events {
            out.extend_from_slice(&(event.len() as u32).to_be_bytes());
            out.extend_from_slice(event);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::NativeValue;

    #[test]
    fn v3_value_extracts() {
        let blob = encode_meta_v3(Some(&WireValue::I32(42)));
        let decoded = extract_return_value(Some(&blob)).unwrap();
        assert_eq!(decoded, Decoded::Value(NativeValue::I32(42)));
    }

    #[test]
    fn v4_value_extracts_past_events() {
        let events = vec![b"diag one".to_vec(), b"diag two".to_vec()];
        let blob = encode_meta_v4(Some(&WireValue::Str("done".into())), &events);
        let decoded = extract_return_value(Some(&blob)).unwrap();
        assert_eq!(decoded, Decoded::Value(NativeValue::Str("done".into())));
    }

    #[test]
    fn void_return_is_absent_not_error() {
        let blob = encode_meta_v3(None);
        assert_eq!(extract_return_value(Some(&blob)).unwrap(), Decoded::Absent);

        let blob = encode_meta_v4(None, &[]);
        assert_eq!(extract_return_value(Some(&blob)).unwrap(), Decoded::Absent);
    }

    #[test]
    fn unknown_version_reports_the_tag() {
        let blob = STANDARD.encode([9u8, 0u8]);
        let err = extract_return_value(Some(&blob)).unwrap_err();
        assert_eq!(err, MetaError::UnsupportedVersion { version: 9 });
    }

    #[test]
    fn missing_blob_is_incomplete() {
        let err = extract_return_value(None).unwrap_err();
        assert!(matches!(err, MetaError::Incomplete(_)));
    }

    #[test]
    fn missing_execution_section_is_incomplete() {
        for version in [META_V3, META_V4] {
            let blob = encode_meta_without_execution(version);
            let err = extract_return_value(Some(&blob)).unwrap_err();
            assert!(matches!(err, MetaError::Incomplete(_)), "v{version}");
        }
    }

    #[test]
    fn garbled_blob_is_malformed() {
        assert!(matches!(
            extract_return_value(Some("not-base64!!")),
            Err(MetaError::Malformed(_))
        ));
        let empty = STANDARD.encode::<&[u8]>(&[]);
        assert!(matches!(
            extract_return_value(Some(&empty)),
            Err(MetaError::Malformed(_))
        ));
    }

    #[test]
    fn dispatch_table_is_newest_first() {
        assert_eq!(DECODERS[0].0, META_V4);
        assert_eq!(DECODERS[1].0, META_V3);
    }

    #[test]
    fn parse_meta_exposes_version() {
        let v3 = STANDARD.decode(encode_meta_v3(None)).unwrap();
        assert!(matches!(parse_meta(&v3).unwrap(), TransactionMeta::V3 { .. }));

        let v4 = STANDARD
            .decode(encode_meta_v4(None, &[b"e".to_vec()]))
            .unwrap();
        match parse_meta(&v4).unwrap() {
            TransactionMeta::V4 {
                diagnostic_events, ..
            } => assert_eq!(diagnostic_events, 1),
            other => panic!("expected v4, got {other:?}"),
        }
    }
}
