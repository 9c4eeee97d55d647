//! Transaction result-code decoding
//!
//! The node reports submission and execution failures as a small signed
//! integer wrapped in a base64 payload. This module maps the fixed code
//! table to human-readable category labels. Unknown codes map to a generic
//! "unrecognized code N" label and never raise: the table on the node side
//! can grow ahead of the client.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::codec::CodecError;

/// Category label for a raw transaction result code.
///
/// Labels are stable strings used in errors, logs and caller-facing
/// messages; several codes collapse into the same category on purpose
/// (e.g. both signature-related rejections are "bad authorization").
pub fn category_for_code(code: i32) -> String {
    let label = match code {
        -1 => "failed",
        -2 => "too early",
        -3 => "too late",
        -4 => "malformed",
        -5 => "bad sequence",
        -6 => "bad authorization",
        -7 => "insufficient balance",
        -8 => "account missing",
        -9 => "insufficient fee",
        -10 => "bad authorization",
        -11 => "internal",
        -12 => "unsupported",
        -13 => "other",
        -14 => "other",
        -15 => "too early",
        -16 => "malformed",
        -17 => "malformed",
        other => return format!("unrecognized code {other}"),
    };
    label.to_string()
}

/// Decode a raw base64 error payload into `(code, category)`.
///
/// Payload layout: the result code as a big-endian `i32` in the first four
/// bytes; anything after it (fee charged, per-operation results) is opaque
/// to this client and ignored.
pub fn decode_error(raw_payload: &str) -> Result<(i32, String), CodecError> {
    let bytes = STANDARD
        .decode(raw_payload)
        .map_err(|e| CodecError::Base64(e.to_string()))?;
    if bytes.len() < 4 {
        return Err(CodecError::Truncated {
            needed: 4 - bytes.len(),
        });
    }
    let code = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    Ok((code, category_for_code(code)))
}

/// Encode a result code as a raw payload. Used by tests and mock nodes;
/// a real node produces these on its side of the wire.
pub fn encode_error_payload(code: i32) -> String {
    STANDARD.encode(code.to_be_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_codes_decode_to_their_category() {
        let expectations = [
            (-1, "failed"),
            (-2, "too early"),
            (-3, "too late"),
            (-4, "malformed"),
            (-5, "bad sequence"),
            (-6, "bad authorization"),
            (-7, "insufficient balance"),
            (-8, "account missing"),
            (-9, "insufficient fee"),
            (-10, "bad authorization"),
            (-11, "internal"),
            (-12, "unsupported"),
            (-13, "other"),
            (-14, "other"),
            (-15, "too early"),
            (-16, "malformed"),
            (-17, "malformed"),
        ];
        for (code, category) in expectations {
            assert_eq!(category_for_code(code), category, "code {code}");
        }
    }

    #[test]
    fn unknown_code_never_raises() {
        assert_eq!(category_for_code(-99), "unrecognized code -99");
        assert_eq!(category_for_code(123), "unrecognized code 123");
    }

    #[test]
    fn payload_round_trip() {
        let payload = encode_error_payload(-7);
        let (code, category) = decode_error(&payload).unwrap();
        assert_eq!(code, -7);
        assert_eq!(category, "insufficient balance");
    }

    #[test]
    fn trailing_payload_bytes_ignored() {
        // Code followed by an opaque fee-charged field
        let mut bytes = (-5i32).to_be_bytes().to_vec();
        bytes.extend_from_slice(&100u64.to_be_bytes());
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        let (code, category) = decode_error(&payload).unwrap();
        assert_eq!((code, category.as_str()), (-5, "bad sequence"));
    }

    #[test]
    fn short_or_garbled_payload_rejected() {
        assert!(decode_error("AAA").is_err()); // invalid base64 length
        let short = base64::engine::general_purpose::STANDARD.encode([0u8, 1]);
        assert!(matches!(
            decode_error(&short),
            Err(CodecError::Truncated { .. })
        ));
    }
}
