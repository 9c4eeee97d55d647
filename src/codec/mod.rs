//! Wire value codec
//!
//! Converts between native invocation values and the ledger's tagged binary
//! wire format. Encoding is checked against a declared [`ValueType`] and is
//! lossless: `decode(encode(x, t)) == x` for every supported value.
//!
//! Byte layout: one tag byte followed by a big-endian payload. Strings and
//! composites carry a `u32` big-endian length/count prefix. An unknown tag
//! fails with [`CodecError::UnsupportedType`] naming the tag; a `Void` wire
//! value decodes to [`Decoded::Absent`], which is an outcome, not an error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Address;

pub(crate) mod reader;

use reader::Reader;

/// Wire tag bytes. Stable; new variants append, never renumber.
pub(crate) mod tag {
    pub const VOID: u8 = 0x00;
    pub const BOOL: u8 = 0x01;
    pub const I32: u8 = 0x02;
    pub const I64: u8 = 0x03;
    pub const SYMBOL: u8 = 0x04;
    pub const STR: u8 = 0x05;
    pub const ADDRESS: u8 = 0x06;
    pub const VEC: u8 = 0x07;
    pub const STRUCT: u8 = 0x08;
}

/// Errors from encoding or decoding wire values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Unrecognized wire tag byte
    #[error("unsupported wire type tag 0x{tag:02x}")]
    UnsupportedType { tag: u8 },

    /// Native value does not match the declared type
    #[error("type mismatch: declared {declared}, got {got}")]
    TypeMismatch {
        declared: &'static str,
        got: &'static str,
    },

    /// Integer does not fit the declared width
    #[error("value {value} out of range for {declared}")]
    OutOfRange { value: i64, declared: &'static str },

    /// Struct shape differs from its declared field list
    #[error("struct field mismatch: {0}")]
    FieldMismatch(String),

    /// Wire bytes ended before the value was complete
    #[error("truncated wire value (needed {needed} more bytes)")]
    Truncated { needed: usize },

    /// Structurally invalid wire bytes
    #[error("malformed wire value: {0}")]
    Malformed(String),

    /// Base64 transport wrapper could not be decoded
    #[error("invalid base64 payload: {0}")]
    Base64(String),
}

/// Declared parameter/return type, checked at encode time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    Bool,
    I32,
    I64,
    Symbol,
    Str,
    Address,
    List(Box<ValueType>),
    Struct(Vec<(String, ValueType)>),
}

impl ValueType {
    fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Symbol => "symbol",
            Self::Str => "string",
            Self::Address => "address",
            Self::List(_) => "list",
            Self::Struct(_) => "struct",
        }
    }
}

/// A native invocation value, as callers see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NativeValue {
    Bool(bool),
    I32(i32),
    I64(i64),
    Symbol(String),
    Str(String),
    Address(Address),
    List(Vec<NativeValue>),
    Struct(Vec<(String, NativeValue)>),
}

impl NativeValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::Symbol(_) => "symbol",
            Self::Str(_) => "string",
            Self::Address(_) => "address",
            Self::List(_) => "list",
            Self::Struct(_) => "struct",
        }
    }
}

/// The in-memory wire representation of a value.
///
/// `Void` is a real wire state (a void function's "return value"), which is
/// why decoding distinguishes [`Decoded::Absent`] from an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireValue {
    Void,
    Bool(bool),
    I32(i32),
    I64(i64),
    Symbol(String),
    Str(String),
    Address(Address),
    Vec(Vec<WireValue>),
    Struct(Vec<(String, WireValue)>),
}

/// Outcome of decoding a wire value: a value, or a legitimate "no value".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Value(NativeValue),
    Absent,
}

impl Decoded {
    pub fn value(&self) -> Option<&NativeValue> {
        match self {
            Self::Value(v) => Some(v),
            Self::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// Encode a native value against its declared type.
///
/// Integer widths coerce only when lossless: an `I64` literal declared as
/// `I32` range-checks, an `I32` literal declared `I64` widens.
pub fn encode(value: &NativeValue, declared: &ValueType) -> Result<WireValue, CodecError> {
    match (declared, value) {
        (ValueType::Bool, NativeValue::Bool(b)) => Ok(WireValue::Bool(*b)),
        (ValueType::I32, NativeValue::I32(n)) => Ok(WireValue::I32(*n)),
        (ValueType::I32, NativeValue::I64(n)) => {
            i32::try_from(*n)
                .map(WireValue::I32)
                .map_err(|_| CodecError::OutOfRange {
                    value: *n,
                    declared: "i32",
                })
        }
        (ValueType::I64, NativeValue::I64(n)) => Ok(WireValue::I64(*n)),
        (ValueType::I64, NativeValue::I32(n)) => Ok(WireValue::I64(i64::from(*n))),
        (ValueType::Symbol, NativeValue::Symbol(s)) => {
            // Reuse the Symbol validation rules without constructing one
            crate::types::Symbol::new(s.clone())
                .map_err(|_| CodecError::Malformed(format!("invalid symbol {s:?}")))?;
            Ok(WireValue::Symbol(s.clone()))
        }
        (ValueType::Str, NativeValue::Str(s)) => Ok(WireValue::Str(s.clone())),
        (ValueType::Address, NativeValue::Address(a)) => Ok(WireValue::Address(a.clone())),
        (ValueType::List(elem_ty), NativeValue::List(items)) => {
            let encoded = items
                .iter()
                .map(|item| encode(item, elem_ty))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(WireValue::Vec(encoded))
        }
        (ValueType::Struct(fields), NativeValue::Struct(entries)) => {
            if fields.len() != entries.len() {
                return Err(CodecError::FieldMismatch(format!(
                    "declared {} fields, got {}",
                    fields.len(),
                    entries.len()
                )));
            }
            let mut encoded = Vec::with_capacity(fields.len());
            for ((decl_name, decl_ty), (name, item)) in fields.iter().zip(entries) {
                if decl_name != name {
                    return Err(CodecError::FieldMismatch(format!(
                        "declared field {decl_name:?}, got {name:?}"
                    )));
                }
                encoded.push((name.clone(), encode(item, decl_ty)?));
            }
            Ok(WireValue::Struct(encoded))
        }
        (declared, value) => Err(CodecError::TypeMismatch {
            declared: declared.name(),
            got: value.kind(),
        }),
    }
}

/// Decode an in-memory wire value to its native form.
///
/// Infallible: unknown tags can only exist at the byte layer (see
/// [`WireValue::from_bytes`]).
pub fn decode(wire: &WireValue) -> Decoded {
    match wire {
        WireValue::Void => Decoded::Absent,
        WireValue::Bool(b) => Decoded::Value(NativeValue::Bool(*b)),
        WireValue::I32(n) => Decoded::Value(NativeValue::I32(*n)),
        WireValue::I64(n) => Decoded::Value(NativeValue::I64(*n)),
        WireValue::Symbol(s) => Decoded::Value(NativeValue::Symbol(s.clone())),
        WireValue::Str(s) => Decoded::Value(NativeValue::Str(s.clone())),
        WireValue::Address(a) => Decoded::Value(NativeValue::Address(a.clone())),
        WireValue::Vec(items) => {
            let native = items
                .iter()
                .map(|item| match decode(item) {
                    Decoded::Value(v) => v,
                    // Void inside a composite maps to the empty struct
                    Decoded::Absent => NativeValue::Struct(Vec::new()),
                })
                .collect();
            Decoded::Value(NativeValue::List(native))
        }
        WireValue::Struct(entries) => {
            let native = entries
                .iter()
                .map(|(name, item)| {
                    let value = match decode(item) {
                        Decoded::Value(v) => v,
                        Decoded::Absent => NativeValue::Struct(Vec::new()),
                    };
                    (name.clone(), value)
                })
                .collect();
            Decoded::Value(NativeValue::Struct(native))
        }
    }
}

impl WireValue {
    /// Serialize to the tagged binary wire format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write(&mut out);
        out
    }

    fn write(&self, out: &mut Vec<u8>) {
        match self {
            Self::Void => out.push(tag::VOID),
            Self::Bool(b) => {
                out.push(tag::BOOL);
                out.push(u8::from(*b));
            }
            Self::I32(n) => {
                out.push(tag::I32);
                out.extend_from_slice(&n.to_be_bytes());
            }
            Self::I64(n) => {
                out.push(tag::I64);
                out.extend_from_slice(&n.to_be_bytes());
            }
            Self::Symbol(s) => {
                out.push(tag::SYMBOL);
                write_bytes(out, s.as_bytes());
            }
            Self::Str(s) => {
                out.push(tag::STR);
                write_bytes(out, s.as_bytes());
            }
            Self::Address(a) => {
                out.push(tag::ADDRESS);
                write_bytes(out, a.as_str().as_bytes());
            }
            Self::Vec(items) => {
                out.push(tag::VEC);
                out.extend_from_slice(&(items.len() as u32).to_be_bytes());
                for item in items {
                    item.write(out);
                }
            }
            Self::Struct(entries) => {
                out.push(tag::STRUCT);
                out.extend_from_slice(&(entries.len() as u32).to_be_bytes());
                for (name, item) in entries {
                    write_bytes(out, name.as_bytes());
                    item.write(out);
                }
            }
        }
    }

    /// Parse the tagged binary wire format.
    ///
    /// Trailing bytes after a complete value are rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = Reader::new(bytes);
        let value = Self::read(&mut reader)?;
        if !reader.is_empty() {
            return Err(CodecError::Malformed(format!(
                "{} trailing bytes after value",
                reader.remaining()
            )));
        }
        Ok(value)
    }

    pub(crate) fn read(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let tag_byte = reader.take_u8()?;
        match tag_byte {
            tag::VOID => Ok(Self::Void),
            tag::BOOL => match reader.take_u8()? {
                0 => Ok(Self::Bool(false)),
                1 => Ok(Self::Bool(true)),
                other => Err(CodecError::Malformed(format!("bool byte {other}"))),
            },
            tag::I32 => Ok(Self::I32(reader.take_i32()?)),
            tag::I64 => Ok(Self::I64(reader.take_i64()?)),
            tag::SYMBOL => Ok(Self::Symbol(reader.take_string()?)),
            tag::STR => Ok(Self::Str(reader.take_string()?)),
            tag::ADDRESS => {
                let raw = reader.take_string()?;
                let address = Address::new(raw)
                    .map_err(|e| CodecError::Malformed(e.to_string()))?;
                Ok(Self::Address(address))
            }
            tag::VEC => {
                let count = reader.take_u32()? as usize;
                reader.check_capacity(count)?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(Self::read(reader)?);
                }
                Ok(Self::Vec(items))
            }
            tag::STRUCT => {
                let count = reader.take_u32()? as usize;
                reader.check_capacity(count)?;
                let mut entries = Vec::with_capacity(count);
                for _ in 0..count {
                    let name = reader.take_string()?;
                    entries.push((name, Self::read(reader)?));
                }
                Ok(Self::Struct(entries))
            }
            other => Err(CodecError::UnsupportedType { tag: other }),
        }
    }

    /// Base64 wrapper used wherever a wire value travels inside JSON.
    pub fn to_base64(&self) -> String {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine as _;
        STANDARD.encode(self.to_bytes())
    }

    pub fn from_base64(encoded: &str) -> Result<Self, CodecError> {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine as _;
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| CodecError::Base64(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

/// Decode a base64-wrapped wire value straight to a native outcome.
pub fn decode_base64(encoded: &str) -> Result<Decoded, CodecError> {
    Ok(decode(&WireValue::from_base64(encoded)?))
}

fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    #[test]
    fn scalar_round_trips() {
        let cases: Vec<(NativeValue, ValueType)> = vec![
            (NativeValue::Bool(true), ValueType::Bool),
            (NativeValue::I32(-42), ValueType::I32),
            (NativeValue::I64(1 << 40), ValueType::I64),
            (NativeValue::Symbol("get_rank".into()), ValueType::Symbol),
            (NativeValue::Str("héllo wörld".into()), ValueType::Str),
            (
                NativeValue::Address(addr("GROUNDTRIP1")),
                ValueType::Address,
            ),
        ];
        for (value, ty) in cases {
            let wire = encode(&value, &ty).unwrap();
            let bytes = wire.to_bytes();
            let parsed = WireValue::from_bytes(&bytes).unwrap();
            assert_eq!(decode(&parsed), Decoded::Value(value));
        }
    }

    #[test]
    fn composite_round_trip() {
        let value = NativeValue::Struct(vec![
            ("owner".into(), NativeValue::Address(addr("GOWNER1"))),
            (
                "scores".into(),
                NativeValue::List(vec![NativeValue::I32(7), NativeValue::I32(11)]),
            ),
        ]);
        let ty = ValueType::Struct(vec![
            ("owner".into(), ValueType::Address),
            ("scores".into(), ValueType::List(Box::new(ValueType::I32))),
        ]);
        let wire = encode(&value, &ty).unwrap();
        let parsed = WireValue::from_bytes(&wire.to_bytes()).unwrap();
        assert_eq!(decode(&parsed), Decoded::Value(value));
    }

    #[test]
    fn void_decodes_to_absent_not_error() {
        let parsed = WireValue::from_bytes(&[super::tag::VOID]).unwrap();
        assert_eq!(decode(&parsed), Decoded::Absent);
    }

    #[test]
    fn unknown_tag_names_the_tag() {
        let err = WireValue::from_bytes(&[0xEE]).unwrap_err();
        assert_eq!(err, CodecError::UnsupportedType { tag: 0xEE });
        assert!(err.to_string().contains("0xee"));
    }

    #[test]
    fn truncated_input_rejected() {
        // I64 tag with only four payload bytes
        let err = WireValue::from_bytes(&[super::tag::I64, 0, 0, 0, 1]).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { .. }));
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = WireValue::Bool(true).to_bytes();
        bytes.push(0x00);
        assert!(matches!(
            WireValue::from_bytes(&bytes),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn i64_narrows_into_declared_i32_when_in_range() {
        let wire = encode(&NativeValue::I64(1000), &ValueType::I32).unwrap();
        assert_eq!(wire, WireValue::I32(1000));

        let err = encode(&NativeValue::I64(i64::MAX), &ValueType::I32).unwrap_err();
        assert!(matches!(err, CodecError::OutOfRange { .. }));
    }

    #[test]
    fn type_mismatch_reports_both_sides() {
        let err = encode(&NativeValue::Bool(true), &ValueType::Str).unwrap_err();
        assert_eq!(
            err,
            CodecError::TypeMismatch {
                declared: "string",
                got: "bool"
            }
        );
    }

    #[test]
    fn struct_field_order_is_enforced() {
        let value = NativeValue::Struct(vec![("b".into(), NativeValue::I32(1))]);
        let ty = ValueType::Struct(vec![("a".into(), ValueType::I32)]);
        assert!(matches!(
            encode(&value, &ty),
            Err(CodecError::FieldMismatch(_))
        ));
    }

    #[test]
    fn base64_round_trip() {
        let wire = WireValue::Str("payload".into());
        let b64 = wire.to_base64();
        assert_eq!(WireValue::from_base64(&b64).unwrap(), wire);
        assert_eq!(
            decode_base64(&b64).unwrap(),
            Decoded::Value(NativeValue::Str("payload".into()))
        );
    }

    // Strategy producing (value, declared type) pairs that agree, including
    // nested composites, for the round-trip property.
    fn value_and_type() -> impl Strategy<Value = (NativeValue, ValueType)> {
        let leaf = prop_oneof![
            any::<bool>().prop_map(|b| (NativeValue::Bool(b), ValueType::Bool)),
            any::<i32>().prop_map(|n| (NativeValue::I32(n), ValueType::I32)),
            any::<i64>().prop_map(|n| (NativeValue::I64(n), ValueType::I64)),
            "[A-Za-z0-9_]{1,16}"
                .prop_map(|s| (NativeValue::Symbol(s), ValueType::Symbol)),
            ".{0,24}".prop_map(|s| (NativeValue::Str(s), ValueType::Str)),
            "[A-Z0-9]{5,20}".prop_map(|suffix| {
                let a = Address::new(format!("G{suffix}")).unwrap();
                (NativeValue::Address(a), ValueType::Address)
            }),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                // Homogeneous list: element type comes from one sample
                (inner.clone(), proptest::collection::vec(any::<i32>(), 0..4)).prop_map(
                    |((elem, elem_ty), extra)| {
                        let mut items = vec![elem];
                        items.extend(extra.into_iter().map(NativeValue::I32));
                        // Force all elements to the sampled type by keeping
                        // only the first when types disagree
                        if elem_ty != ValueType::I32 {
                            items.truncate(1);
                        }
                        (NativeValue::List(items), ValueType::List(Box::new(elem_ty)))
                    }
                ),
                proptest::collection::vec(("[a-z]{1,8}", inner), 0..4).prop_map(|fields| {
                    let mut entries = Vec::new();
                    let mut types = Vec::new();
                    for (i, (name, (value, ty))) in fields.into_iter().enumerate() {
                        // Disambiguate duplicate field names
                        let name = format!("{name}{i}");
                        entries.push((name.clone(), value));
                        types.push((name, ty));
                    }
                    (NativeValue::Struct(entries), ValueType::Struct(types))
                }),
            ]
        })
    }

    proptest! {
        #[test]
        fn round_trip_property((value, ty) in value_and_type()) {
            let wire = encode(&value, &ty).unwrap();
            let parsed = WireValue::from_bytes(&wire.to_bytes()).unwrap();
            prop_assert_eq!(decode(&parsed), Decoded::Value(value));
        }
    }
}
