//! Value trees
//!
//! A [`Value`] mirrors the shape of its [`TypeDescriptor`]: records are
//! indexed by field position, choices carry their alternative index and list
//! values hold their elements. Values belong to the caller; the engines only
//! read them.
//!
//! [`TypeDescriptor`]: crate::schema::TypeDescriptor

use std::sync::Arc;

use bytes::Bytes;
use v2x_core::{BitString, ObjectIdentifier, V2xError, V2xResult};

use crate::schema::descriptor::{CharStringKind, TypeRef};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    /// Any 32-bit signed or unsigned INTEGER value
    Integer(i64),
    /// Two's complement, big-endian content of an arbitrary-precision INTEGER
    LargeInteger(Bytes),
    /// Index into the ENUMERATED items (not the wire value)
    Enumerated(usize),
    Null,
    OctetString(Bytes),
    BitString(BitString),
    /// OBJECT IDENTIFIER or RELATIVE-OID content
    ObjectIdentifier(ObjectIdentifier),
    /// Character elements at the kind's element width (UTF-8 bytes for UTF8String)
    CharacterString(Bytes),
    Real(f64),
    /// SEQUENCE / SET components by field position; `None` is absent
    Record(Vec<Option<Value>>),
    /// SEQUENCE OF / SET OF elements
    List(Vec<Value>),
    Choice { index: usize, value: Box<Value> },
    Open(OpenValue),
}

/// Content of an open type
#[derive(Debug, Clone)]
pub enum OpenValue {
    /// Unrecognized content: a complete, already encoded TLV
    Raw(Bytes),
    /// A typed value; `ty` is `None` until resolved through the constraint table
    Typed {
        ty: Option<TypeRef>,
        value: Box<Value>,
    },
}

impl PartialEq for OpenValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (OpenValue::Raw(a), OpenValue::Raw(b)) => a == b,
            (
                OpenValue::Typed { ty: ta, value: va },
                OpenValue::Typed { ty: tb, value: vb },
            ) => {
                let same_type = match (ta, tb) {
                    (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                    (None, None) => true,
                    _ => false,
                };
                same_type && va == vb
            }
            _ => false,
        }
    }
}

impl Value {
    /// Short name of the variant, for mismatch reports
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::LargeInteger(_) => "large integer",
            Value::Enumerated(_) => "enumerated",
            Value::Null => "null",
            Value::OctetString(_) => "octet string",
            Value::BitString(_) => "bit string",
            Value::ObjectIdentifier(_) => "object identifier",
            Value::CharacterString(_) => "character string",
            Value::Real(_) => "real",
            Value::Record(_) => "record",
            Value::List(_) => "list",
            Value::Choice { .. } => "choice",
            Value::Open(_) => "open type",
        }
    }

    /// OCTET STRING value
    pub fn octets(bytes: impl Into<Bytes>) -> Self {
        Value::OctetString(bytes.into())
    }

    /// UTF8String value
    pub fn utf8(text: &str) -> Self {
        Value::CharacterString(Bytes::copy_from_slice(text.as_bytes()))
    }

    /// Character string value stored at the element width of `kind`
    ///
    /// # Errors
    /// Fails when a character does not fit the element width (e.g. `é` in a
    /// one-byte kind or an astral character in a BMPString).
    pub fn characters(kind: CharStringKind, text: &str) -> V2xResult<Self> {
        if kind == CharStringKind::Utf8 {
            return Ok(Self::utf8(text));
        }

        let width = kind.element_width();
        let mut bytes = Vec::with_capacity(text.len() * width);
        for (position, ch) in text.chars().enumerate() {
            let code_point = ch as u32;
            let fits = match width {
                1 => code_point <= 0xFF,
                2 => code_point <= 0xFFFF,
                _ => true,
            };
            if !fits {
                return Err(V2xError::InvalidCharacter {
                    position,
                    code_point,
                });
            }
            bytes.extend_from_slice(&code_point.to_be_bytes()[4 - width..]);
        }
        Ok(Value::CharacterString(Bytes::from(bytes)))
    }

    /// SEQUENCE / SET value, one slot per declared component
    pub fn record(fields: Vec<Option<Value>>) -> Self {
        Value::Record(fields)
    }

    /// CHOICE value; `index` counts root then extension alternatives
    pub fn choice(index: usize, value: Value) -> Self {
        Value::Choice {
            index,
            value: Box::new(value),
        }
    }

    /// Open type value carrying its type
    pub fn open(ty: TypeRef, value: Value) -> Self {
        Value::Open(OpenValue::Typed {
            ty: Some(ty),
            value: Box::new(value),
        })
    }

    /// Open type value whose type is resolved from the constraint table
    pub fn open_unresolved(value: Value) -> Self {
        Value::Open(OpenValue::Typed {
            ty: None,
            value: Box::new(value),
        })
    }

    /// Open type value holding already encoded content
    pub fn open_raw(bytes: impl Into<Bytes>) -> Self {
        Value::Open(OpenValue::Raw(bytes.into()))
    }
}

/// Error for a value whose variant does not fit the descriptor
pub(crate) fn mismatch(expected: &'static str, value: &Value) -> V2xError {
    V2xError::TypeMismatch {
        expected,
        found: value.kind_name(),
    }
}
