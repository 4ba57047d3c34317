//! Schema-driven BER encoder
//!
//! [`encode_ber`] walks a value tree alongside its descriptor and writes one
//! TLV per value, following ITU-T X.690.
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use v2x_asn1::ber::encode_ber;
//! use v2x_asn1::schema::{IntegerType, TypeDescriptor, Value};
//!
//! let ty = TypeDescriptor::integer(IntegerType::range(0, 255));
//! let bytes = encode_ber(&ty, &Value::Integer(200))?;
//! assert_eq!(bytes, vec![0x02, 0x02, 0x00, 0xC8]);
//! # Ok::<(), v2x_core::V2xError>(())
//! ```

use crate::ber::types::{BerLength, BerTag, BerTagClass};
use crate::schema::value::mismatch;
use crate::schema::{OpenValue, TagMode, TaggedType, TypeDescriptor, TypeKind, Value};
use crate::sink::ByteSink;
use v2x_core::{V2xError, V2xResult};

/// Encode `value` as BER
///
/// The value is not constraint-checked; run
/// [`check_constraints`](crate::constraints::check_constraints) first when the
/// input is untrusted.
pub fn encode_ber(ty: &TypeDescriptor, value: &Value) -> V2xResult<Vec<u8>> {
    let mut encoder = BerEncoder::new();
    if let Err(e) = encoder.encode_value(ty, value) {
        log::debug!("BER encoding of {} failed: {}", ty.xml_name(), e);
        return Err(e);
    }
    encoder.into_bytes()
}

/// BER encoder over a [`ByteSink`]
///
/// Constructed values are written content-first: the length is reserved
/// before the content and patched once the content is complete, so each value
/// is visited once.
#[derive(Debug, Default)]
pub struct BerEncoder {
    sink: ByteSink,
}

impl BerEncoder {
    /// Create a new BER encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder writing into `sink` (e.g. a budgeted sink)
    pub fn with_sink(sink: ByteSink) -> Self {
        Self { sink }
    }

    /// Get a reference to the encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.sink.as_bytes()
    }

    /// Get the encoded bytes
    ///
    /// Fails if any write failed; partial output is never returned.
    pub fn into_bytes(self) -> V2xResult<Vec<u8>> {
        self.sink.into_bytes()
    }

    /// Write identifier octets
    pub fn put_tag(&mut self, number: u32, class: BerTagClass, constructed: bool) -> V2xResult<()> {
        self.sink
            .append(&BerTag::new(class, constructed, number).encode())
    }

    /// Write length octets in minimal definite form
    pub fn put_length(&mut self, length: usize) -> V2xResult<()> {
        self.sink.append(&BerLength::new(length).encode())
    }

    /// Write the length and minimal two's complement content of `value`
    pub fn encode_fixed_int32(&mut self, value: i32) -> V2xResult<()> {
        let bytes = value.to_be_bytes();
        let content = trim_twos_complement(&bytes);
        self.put_length(content.len())?;
        self.sink.append(content)
    }

    /// Write a complete TLV with primitive content
    pub fn encode_tlv(&mut self, tag: &BerTag, content: &[u8]) -> V2xResult<()> {
        self.sink.append(&tag.encode())?;
        self.put_length(content.len())?;
        self.sink.append(content)
    }

    /// Encode one value of type `ty`
    pub fn encode_value(&mut self, ty: &TypeDescriptor, value: &Value) -> V2xResult<()> {
        self.encode(ty, value, None)
    }

    /// `implicit` replaces the universal tag of `ty` when set
    fn encode(
        &mut self,
        ty: &TypeDescriptor,
        value: &Value,
        implicit: Option<BerTag>,
    ) -> V2xResult<()> {
        let kind = ty.kind();
        match kind {
            TypeKind::Tagged(tagged) => self.encode_tagged(tagged, value, implicit),
            TypeKind::Choice(choice) => {
                let Value::Choice {
                    index,
                    value: chosen,
                } = value
                else {
                    return Err(mismatch("choice", value));
                };
                let alternative =
                    choice
                        .alternative(*index)
                        .ok_or(V2xError::InvalidChoiceIndex {
                            index: *index,
                            count: choice.alternatives().len(),
                        })?;
                self.encode(&alternative.ty, chosen, None)
            }
            TypeKind::Open(_) => self.encode_open(value),
            _ => {
                let Some(universal) = kind.universal_tag() else {
                    return Err(V2xError::Unsupported(format!(
                        "no tag for {}",
                        kind.builtin_name()
                    )));
                };
                let tag = implicit.map_or(universal, |tag| {
                    tag.with_constructed(universal.is_constructed())
                });
                if tag.is_constructed() {
                    self.encode_constructed(&tag, kind, value)
                } else {
                    let content = primitive_content(kind, value)?;
                    self.encode_tlv(&tag, &content)
                }
            }
        }
    }

    fn encode_tagged(
        &mut self,
        tagged: &TaggedType,
        value: &Value,
        implicit: Option<BerTag>,
    ) -> V2xResult<()> {
        let tag = implicit.unwrap_or(tagged.tag);
        // An untagged CHOICE or open type has no tag of its own to replace
        let explicit = tagged.mode == TagMode::Explicit
            || matches!(tagged.inner.kind(), TypeKind::Choice(_) | TypeKind::Open(_));

        if !explicit {
            return self.encode(&tagged.inner, value, Some(tag));
        }

        self.sink.append(&tag.with_constructed(true).encode())?;
        let mark = self.sink.reserve_patch_point()?;
        self.encode(&tagged.inner, value, None)?;
        self.sink.commit_length(mark)
    }

    fn encode_constructed(
        &mut self,
        tag: &BerTag,
        kind: &TypeKind,
        value: &Value,
    ) -> V2xResult<()> {
        self.sink.append(&tag.encode())?;
        let mark = self.sink.reserve_patch_point()?;

        match (kind, value) {
            (TypeKind::Sequence(record) | TypeKind::Set(record), Value::Record(slots)) => {
                if slots.len() != record.fields.len() {
                    return Err(V2xError::InvalidData(format!(
                        "record has {} components, value has {}",
                        record.fields.len(),
                        slots.len()
                    )));
                }
                for (field, slot) in record.fields.iter().zip(slots) {
                    if let Some(component) = field.present(slot.as_ref()) {
                        self.encode(&field.ty, component, None)?;
                    }
                }
            }
            (
                TypeKind::SequenceOf(collection) | TypeKind::SetOf(collection),
                Value::List(items),
            ) => {
                for item in items {
                    self.encode(&collection.element, item, None)?;
                }
            }
            (TypeKind::Sequence(_) | TypeKind::Set(_), other) => {
                return Err(mismatch("record", other));
            }
            (_, other) => return Err(mismatch("list", other)),
        }

        self.sink.commit_length(mark)
    }

    fn encode_open(&mut self, value: &Value) -> V2xResult<()> {
        match value {
            Value::Open(OpenValue::Raw(bytes)) => self.sink.append(bytes),
            Value::Open(OpenValue::Typed {
                ty: Some(ty),
                value,
            }) => self.encode(ty, value, None),
            Value::Open(OpenValue::Typed { ty: None, .. }) => Err(V2xError::Unsupported(
                "open type value has no resolved type".to_string(),
            )),
            other => Err(mismatch("open type", other)),
        }
    }
}

/// Content octets of a primitive value
fn primitive_content(kind: &TypeKind, value: &Value) -> V2xResult<Vec<u8>> {
    let content = match (kind, value) {
        (TypeKind::Boolean, Value::Boolean(b)) => vec![if *b { 0xFF } else { 0x00 }],
        (TypeKind::Integer(_), Value::Integer(v)) => {
            trim_twos_complement(&v.to_be_bytes()).to_vec()
        }
        (TypeKind::Integer(_), Value::LargeInteger(bytes)) => {
            let trimmed = trim_twos_complement(bytes);
            if trimmed.is_empty() {
                vec![0]
            } else {
                trimmed.to_vec()
            }
        }
        (TypeKind::Enumerated(enumerated), Value::Enumerated(index)) => {
            let item = enumerated
                .item(*index)
                .ok_or(V2xError::InvalidEnumerated {
                    index: *index,
                    count: enumerated.items().len(),
                })?;
            trim_twos_complement(&item.value.to_be_bytes()).to_vec()
        }
        (TypeKind::Null, Value::Null) => Vec::new(),
        (TypeKind::OctetString(_), Value::OctetString(bytes)) => bytes.to_vec(),
        (TypeKind::BitString(_), Value::BitString(bits)) => {
            let mut content = Vec::with_capacity(bits.as_bytes().len() + 1);
            content.push(bits.unused_bits());
            content.extend(bits.content_bytes());
            content
        }
        (TypeKind::ObjectIdentifier | TypeKind::RelativeOid, Value::ObjectIdentifier(oid)) => {
            oid.as_bytes().to_vec()
        }
        (TypeKind::CharacterString(_), Value::CharacterString(bytes)) => bytes.to_vec(),
        (TypeKind::Real, Value::Real(v)) => real_content(*v),
        (kind, other) => return Err(mismatch(kind.builtin_name(), other)),
    };
    Ok(content)
}

/// Drop leading octets that only repeat the sign
///
/// An empty input stays empty.
fn trim_twos_complement(bytes: &[u8]) -> &[u8] {
    let mut start = 0;
    while start + 1 < bytes.len() {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    &bytes[start..]
}

/// REAL content octets (X.690 8.5)
///
/// Finite non-zero values use the binary form with base 2, scale 0 and an odd
/// mantissa.
fn real_content(value: f64) -> Vec<u8> {
    if value.is_nan() {
        return vec![0x42];
    }
    if value.is_infinite() {
        return vec![if value > 0.0 { 0x40 } else { 0x41 }];
    }
    if value == 0.0 {
        return if value.is_sign_negative() {
            vec![0x43]
        } else {
            Vec::new()
        };
    }

    let bits = value.to_bits();
    let biased = ((bits >> 52) & 0x7FF) as i64;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mut mantissa, mut exponent) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    };
    let shift = mantissa.trailing_zeros();
    mantissa >>= shift;
    exponent += i64::from(shift);

    let exponent_bytes = exponent.to_be_bytes();
    let exponent_octets = trim_twos_complement(&exponent_bytes);
    let mantissa_bytes = mantissa.to_be_bytes();
    let leading = mantissa_bytes.iter().take_while(|&&b| b == 0).count();

    let mut content = Vec::with_capacity(1 + exponent_octets.len() + 8 - leading);
    let sign = if value < 0.0 { 0x40 } else { 0x00 };
    // Exponent is at most 2 octets for an f64, format 00 or 01
    content.push(0x80 | sign | (exponent_octets.len() as u8 - 1));
    content.extend_from_slice(exponent_octets);
    content.extend_from_slice(&mantissa_bytes[leading..]);
    content
}
