//! GSER value walker

use v2x_core::{V2xError, V2xResult};

use crate::chars;
use crate::config::GserOptions;
use crate::schema::value::mismatch;
use crate::schema::{OpenValue, TypeDescriptor, TypeKind, Value};
use crate::sink::ByteSink;
use crate::text::{self, GSER_REAL_TOKENS};

/// Render `value` in GSER (ASN.1 value notation)
pub fn encode_gser(ty: &TypeDescriptor, value: &Value, options: &GserOptions) -> V2xResult<String> {
    let mut encoder = GserEncoder::new(*options);
    if let Err(e) = encoder.encode_value(ty, value) {
        log::debug!("GSER encoding of {} failed: {}", ty.xml_name(), e);
        return Err(e);
    }
    encoder.into_string()
}

/// Streaming GSER writer
#[derive(Debug)]
pub struct GserEncoder {
    sink: ByteSink,
    options: GserOptions,
    depth: usize,
}

impl GserEncoder {
    /// Writer over a fresh unbounded sink
    pub fn new(options: GserOptions) -> Self {
        Self::with_sink(ByteSink::new(), options)
    }

    /// Writer appending to `sink`
    ///
    /// # Arguments
    ///
    /// * `sink` - Output buffer, possibly with a byte budget
    /// * `options` - Indentation and bit string rendering
    pub fn with_sink(sink: ByteSink, options: GserOptions) -> Self {
        Self {
            sink,
            options,
            depth: 0,
        }
    }

    /// Text written so far; fails if any write failed
    pub fn into_string(self) -> V2xResult<String> {
        text::into_string(self.sink)
    }

    /// Append the rendering of one value
    pub fn encode_value(&mut self, ty: &TypeDescriptor, value: &Value) -> V2xResult<()> {
        match ty.kind() {
            TypeKind::Tagged(tagged) => self.encode_value(&tagged.inner, value),
            TypeKind::Boolean => match value {
                Value::Boolean(b) => self.write(if *b { "TRUE" } else { "FALSE" }),
                other => Err(mismatch("boolean", other)),
            },
            TypeKind::Null => match value {
                Value::Null => self.write("NULL"),
                other => Err(mismatch("null", other)),
            },
            TypeKind::Integer(_) => match value {
                Value::Integer(v) => self.write(&v.to_string()),
                Value::LargeInteger(bytes) => self.write(&text::large_integer_text(bytes)?),
                other => Err(mismatch("integer", other)),
            },
            TypeKind::Enumerated(enumerated) => match value {
                Value::Enumerated(index) => {
                    let item = enumerated.item(*index).ok_or(V2xError::InvalidEnumerated {
                        index: *index,
                        count: enumerated.items().len(),
                    })?;
                    self.write(&item.name)
                }
                other => Err(mismatch("enumerated", other)),
            },
            TypeKind::Real => match value {
                Value::Real(v) => self.write(&text::real_text(*v, &GSER_REAL_TOKENS)),
                other => Err(mismatch("real", other)),
            },
            TypeKind::OctetString(_) => match value {
                Value::OctetString(bytes) => self.write_hex(bytes),
                other => Err(mismatch("octet string", other)),
            },
            TypeKind::BitString(_) => match value {
                Value::BitString(bits) => {
                    if self.options.hex_bit_strings && bits.num_bits() % 4 == 0 {
                        let hex = text::hex_upper(&bits.content_bytes());
                        self.write(&format!("'{}'H", &hex[..bits.num_bits() / 4]))
                    } else {
                        self.write(&format!("'{}'B", bits))
                    }
                }
                other => Err(mismatch("bit string", other)),
            },
            TypeKind::ObjectIdentifier | TypeKind::RelativeOid => match value {
                Value::ObjectIdentifier(oid) => {
                    let relative = matches!(ty.kind(), TypeKind::RelativeOid);
                    self.write(&oid.to_dotted(relative)?)
                }
                other => Err(mismatch("object identifier", other)),
            },
            TypeKind::CharacterString(string) => match value {
                Value::CharacterString(bytes) => {
                    let content = chars::to_text(string.kind, bytes)?;
                    self.write(&format!("\"{}\"", content.replace('"', "\"\"")))
                }
                other => Err(mismatch("character string", other)),
            },
            TypeKind::Sequence(record) | TypeKind::Set(record) => {
                let Value::Record(slots) = value else {
                    return Err(mismatch("record", value));
                };
                if slots.len() != record.fields.len() {
                    return Err(V2xError::InvalidData(format!(
                        "record has {} components, value has {}",
                        record.fields.len(),
                        slots.len()
                    )));
                }

                self.open_brace()?;
                let mut count = 0;
                for (field, slot) in record.fields.iter().zip(slots) {
                    let Some(component) = field.present(slot.as_ref()) else {
                        continue;
                    };
                    self.separator(count)?;
                    self.write(&field.name)?;
                    self.write(" ")?;
                    self.encode_value(&field.ty, component)?;
                    count += 1;
                }
                self.close_brace(count)
            }
            TypeKind::SequenceOf(collection) | TypeKind::SetOf(collection) => {
                let Value::List(items) = value else {
                    return Err(mismatch("list", value));
                };
                self.open_brace()?;
                for (count, item) in items.iter().enumerate() {
                    self.separator(count)?;
                    self.encode_value(&collection.element, item)?;
                }
                self.close_brace(items.len())
            }
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
                self.write(&alternative.name)?;
                self.write(": ")?;
                self.encode_value(&alternative.ty, chosen)
            }
            TypeKind::Open(_) => match value {
                Value::Open(OpenValue::Raw(bytes)) => {
                    self.write("OCTET_STRING: ")?;
                    self.write_hex(bytes)
                }
                Value::Open(OpenValue::Typed {
                    ty: Some(actual),
                    value,
                }) => {
                    self.write(&actual.xml_name())?;
                    self.write(": ")?;
                    self.encode_value(actual, value)
                }
                Value::Open(OpenValue::Typed { ty: None, .. }) => Err(V2xError::Unsupported(
                    "open type value has no resolved type".to_string(),
                )),
                other => Err(mismatch("open type", other)),
            },
        }
    }

    fn write(&mut self, text: &str) -> V2xResult<()> {
        self.sink.append_str(text)
    }

    fn write_hex(&mut self, bytes: &[u8]) -> V2xResult<()> {
        self.write(&format!("'{}'H", text::hex_upper(bytes)))
    }

    fn newline(&mut self) -> V2xResult<()> {
        self.write("\n")?;
        for _ in 0..self.depth {
            self.write("  ")?;
        }
        Ok(())
    }

    fn open_brace(&mut self) -> V2xResult<()> {
        self.depth += 1;
        self.write("{")
    }

    /// Written before the component at position `count`
    fn separator(&mut self, count: usize) -> V2xResult<()> {
        if count > 0 {
            self.write(",")?;
        }
        if self.options.indent {
            self.newline()
        } else {
            self.write(" ")
        }
    }

    fn close_brace(&mut self, count: usize) -> V2xResult<()> {
        self.depth -= 1;
        if count > 0 && self.options.indent {
            self.newline()?;
            self.write("}")
        } else {
            self.write(" }")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        Alternative, CharStringKind, CharStringType, ChoiceType, EnumeratedType, FieldDescriptor,
        IntegerType, SizeConstraint,
    };
    use bytes::Bytes;
    use v2x_core::{BitString, ObjectIdentifier};

    fn flat() -> GserOptions {
        GserOptions {
            indent: false,
            ..GserOptions::default()
        }
    }

    fn gser(ty: &TypeDescriptor, value: &Value) -> String {
        encode_gser(ty, value, &flat()).unwrap()
    }

    #[test]
    fn test_real_rendering() {
        let ty = TypeDescriptor::real();
        assert_eq!(gser(&ty, &Value::Real(0.0)), "0");
        assert_eq!(gser(&ty, &Value::Real(f64::INFINITY)), "PLUS-INFINITY");
        assert_eq!(gser(&ty, &Value::Real(f64::NEG_INFINITY)), "MINUS-INFINITY");
        assert_eq!(gser(&ty, &Value::Real(f64::NAN)), "NOT-A-NUMBER");
        let text = gser(&ty, &Value::Real(1.5));
        assert!(text.contains('E') && !text.contains('+'), "{}", text);
    }

    #[test]
    fn test_primitives() {
        assert_eq!(gser(&TypeDescriptor::boolean(), &Value::Boolean(true)), "TRUE");
        assert_eq!(gser(&TypeDescriptor::null(), &Value::Null), "NULL");
        assert_eq!(
            gser(
                &TypeDescriptor::integer(IntegerType::unconstrained()),
                &Value::Integer(-17)
            ),
            "-17"
        );
        assert_eq!(
            gser(
                &TypeDescriptor::octet_string(SizeConstraint::unconstrained()),
                &Value::octets(vec![0x0A, 0x0B])
            ),
            "'0A0B'H"
        );
        let oid = ObjectIdentifier::from_arcs(&[2, 999, 3]).unwrap();
        assert_eq!(
            gser(&TypeDescriptor::object_identifier(), &Value::ObjectIdentifier(oid)),
            "2.999.3"
        );
        let relative = ObjectIdentifier::relative_from_arcs(&[8571, 3]);
        assert_eq!(
            gser(&TypeDescriptor::relative_oid(), &Value::ObjectIdentifier(relative)),
            "8571.3"
        );
    }

    #[cfg(feature = "large-integer")]
    #[test]
    fn test_large_integer() {
        let ty = TypeDescriptor::integer(IntegerType::large());
        let value = Value::LargeInteger(Bytes::from_static(&[0x01, 0, 0, 0, 0, 0, 0, 0, 0]));
        assert_eq!(gser(&ty, &value), "18446744073709551616");
    }

    #[test]
    fn test_bit_strings() {
        let ty = TypeDescriptor::bit_string(SizeConstraint::unconstrained());
        let bits = Value::BitString(BitString::new(vec![0xA5], 8).unwrap());
        assert_eq!(gser(&ty, &bits), "'10100101'B");

        let hex = GserOptions {
            hex_bit_strings: true,
            ..flat()
        };
        assert_eq!(encode_gser(&ty, &bits, &hex).unwrap(), "'A5'H");
        let nibble = Value::BitString(BitString::new(vec![0xA0], 4).unwrap());
        assert_eq!(encode_gser(&ty, &nibble, &hex).unwrap(), "'A'H");
        let odd = Value::BitString(BitString::new(vec![0xA0], 3).unwrap());
        assert_eq!(encode_gser(&ty, &odd, &hex).unwrap(), "'101'B");
    }

    #[test]
    fn test_strings() {
        let utf8 = TypeDescriptor::character_string(CharStringType::new(CharStringKind::Utf8));
        assert_eq!(gser(&utf8, &Value::utf8("say \"hi\"")), "\"say \"\"hi\"\"\"");

        let bmp = TypeDescriptor::character_string(CharStringType::new(CharStringKind::Bmp));
        let value = Value::characters(CharStringKind::Bmp, "€5").unwrap();
        assert_eq!(gser(&bmp, &value), "\"€5\"");

        let bad = Value::CharacterString(Bytes::from_static(&[0xC3, 0x28]));
        assert!(matches!(
            encode_gser(&utf8, &bad, &flat()),
            Err(V2xError::InvalidUtf8 { position: 0 })
        ));
    }

    fn header_type() -> TypeDescriptor {
        TypeDescriptor::sequence(vec![
            FieldDescriptor::mandatory(
                "version",
                TypeDescriptor::integer(IntegerType::range(0, 3)).into_ref(),
            ),
            FieldDescriptor::optional("flag", TypeDescriptor::boolean().into_ref()),
            FieldDescriptor::mandatory(
                "mode",
                TypeDescriptor::enumerated(EnumeratedType::from_names(&["off", "on"])).into_ref(),
            ),
        ])
    }

    #[test]
    fn test_record_flat() {
        let value = Value::record(vec![
            Some(Value::Integer(3)),
            None,
            Some(Value::Enumerated(1)),
        ]);
        assert_eq!(gser(&header_type(), &value), "{ version 3, mode on }");
        assert_eq!(gser(&TypeDescriptor::sequence(Vec::new()), &Value::record(Vec::new())), "{ }");
    }

    #[test]
    fn test_record_indented() {
        let outer = TypeDescriptor::sequence(vec![
            FieldDescriptor::mandatory("header", header_type().into_ref()),
            FieldDescriptor::mandatory(
                "items",
                TypeDescriptor::sequence_of(
                    TypeDescriptor::integer(IntegerType::unconstrained()).into_ref(),
                    SizeConstraint::unconstrained(),
                )
                .into_ref(),
            ),
        ]);
        let value = Value::record(vec![
            Some(Value::record(vec![
                Some(Value::Integer(1)),
                Some(Value::Boolean(false)),
                Some(Value::Enumerated(0)),
            ])),
            Some(Value::List(Vec::new())),
        ]);
        let expected = "{\n  header {\n    version 1,\n    flag FALSE,\n    mode off\n  },\n  items { }\n}";
        assert_eq!(
            encode_gser(&outer, &value, &GserOptions::default()).unwrap(),
            expected
        );
    }

    #[test]
    fn test_set_extension_omitted() {
        let digit = TypeDescriptor::integer(IntegerType::range(0, 9)).into_ref();
        let ty = TypeDescriptor::set(vec![
            FieldDescriptor::mandatory("a", digit.clone()),
            FieldDescriptor::extension("b", digit.clone()),
        ]);
        assert_eq!(
            gser(&ty, &Value::record(vec![Some(Value::Integer(1)), None])),
            "{ a 1 }"
        );
        assert_eq!(
            gser(
                &ty,
                &Value::record(vec![Some(Value::Integer(1)), Some(Value::Integer(4))])
            ),
            "{ a 1, b 4 }"
        );

        let list = TypeDescriptor::set_of(digit, SizeConstraint::range(1, 4));
        assert_eq!(
            gser(&list, &Value::List(vec![Value::Integer(3), Value::Integer(1)])),
            "{ 3, 1 }"
        );
    }

    #[test]
    fn test_choice_and_open() {
        let position = TypeDescriptor::integer(IntegerType::unconstrained())
            .with_name("Position")
            .into_ref();
        let choice = TypeDescriptor::choice(ChoiceType::new(vec![
            Alternative::new("none", TypeDescriptor::null().into_ref()),
            Alternative::new("position", position.clone()),
        ]));
        assert_eq!(gser(&choice, &Value::choice(1, Value::Integer(4))), "position: 4");
        assert!(matches!(
            encode_gser(&choice, &Value::choice(2, Value::Null), &flat()),
            Err(V2xError::InvalidChoiceIndex { index: 2, count: 2 })
        ));

        let any = TypeDescriptor::open(None);
        assert_eq!(
            gser(&any, &Value::open(position, Value::Integer(9))),
            "Position: 9"
        );
        assert_eq!(gser(&any, &Value::open_raw(vec![0x05, 0x00])), "OCTET_STRING: '0500'H");
        assert!(matches!(
            encode_gser(&any, &Value::open_unresolved(Value::Null), &flat()),
            Err(V2xError::Unsupported(_))
        ));
    }

    #[test]
    fn test_budget_exceeded() {
        let ty = TypeDescriptor::octet_string(SizeConstraint::unconstrained());
        let mut encoder = GserEncoder::with_sink(ByteSink::with_limit(4), flat());
        assert!(matches!(
            encoder.encode_value(&ty, &Value::octets(vec![1, 2, 3])),
            Err(V2xError::Allocation(_))
        ));
        assert!(encoder.into_string().is_err());
    }
}
