//! XER value walker

use v2x_core::{V2xError, V2xResult};

use crate::chars;
use crate::config::XerOptions;
use crate::schema::value::mismatch;
use crate::schema::{OpenValue, TypeDescriptor, TypeKind, Value};
use crate::sink::ByteSink;
use crate::text::{self, XER_REAL_TOKENS};
use crate::xer::tag_state::TagWriter;

/// Render `value` as an XER document rooted at the type's XML name
pub fn encode_xer(ty: &TypeDescriptor, value: &Value, options: &XerOptions) -> V2xResult<String> {
    let mut encoder = XerEncoder::new(*options);
    if let Err(e) = encoder.encode_value(ty, value) {
        log::debug!("XER encoding of {} failed: {}", ty.xml_name(), e);
        return Err(e);
    }
    encoder.into_string()
}

/// Names of the C0 control characters, written as `<name/>` in text content
const CONTROL_NAMES: [&str; 32] = [
    "nul", "soh", "stx", "etx", "eot", "enq", "ack", "bel", "bs", "ht", "lf", "vt", "ff", "cr",
    "so", "si", "dle", "dc1", "dc2", "dc3", "dc4", "nak", "syn", "etb", "can", "em", "sub", "esc",
    "is4", "is3", "is2", "is1",
];

/// Escape text content
///
/// `&`, `<`, `>` become entities. TAB, LF, CR and DEL become character
/// references; the other C0 controls, which XML 1.0 cannot carry even as
/// references, become empty elements such as `<soh/>`.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\t' | '\n' | '\r' | '\u{7F}' => {
                escaped.push_str(&format!("&#x{:X};", u32::from(ch)));
            }
            c if c < ' ' => {
                escaped.push('<');
                escaped.push_str(CONTROL_NAMES[c as usize]);
                escaped.push_str("/>");
            }
            c => escaped.push(c),
        }
    }
    escaped
}

/// Streaming XER writer
#[derive(Debug)]
pub struct XerEncoder {
    writer: TagWriter,
    content_values: bool,
}

impl XerEncoder {
    /// Writer over a fresh unbounded sink
    pub fn new(options: XerOptions) -> Self {
        Self::with_sink(ByteSink::new(), options)
    }

    /// Writer appending to `sink`
    pub fn with_sink(sink: ByteSink, options: XerOptions) -> Self {
        Self {
            writer: TagWriter::new(sink, options.indent, options.empty_tags),
            content_values: options.content_values,
        }
    }

    /// Text written so far; fails if any write failed
    pub fn into_string(self) -> V2xResult<String> {
        self.writer.into_string()
    }

    /// Append one document element for `value`
    pub fn encode_value(&mut self, ty: &TypeDescriptor, value: &Value) -> V2xResult<()> {
        self.element(&ty.xml_name(), ty, value)
    }

    fn element(&mut self, name: &str, ty: &TypeDescriptor, value: &Value) -> V2xResult<()> {
        self.writer.start_tag(name)?;
        self.body(ty, value)?;
        self.writer.end_tag(name)
    }

    /// Text content of the current element; empty text leaves it empty
    fn content(&mut self, text: &str) -> V2xResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.writer.start_content()?;
        self.writer.write_content(text)
    }

    /// `<name/>` markup, or bare text with `content_values`
    fn token(&mut self, name: &str) -> V2xResult<()> {
        if self.content_values {
            self.content(name)
        } else {
            self.content(&format!("<{}/>", name))
        }
    }

    fn body(&mut self, ty: &TypeDescriptor, value: &Value) -> V2xResult<()> {
        match ty.kind() {
            TypeKind::Tagged(tagged) => self.body(&tagged.inner, value),
            TypeKind::Boolean => match value {
                Value::Boolean(b) => self.token(if *b { "true" } else { "false" }),
                other => Err(mismatch("boolean", other)),
            },
            TypeKind::Null => match value {
                Value::Null => Ok(()),
                other => Err(mismatch("null", other)),
            },
            TypeKind::Integer(_) => match value {
                Value::Integer(v) => self.content(&v.to_string()),
                Value::LargeInteger(bytes) => self.content(&text::large_integer_text(bytes)?),
                other => Err(mismatch("integer", other)),
            },
            TypeKind::Enumerated(enumerated) => match value {
                Value::Enumerated(index) => {
                    let item = enumerated.item(*index).ok_or(V2xError::InvalidEnumerated {
                        index: *index,
                        count: enumerated.items().len(),
                    })?;
                    self.token(&item.name)
                }
                other => Err(mismatch("enumerated", other)),
            },
            TypeKind::Real => match value {
                Value::Real(v) => self.content(&text::real_text(*v, &XER_REAL_TOKENS)),
                other => Err(mismatch("real", other)),
            },
            TypeKind::OctetString(_) => match value {
                Value::OctetString(bytes) => self.content(&text::hex_upper(bytes)),
                other => Err(mismatch("octet string", other)),
            },
            TypeKind::BitString(_) => match value {
                Value::BitString(bits) => self.content(&bits.to_string()),
                other => Err(mismatch("bit string", other)),
            },
            TypeKind::ObjectIdentifier | TypeKind::RelativeOid => match value {
                Value::ObjectIdentifier(oid) => {
                    let relative = matches!(ty.kind(), TypeKind::RelativeOid);
                    self.content(&oid.to_dotted(relative)?)
                }
                other => Err(mismatch("object identifier", other)),
            },
            TypeKind::CharacterString(string) => match value {
                Value::CharacterString(bytes) => {
                    let content = chars::to_text(string.kind, bytes)?;
                    self.content(&escape_text(&content))
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
                for (field, slot) in record.fields.iter().zip(slots) {
                    if let Some(component) = field.present(slot.as_ref()) {
                        self.element(&field.name, &field.ty, component)?;
                    }
                }
                Ok(())
            }
            TypeKind::SequenceOf(collection) | TypeKind::SetOf(collection) => {
                let Value::List(items) = value else {
                    return Err(mismatch("list", value));
                };
                let name = collection.element.xml_name();
                for item in items {
                    self.element(&name, &collection.element, item)?;
                }
                Ok(())
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
                self.element(&alternative.name, &alternative.ty, chosen)
            }
            TypeKind::Open(_) => match value {
                Value::Open(OpenValue::Raw(bytes)) => {
                    self.writer.start_tag("OCTET_STRING")?;
                    self.content(&text::hex_upper(bytes))?;
                    self.writer.end_tag("OCTET_STRING")
                }
                Value::Open(OpenValue::Typed {
                    ty: Some(actual),
                    value,
                }) => self.element(&actual.xml_name(), actual, value),
                Value::Open(OpenValue::Typed { ty: None, .. }) => Err(V2xError::Unsupported(
                    "open type value has no resolved type".to_string(),
                )),
                other => Err(mismatch("open type", other)),
            },
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
    use v2x_core::BitString;

    fn flat() -> XerOptions {
        XerOptions {
            indent: false,
            ..XerOptions::default()
        }
    }

    fn xer(ty: &TypeDescriptor, value: &Value) -> String {
        encode_xer(ty, value, &flat()).unwrap()
    }

    fn header_type() -> TypeDescriptor {
        TypeDescriptor::sequence(vec![
            FieldDescriptor::mandatory(
                "version",
                TypeDescriptor::integer(IntegerType::range(0, 3)).into_ref(),
            ),
            FieldDescriptor::optional("flag", TypeDescriptor::boolean().into_ref()),
            FieldDescriptor::optional(
                "mode",
                TypeDescriptor::enumerated(EnumeratedType::from_names(&["off", "on"])).into_ref(),
            ),
        ])
        .with_name("Header")
    }

    #[test]
    fn test_empty_sequence_shorthand() {
        let ty = TypeDescriptor::sequence(vec![FieldDescriptor::optional(
            "flag",
            TypeDescriptor::boolean().into_ref(),
        )])
        .with_name("Empty");
        let value = Value::record(vec![None]);
        assert_eq!(xer(&ty, &value), "<Empty/>");

        let long = XerOptions {
            empty_tags: false,
            ..flat()
        };
        assert_eq!(encode_xer(&ty, &value, &long).unwrap(), "<Empty></Empty>");
    }

    #[test]
    fn test_record_indented() {
        let value = Value::record(vec![
            Some(Value::Integer(3)),
            Some(Value::Boolean(true)),
            Some(Value::Enumerated(1)),
        ]);
        assert_eq!(
            encode_xer(&header_type(), &value, &XerOptions::default()).unwrap(),
            "<Header>\n  <version>3</version>\n  <flag><true/></flag>\n  <mode><on/></mode>\n</Header>"
        );
    }

    #[test]
    fn test_content_values() {
        let value = Value::record(vec![
            Some(Value::Integer(0)),
            Some(Value::Boolean(false)),
            Some(Value::Enumerated(0)),
        ]);
        let options = XerOptions {
            content_values: true,
            ..flat()
        };
        assert_eq!(
            encode_xer(&header_type(), &value, &options).unwrap(),
            "<Header><version>0</version><flag>false</flag><mode>off</mode></Header>"
        );
    }

    #[test]
    fn test_primitives() {
        let octets = TypeDescriptor::octet_string(SizeConstraint::unconstrained());
        assert_eq!(
            xer(&octets, &Value::octets(vec![0xDE, 0xAD])),
            "<OCTET_STRING>DEAD</OCTET_STRING>"
        );
        assert_eq!(xer(&octets, &Value::octets(Vec::new())), "<OCTET_STRING/>");

        let bits = TypeDescriptor::bit_string(SizeConstraint::unconstrained());
        let value = Value::BitString(BitString::new(vec![0xA0], 4).unwrap());
        assert_eq!(xer(&bits, &value), "<BIT_STRING>1010</BIT_STRING>");

        assert_eq!(xer(&TypeDescriptor::null(), &Value::Null), "<NULL/>");

        let real = TypeDescriptor::real().with_name("Speed");
        assert_eq!(xer(&real, &Value::Real(f64::INFINITY)), "<Speed>INF</Speed>");
        assert_eq!(xer(&real, &Value::Real(0.0)), "<Speed>0</Speed>");
    }

    #[test]
    fn test_escaping() {
        let ty = TypeDescriptor::character_string(CharStringType::new(CharStringKind::Utf8))
            .with_name("Note");
        assert_eq!(
            xer(&ty, &Value::utf8("a<b & c>\u{1}")),
            "<Note>a&lt;b &amp; c&gt;<soh/></Note>"
        );
        assert_eq!(escape_text("line\nbreak"), "line&#xA;break");
        assert_eq!(escape_text("a\tb\rc\u{7F}"), "a&#x9;b&#xD;c&#x7F;");
        assert_eq!(escape_text("\u{0}\u{1B}\u{1F}"), "<nul/><esc/><is1/>");
    }

    #[test]
    fn test_list_elements_wrapped() {
        let element = TypeDescriptor::integer(IntegerType::unconstrained())
            .with_name("Psid")
            .into_ref();
        let ty = TypeDescriptor::sequence_of(element, SizeConstraint::unconstrained())
            .with_name("PsidList");
        let value = Value::List(vec![Value::Integer(1), Value::Integer(32)]);
        assert_eq!(
            xer(&ty, &value),
            "<PsidList><Psid>1</Psid><Psid>32</Psid></PsidList>"
        );

        let anonymous = TypeDescriptor::sequence_of(
            TypeDescriptor::boolean().into_ref(),
            SizeConstraint::unconstrained(),
        );
        assert_eq!(
            xer(&anonymous, &Value::List(vec![Value::Boolean(true)])),
            "<SEQUENCE_OF><BOOLEAN><true/></BOOLEAN></SEQUENCE_OF>"
        );
    }

    #[test]
    fn test_set_extension_omitted() {
        let digit = TypeDescriptor::integer(IntegerType::range(0, 9))
            .with_name("Digit")
            .into_ref();
        let ty = TypeDescriptor::set(vec![
            FieldDescriptor::mandatory("a", digit.clone()),
            FieldDescriptor::extension("b", digit.clone()),
        ])
        .with_name("S");
        assert_eq!(
            xer(&ty, &Value::record(vec![Some(Value::Integer(1)), None])),
            "<S><a>1</a></S>"
        );
        assert_eq!(
            xer(
                &ty,
                &Value::record(vec![Some(Value::Integer(1)), Some(Value::Integer(4))])
            ),
            "<S><a>1</a><b>4</b></S>"
        );

        let list = TypeDescriptor::set_of(digit, SizeConstraint::range(1, 4));
        assert_eq!(
            xer(&list, &Value::List(vec![Value::Integer(3)])),
            "<SET_OF><Digit>3</Digit></SET_OF>"
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
        ]))
        .with_name("Location");
        assert_eq!(
            xer(&choice, &Value::choice(1, Value::Integer(4))),
            "<Location><position>4</position></Location>"
        );
        assert_eq!(
            xer(&choice, &Value::choice(0, Value::Null)),
            "<Location><none/></Location>"
        );

        let any = TypeDescriptor::open(None).with_name("Body");
        assert_eq!(
            xer(&any, &Value::open(position, Value::Integer(9))),
            "<Body><Position>9</Position></Body>"
        );
        assert_eq!(
            xer(&any, &Value::open_raw(vec![0x05, 0x00])),
            "<Body><OCTET_STRING>0500</OCTET_STRING></Body>"
        );
        assert!(matches!(
            encode_xer(&any, &Value::open_unresolved(Value::Null), &flat()),
            Err(V2xError::Unsupported(_))
        ));
    }

    #[test]
    fn test_invalid_enumerated() {
        let ty = TypeDescriptor::enumerated(EnumeratedType::from_names(&["off"]));
        assert_eq!(
            encode_xer(&ty, &Value::Enumerated(4), &flat()),
            Err(V2xError::InvalidEnumerated { index: 4, count: 1 })
        );
    }
}
