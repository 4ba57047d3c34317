//! Subtype constraint checking
//!
//! [`check_constraints`] walks a value against its descriptor and stops at the
//! first violation. The error message names the location of the offending
//! component (`Header.version: value 5 out of range 0 .. 3`).
//!
//! # Checked constraints
//!
//! | kind | constraint |
//! |------|------------|
//! | INTEGER | value range (32-bit signed/unsigned effective bounds); none for large integers |
//! | ENUMERATED | index within the declared items |
//! | OCTET STRING, BIT STRING | SIZE range unless extensible |
//! | character strings | SIZE range, UTF-8 validity, permitted alphabet |
//! | SEQUENCE, SET | mandatory fields present, present fields checked |
//! | SEQUENCE OF, SET OF | SIZE range, every element checked |
//! | CHOICE | alternative index, chosen alternative checked |
//! | open type | checked against its stored or table-resolved type |

pub mod resolve;

pub use resolve::{ValueFrame, resolve_open_type};

use std::borrow::Cow;

use v2x_core::{V2xError, V2xResult};

use crate::chars;
use crate::schema::value::mismatch;
use crate::schema::{
    CharStringKind, CharStringType, IntegerType, OpenType, OpenValue, RecordType, SizeConstraint,
    TypeDescriptor, TypeKind, TypeRef, Value,
};

/// Check `value` against every constraint of `ty`
///
/// Returns `V2xError::Constraint` for the first violation and
/// `V2xError::TypeMismatch` when the value does not have the descriptor's
/// shape.
pub fn check_constraints(ty: &TypeDescriptor, value: &Value) -> V2xResult<()> {
    let result = Checker::new(ty, false).check(ty, value);
    if let Err(e) = &result {
        log::debug!("constraint check failed: {}", e);
    }
    result
}

/// Validate `value` and attach table-resolved types to its open-type values
///
/// Every open value without a stored type whose table constraint resolves to
/// exactly one object gets that object's type, so the tree can then be
/// encoded. Returns the number of open values bound.
pub fn bind_open_types(ty: &TypeDescriptor, value: &mut Value) -> V2xResult<usize> {
    let bindings = {
        let mut checker = Checker::new(ty, true);
        checker.check(ty, value)?;
        checker.bindings
    };

    let count = bindings.len();
    for (path, resolved) in bindings {
        attach(value, &path, resolved)?;
    }
    Ok(count)
}

fn attach(value: &mut Value, path: &[usize], resolved: TypeRef) -> V2xResult<()> {
    let mut current = value;
    for &step in path {
        current = match current {
            Value::Record(slots) => slots.get_mut(step).and_then(Option::as_mut),
            Value::List(items) => items.get_mut(step),
            Value::Choice { value, .. } => Some(value.as_mut()),
            Value::Open(OpenValue::Typed { value, .. }) => Some(value.as_mut()),
            _ => None,
        }
        .ok_or_else(|| V2xError::InvalidData("open type binding lost its value".to_string()))?;
    }

    if let Value::Open(OpenValue::Typed { ty, .. }) = current {
        if ty.is_none() {
            *ty = Some(resolved);
        }
    }
    Ok(())
}

struct Checker<'a> {
    /// Enclosing records and choices, outermost first
    frames: Vec<ValueFrame<'a>>,
    /// Component names for error locations
    location: Vec<Cow<'a, str>>,
    /// Child indexes from the root value to the current value
    value_path: Vec<usize>,
    record_bindings: bool,
    bindings: Vec<(Vec<usize>, TypeRef)>,
}

impl<'a> Checker<'a> {
    fn new(root: &'a TypeDescriptor, record_bindings: bool) -> Self {
        Self {
            frames: Vec::new(),
            location: root.name().map(Cow::Borrowed).into_iter().collect(),
            value_path: Vec::new(),
            record_bindings,
            bindings: Vec::new(),
        }
    }

    fn violation(&self, message: String) -> V2xError {
        if self.location.is_empty() {
            return V2xError::Constraint(message);
        }

        let mut location = String::new();
        for segment in &self.location {
            if !location.is_empty() && !segment.starts_with('[') {
                location.push('.');
            }
            location.push_str(segment);
        }
        V2xError::Constraint(format!("{}: {}", location, message))
    }

    /// Check a child value under `name` / `index`
    fn check_child(
        &mut self,
        name: Cow<'a, str>,
        index: usize,
        ty: &'a TypeDescriptor,
        value: &'a Value,
    ) -> V2xResult<()> {
        self.location.push(name);
        self.value_path.push(index);
        self.check(ty, value)?;
        self.value_path.pop();
        self.location.pop();
        Ok(())
    }

    fn check(&mut self, ty: &'a TypeDescriptor, value: &'a Value) -> V2xResult<()> {
        match ty.kind() {
            TypeKind::Boolean => match value {
                Value::Boolean(_) => Ok(()),
                other => Err(mismatch("boolean", other)),
            },
            TypeKind::Null => match value {
                Value::Null => Ok(()),
                other => Err(mismatch("null", other)),
            },
            TypeKind::Real => match value {
                Value::Real(_) => Ok(()),
                other => Err(mismatch("real", other)),
            },
            TypeKind::ObjectIdentifier | TypeKind::RelativeOid => match value {
                Value::ObjectIdentifier(_) => Ok(()),
                other => Err(mismatch("object identifier", other)),
            },
            TypeKind::Integer(integer) => self.check_integer(integer, value),
            TypeKind::Enumerated(enumerated) => match value {
                Value::Enumerated(index) if *index < enumerated.items().len() => Ok(()),
                Value::Enumerated(index) => {
                    Err(self.violation(format!("invalid enumerated value {}", index)))
                }
                other => Err(mismatch("enumerated", other)),
            },
            TypeKind::OctetString(size) => match value {
                Value::OctetString(bytes) => self.check_size(size, bytes.len(), "octet string"),
                other => Err(mismatch("octet string", other)),
            },
            TypeKind::BitString(size) => match value {
                Value::BitString(bits) => self.check_size(size, bits.num_bits(), "bit string"),
                other => Err(mismatch("bit string", other)),
            },
            TypeKind::CharacterString(string) => match value {
                Value::CharacterString(bytes) => self.check_string(string, bytes),
                other => Err(mismatch("character string", other)),
            },
            TypeKind::Sequence(record) | TypeKind::Set(record) => {
                self.check_record(ty, record, value)
            }
            TypeKind::SequenceOf(collection) | TypeKind::SetOf(collection) => {
                let Value::List(items) = value else {
                    return Err(mismatch("list", value));
                };
                self.check_size(&collection.size, items.len(), "element count")?;
                for (index, item) in items.iter().enumerate() {
                    self.check_child(
                        Cow::Owned(format!("[{}]", index)),
                        index,
                        &collection.element,
                        item,
                    )?;
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
                let Some(alternative) = choice.alternative(*index) else {
                    return Err(self.violation(format!(
                        "invalid choice index {} ({} alternatives)",
                        index,
                        choice.alternatives().len()
                    )));
                };
                self.frames.push(ValueFrame::new(ty, value));
                self.check_child(
                    Cow::Borrowed(alternative.name.as_str()),
                    *index,
                    &alternative.ty,
                    chosen,
                )?;
                self.frames.pop();
                Ok(())
            }
            TypeKind::Tagged(tagged) => self.check(&tagged.inner, value),
            TypeKind::Open(open) => match value {
                Value::Open(open_value) => self.check_open(ty, open, open_value),
                other => Err(mismatch("open type", other)),
            },
        }
    }

    fn check_integer(&self, integer: &IntegerType, value: &Value) -> V2xResult<()> {
        match value {
            // Bounds of large integers are not representable here
            Value::Integer(_) | Value::LargeInteger(_) if integer.large => Ok(()),
            Value::Integer(v) => {
                let (lower, upper) = integer.effective_bounds();
                if *v < lower || *v > upper {
                    return Err(self.violation(format!(
                        "value {} out of range {} .. {}",
                        v, lower, upper
                    )));
                }
                Ok(())
            }
            other => Err(mismatch("integer", other)),
        }
    }

    fn check_size(&self, size: &SizeConstraint, len: usize, what: &str) -> V2xResult<()> {
        if size.permits(len) {
            return Ok(());
        }
        Err(self.violation(format!(
            "{} {} not in size range {}",
            what,
            len,
            size.describe()
        )))
    }

    fn check_string(&self, string: &CharStringType, bytes: &[u8]) -> V2xResult<()> {
        let code_points = match chars::code_points(string.kind, bytes) {
            Ok(code_points) => code_points,
            Err(V2xError::InvalidUtf8 { position }) => {
                return Err(self.violation(format!("invalid UTF-8 sequence at byte {}", position)));
            }
            Err(e) => return Err(e),
        };

        let what = if string.kind == CharStringKind::Utf8 {
            "UTF8String length"
        } else {
            "string length"
        };
        self.check_size(&string.size, code_points.len(), what)?;

        if let Some((position, code_point)) = code_points
            .iter()
            .enumerate()
            .find(|(_, cp)| !string.permits(**cp))
        {
            return Err(self.violation(format!(
                "character U+{:04X} at position {} not permitted in {}",
                code_point,
                position,
                string.kind.asn1_name()
            )));
        }
        Ok(())
    }

    fn check_record(
        &mut self,
        ty: &'a TypeDescriptor,
        record: &'a RecordType,
        value: &'a Value,
    ) -> V2xResult<()> {
        let Value::Record(slots) = value else {
            return Err(mismatch("record", value));
        };
        if slots.len() != record.fields.len() {
            return Err(V2xError::InvalidData(format!(
                "{} has {} components, value has {}",
                ty.xml_name(),
                record.fields.len(),
                slots.len()
            )));
        }

        self.frames.push(ValueFrame::new(ty, value));
        for (index, (field, slot)) in record.fields.iter().zip(slots).enumerate() {
            match field.present(slot.as_ref()) {
                Some(component) => {
                    self.check_child(
                        Cow::Borrowed(field.name.as_str()),
                        index,
                        &field.ty,
                        component,
                    )?;
                }
                None if slot.is_none() && field.is_mandatory() => {
                    return Err(
                        self.violation(format!("mandatory field '{}' is absent", field.name))
                    );
                }
                None => {}
            }
        }
        self.frames.pop();
        Ok(())
    }

    fn check_open(
        &mut self,
        ty: &'a TypeDescriptor,
        open: &'a OpenType,
        value: &'a OpenValue,
    ) -> V2xResult<()> {
        match value {
            OpenValue::Raw(_) => Ok(()),
            OpenValue::Typed {
                ty: Some(actual),
                value,
            } => self.check_child(Cow::Owned(actual.xml_name().into_owned()), 0, actual, value),
            OpenValue::Typed { ty: None, value } => {
                if open.table.is_none() {
                    return Ok(());
                }
                let Some(resolved) = resolve_open_type(&self.frames, ty) else {
                    return Ok(());
                };
                if self.record_bindings {
                    self.bindings
                        .push((self.value_path.clone(), resolved.clone()));
                }
                self.check_child(
                    Cow::Owned(resolved.xml_name().into_owned()),
                    0,
                    resolved,
                    value,
                )
            }
        }
    }
}
