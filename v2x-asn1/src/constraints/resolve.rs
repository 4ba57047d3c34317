//! Open-type resolution through table constraints
//!
//! The engine keeps an explicit list of the records (and choices) enclosing the
//! current position. A selector picks one of them by counting outward, walks
//! down a field-index path and compares the component it reaches with the
//! corresponding field of each candidate object.

use crate::schema::{
    AtFieldSelector, ConstraintTable, InformationObject, ObjectField, TypeDescriptor, TypeKind,
    TypeRef, Value,
};

/// One enclosing record or choice: its descriptor and its value
#[derive(Debug, Clone, Copy)]
pub struct ValueFrame<'a> {
    pub ty: &'a TypeDescriptor,
    pub value: &'a Value,
}

impl<'a> ValueFrame<'a> {
    pub fn new(ty: &'a TypeDescriptor, value: &'a Value) -> Self {
        Self { ty, value }
    }
}

/// Find the actual type of the open type `any` at the current position
///
/// `frames` lists the enclosing frames, outermost first; the last frame is
/// the record holding the open type. Returns the type of the single object
/// matching every selector. No match and several matches both resolve to
/// `None`: an ambiguous object set never picks a type.
pub fn resolve_open_type<'a>(
    frames: &[ValueFrame<'a>],
    any: &'a TypeDescriptor,
) -> Option<&'a TypeRef> {
    let TypeKind::Open(open) = any.resolved().kind() else {
        return None;
    };
    let table = open.table.as_deref()?;

    let candidates: Vec<&'a InformationObject> = table
        .objects
        .iter()
        .filter(|object| matches_object(frames, table, object))
        .collect();

    match candidates.as_slice() {
        [object] => {
            let resolved = table
                .field(object, table.type_field)
                .and_then(ObjectField::as_type);
            if resolved.is_none() {
                log::debug!(
                    "object of class {} has no type in field {}",
                    table.class.name,
                    table.type_field
                );
            }
            resolved
        }
        [] => {
            log::debug!("no object of class {} matches", table.class.name);
            None
        }
        many => {
            log::debug!(
                "open type resolution ambiguous: {} objects of class {} match",
                many.len(),
                table.class.name
            );
            None
        }
    }
}

fn matches_object(
    frames: &[ValueFrame<'_>],
    table: &ConstraintTable,
    object: &InformationObject,
) -> bool {
    table.selectors.iter().all(|selector| {
        let Some(found) = select(frames, selector) else {
            return false;
        };
        match table.field(object, selector.class_field) {
            Some(ObjectField::Value(expected)) => found == expected,
            _ => false,
        }
    })
}

/// Component referenced by `selector`, or `None` when the walk leaves the tree
fn select<'a>(frames: &[ValueFrame<'a>], selector: &AtFieldSelector) -> Option<&'a Value> {
    let index = frames.len().checked_sub(selector.level + 1)?;
    let frame = frames[index];

    let (mut ty, mut value) = (frame.ty, frame.value);
    for &step in &selector.path {
        (ty, value) = descend(ty, value, step)?;
    }
    Some(value)
}

fn descend<'a>(
    ty: &'a TypeDescriptor,
    value: &'a Value,
    step: usize,
) -> Option<(&'a TypeDescriptor, &'a Value)> {
    match (ty.resolved().kind(), value) {
        (TypeKind::Sequence(record) | TypeKind::Set(record), Value::Record(slots)) => {
            let field = record.fields.get(step)?;
            let component = field.value_or_default(slots.get(step)?.as_ref())?;
            Some((field.ty.as_ref(), component))
        }
        (TypeKind::Choice(choice), Value::Choice { index, value }) if *index == step => {
            Some((choice.alternative(step)?.ty.as_ref(), value.as_ref()))
        }
        _ => None,
    }
}
