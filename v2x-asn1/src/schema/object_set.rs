//! Information object classes and table constraints
//!
//! A [`ConstraintTable`] ties an open-type component to an object set: e.g.
//! for
//!
//! ```text
//! Extension ::= SEQUENCE {
//!     id     EXT-TYPE.&id({ExtensionSet}),
//!     value  EXT-TYPE.&Type({ExtensionSet}{@id})
//! }
//! ```
//!
//! the table of `value` lists the objects of `ExtensionSet`, names `&Type` as
//! the class field giving the open type, and carries one selector saying that
//! the sibling `id` must equal a candidate's `&id`.

use std::sync::Arc;

use crate::schema::descriptor::TypeRef;
use crate::schema::value::Value;

/// Value stored in one field of an information object
#[derive(Debug, Clone)]
pub enum ObjectField {
    /// Type field (`&Type`)
    Type(TypeRef),
    /// Fixed-type value field (`&id`)
    Value(Value),
}

/// Types compare by identity, values structurally
impl PartialEq for ObjectField {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ObjectField::Type(a), ObjectField::Type(b)) => Arc::ptr_eq(a, b),
            (ObjectField::Value(a), ObjectField::Value(b)) => a == b,
            _ => false,
        }
    }
}

impl ObjectField {
    /// The type of a type field
    pub fn as_type(&self) -> Option<&TypeRef> {
        match self {
            ObjectField::Type(ty) => Some(ty),
            ObjectField::Value(_) => None,
        }
    }

    /// The value of a value field
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            ObjectField::Value(value) => Some(value),
            ObjectField::Type(_) => None,
        }
    }
}

/// One field of a class definition
#[derive(Debug, Clone)]
pub struct ClassField {
    pub name: String,
    /// Used when an object leaves the field out
    pub default: Option<ObjectField>,
}

impl ClassField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    pub fn with_default(name: impl Into<String>, default: ObjectField) -> Self {
        Self {
            name: name.into(),
            default: Some(default),
        }
    }
}

/// `CLASS { ... }`
#[derive(Debug, Clone)]
pub struct ObjectClass {
    pub name: String,
    pub fields: Vec<ClassField>,
}

impl ObjectClass {
    pub fn new(name: impl Into<String>, fields: Vec<ClassField>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

/// One member of an object set: a value or type per class field
#[derive(Debug, Clone, Default)]
pub struct InformationObject {
    pub fields: Vec<Option<ObjectField>>,
}

impl InformationObject {
    pub fn new(fields: Vec<Option<ObjectField>>) -> Self {
        Self { fields }
    }
}

/// `{@.field}` / `{@..outer.field}` component relation
///
/// `level` counts enclosing records outward from the record holding the open
/// type (0 = that record). `path` is the chain of field indexes from the
/// selected record down to the referenced component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtFieldSelector {
    pub level: usize,
    pub path: Vec<usize>,
    /// Class field the referenced component is compared with
    pub class_field: usize,
}

impl AtFieldSelector {
    pub fn new(level: usize, path: Vec<usize>, class_field: usize) -> Self {
        Self {
            level,
            path,
            class_field,
        }
    }
}

/// Table constraint of an open type
#[derive(Debug, Clone)]
pub struct ConstraintTable {
    pub class: Arc<ObjectClass>,
    pub objects: Vec<InformationObject>,
    /// Class field that holds the open type's actual type
    pub type_field: usize,
    pub selectors: Vec<AtFieldSelector>,
}

impl ConstraintTable {
    /// Table over `objects` of `class`, selecting `type_field` through `selectors`
    pub fn new(
        class: Arc<ObjectClass>,
        objects: Vec<InformationObject>,
        type_field: usize,
        selectors: Vec<AtFieldSelector>,
    ) -> Self {
        Self {
            class,
            objects,
            type_field,
            selectors,
        }
    }

    /// Field `index` of `object`, or the class default when the object omits it
    pub fn field<'a>(
        &'a self,
        object: &'a InformationObject,
        index: usize,
    ) -> Option<&'a ObjectField> {
        object
            .fields
            .get(index)
            .and_then(Option::as_ref)
            .or_else(|| self.class.fields.get(index)?.default.as_ref())
    }
}
