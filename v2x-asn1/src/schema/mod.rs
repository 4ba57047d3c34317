//! Type description model
//!
//! Descriptors are produced by an external schema compiler (or written by hand
//! for tests) and consumed read-only by every engine in this crate:
//!
//! - [`TypeDescriptor`] / [`TypeKind`]: one node per ASN.1 type with its
//!   constraint metadata
//! - [`Value`]: the value tree that walks in lock-step with a descriptor
//! - [`ConstraintTable`]: information object set constraint on an open type

pub mod descriptor;
pub mod object_set;
pub mod value;

pub use descriptor::{
    Alternative, CharStringKind, CharStringType, ChoiceType, CollectionType, EnumItem,
    EnumeratedType, FieldDescriptor, IntegerType, OpenType, Presence, RecordType, SizeConstraint,
    TagMode, TaggedType, TypeDescriptor, TypeKind, TypeRef,
};
pub use object_set::{
    AtFieldSelector, ClassField, ConstraintTable, InformationObject, ObjectClass, ObjectField,
};
pub use value::{OpenValue, Value};
