//! Type descriptors
//!
//! A descriptor is the read-only schema node for one ASN.1 type. Descriptors
//! are produced once (normally by generated code) and shared through
//! [`TypeRef`] by every value and every encoder that walks them.

use std::borrow::Cow;
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::ber::BerTag;
use crate::ber::types::universal;
use crate::schema::object_set::ConstraintTable;
use crate::schema::value::Value;

/// Shared handle to an immutable descriptor
pub type TypeRef = Arc<TypeDescriptor>;

/// One node of the schema
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    name: Option<String>,
    kind: TypeKind,
}

/// Type kind with its constraint metadata
#[derive(Debug, Clone)]
pub enum TypeKind {
    Boolean,
    Integer(IntegerType),
    Enumerated(EnumeratedType),
    Null,
    OctetString(SizeConstraint),
    BitString(SizeConstraint),
    ObjectIdentifier,
    RelativeOid,
    CharacterString(CharStringType),
    Real,
    Sequence(RecordType),
    Set(RecordType),
    SequenceOf(CollectionType),
    SetOf(CollectionType),
    Choice(ChoiceType),
    Tagged(TaggedType),
    Open(OpenType),
}

impl TypeKind {
    /// ASN.1 notation name of the kind
    pub fn builtin_name(&self) -> &'static str {
        match self {
            TypeKind::Boolean => "BOOLEAN",
            TypeKind::Integer(_) => "INTEGER",
            TypeKind::Enumerated(_) => "ENUMERATED",
            TypeKind::Null => "NULL",
            TypeKind::OctetString(_) => "OCTET STRING",
            TypeKind::BitString(_) => "BIT STRING",
            TypeKind::ObjectIdentifier => "OBJECT IDENTIFIER",
            TypeKind::RelativeOid => "RELATIVE-OID",
            TypeKind::CharacterString(s) => s.kind.asn1_name(),
            TypeKind::Real => "REAL",
            TypeKind::Sequence(_) => "SEQUENCE",
            TypeKind::Set(_) => "SET",
            TypeKind::SequenceOf(_) => "SEQUENCE OF",
            TypeKind::SetOf(_) => "SET OF",
            TypeKind::Choice(_) => "CHOICE",
            TypeKind::Tagged(_) => "TAGGED",
            TypeKind::Open(_) => "OPEN TYPE",
        }
    }

    /// Universal tag of the kind; `None` for CHOICE, open and tagged types
    pub fn universal_tag(&self) -> Option<BerTag> {
        let (number, constructed) = match self {
            TypeKind::Boolean => (universal::BOOLEAN, false),
            TypeKind::Integer(_) => (universal::INTEGER, false),
            TypeKind::Enumerated(_) => (universal::ENUMERATED, false),
            TypeKind::Null => (universal::NULL, false),
            TypeKind::OctetString(_) => (universal::OCTET_STRING, false),
            TypeKind::BitString(_) => (universal::BIT_STRING, false),
            TypeKind::ObjectIdentifier => (universal::OBJECT_IDENTIFIER, false),
            TypeKind::RelativeOid => (universal::RELATIVE_OID, false),
            TypeKind::CharacterString(s) => (s.kind.universal_tag_number(), false),
            TypeKind::Real => (universal::REAL, false),
            TypeKind::Sequence(_) | TypeKind::SequenceOf(_) => (universal::SEQUENCE, true),
            TypeKind::Set(_) | TypeKind::SetOf(_) => (universal::SET, true),
            TypeKind::Choice(_) | TypeKind::Tagged(_) | TypeKind::Open(_) => return None,
        };
        Some(BerTag::universal(constructed, number))
    }
}

impl TypeDescriptor {
    /// An anonymous descriptor
    pub fn new(kind: TypeKind) -> Self {
        Self { name: None, kind }
    }

    /// A descriptor for a named type assignment (`Name ::= ...`)
    pub fn named(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: Some(name.into()),
            kind,
        }
    }

    /// Give this descriptor a type name
    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    /// Wrap into a shared reference
    pub fn into_ref(self) -> TypeRef {
        Arc::new(self)
    }

    /// Type reference name, if this is a named assignment
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Kind and constraint metadata of this node
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// The descriptor behind any chain of tags
    pub fn resolved(&self) -> &TypeDescriptor {
        let mut ty = self;
        while let TypeKind::Tagged(tagged) = &ty.kind {
            ty = &tagged.inner;
        }
        ty
    }

    /// Element name for XML and open-type labels
    ///
    /// The first type name found along the tag chain, otherwise the builtin
    /// name of the underlying kind with spaces replaced by `_`
    /// (`OCTET_STRING`, `SEQUENCE_OF`).
    pub fn xml_name(&self) -> Cow<'_, str> {
        let mut ty = self;
        loop {
            if let Some(name) = ty.name() {
                return Cow::Borrowed(name);
            }
            match &ty.kind {
                TypeKind::Tagged(tagged) => ty = &tagged.inner,
                kind => return Cow::Owned(kind.builtin_name().replace(' ', "_")),
            }
        }
    }

    /// `BOOLEAN`
    pub fn boolean() -> Self {
        Self::new(TypeKind::Boolean)
    }

    /// `NULL`
    pub fn null() -> Self {
        Self::new(TypeKind::Null)
    }

    /// `REAL`
    pub fn real() -> Self {
        Self::new(TypeKind::Real)
    }

    /// `OBJECT IDENTIFIER`
    pub fn object_identifier() -> Self {
        Self::new(TypeKind::ObjectIdentifier)
    }

    /// `RELATIVE-OID`
    pub fn relative_oid() -> Self {
        Self::new(TypeKind::RelativeOid)
    }

    /// `INTEGER` with the given range constraint
    pub fn integer(integer: IntegerType) -> Self {
        Self::new(TypeKind::Integer(integer))
    }

    /// `ENUMERATED { ... }`
    pub fn enumerated(enumerated: EnumeratedType) -> Self {
        Self::new(TypeKind::Enumerated(enumerated))
    }

    /// `OCTET STRING (SIZE (...))`
    pub fn octet_string(size: SizeConstraint) -> Self {
        Self::new(TypeKind::OctetString(size))
    }

    /// `BIT STRING (SIZE (...))`, size counted in bits
    pub fn bit_string(size: SizeConstraint) -> Self {
        Self::new(TypeKind::BitString(size))
    }

    /// One of the restricted character string types
    pub fn character_string(string: CharStringType) -> Self {
        Self::new(TypeKind::CharacterString(string))
    }

    /// `SEQUENCE { ... }`
    ///
    /// # Arguments
    ///
    /// * `fields` - Components in declaration order, extension additions last
    pub fn sequence(fields: Vec<FieldDescriptor>) -> Self {
        Self::new(TypeKind::Sequence(RecordType::new(fields)))
    }

    /// `SET { ... }`
    ///
    /// Components are encoded in declaration order.
    pub fn set(fields: Vec<FieldDescriptor>) -> Self {
        Self::new(TypeKind::Set(RecordType::new(fields)))
    }

    /// `SEQUENCE (SIZE (...)) OF element`
    pub fn sequence_of(element: TypeRef, size: SizeConstraint) -> Self {
        Self::new(TypeKind::SequenceOf(CollectionType { element, size }))
    }

    /// `SET (SIZE (...)) OF element`
    ///
    /// Elements are encoded in value order.
    pub fn set_of(element: TypeRef, size: SizeConstraint) -> Self {
        Self::new(TypeKind::SetOf(CollectionType { element, size }))
    }

    /// `CHOICE { ... }`
    pub fn choice(choice: ChoiceType) -> Self {
        Self::new(TypeKind::Choice(choice))
    }

    /// `[tag] IMPLICIT/EXPLICIT inner` with an arbitrary tag
    ///
    /// # Arguments
    ///
    /// * `tag` - Class and number; the constructed bit is derived when encoding
    /// * `mode` - Tagging mode, promoted to explicit for CHOICE and open types
    /// * `inner` - The tagged type
    pub fn tagged(tag: BerTag, mode: TagMode, inner: TypeRef) -> Self {
        Self::new(TypeKind::Tagged(TaggedType { tag, mode, inner }))
    }

    /// `[number] IMPLICIT/EXPLICIT inner` with a context-specific tag
    pub fn context(number: u32, mode: TagMode, inner: TypeRef) -> Self {
        Self::tagged(BerTag::context_specific(false, number), mode, inner)
    }

    /// Open type, optionally constrained by an information object table
    pub fn open(table: Option<Arc<ConstraintTable>>) -> Self {
        Self::new(TypeKind::Open(OpenType { table }))
    }
}

/// INTEGER constraint metadata
///
/// Bounds are 32-bit quantities (signed when the lower bound is negative or
/// absent, unsigned otherwise). `large` marks types whose bounds do not fit in
/// 32 bits; their values are stored as [`Value::LargeInteger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntegerType {
    pub lower: Option<i64>,
    pub upper: Option<i64>,
    pub extensible: bool,
    pub large: bool,
}

impl IntegerType {
    /// `INTEGER` without a range constraint
    pub fn unconstrained() -> Self {
        Self::default()
    }

    /// `INTEGER (lower..upper)`
    pub fn range(lower: i64, upper: i64) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
            ..Self::default()
        }
    }

    /// `INTEGER (lower..MAX)`
    pub fn at_least(lower: i64) -> Self {
        Self {
            lower: Some(lower),
            ..Self::default()
        }
    }

    /// Arbitrary-precision INTEGER
    pub fn large() -> Self {
        Self {
            large: true,
            ..Self::default()
        }
    }

    /// Mark the constraint as extensible (`...`)
    pub fn extensible(self) -> Self {
        Self {
            extensible: true,
            ..self
        }
    }

    /// Values are unsigned when the lower bound is non-negative
    pub fn is_unsigned(&self) -> bool {
        self.lower.is_some_and(|lower| lower >= 0)
    }

    /// Bounds a value is checked against
    ///
    /// Missing bounds take the limit of the full 32-bit range of the type's
    /// signedness; an extensible constraint widens to that full range.
    pub fn effective_bounds(&self) -> (i64, i64) {
        let (full_lower, full_upper) = if self.is_unsigned() {
            (0, i64::from(u32::MAX))
        } else {
            (i64::from(i32::MIN), i64::from(i32::MAX))
        };
        if self.extensible {
            return (full_lower, full_upper);
        }
        (
            self.lower.unwrap_or(full_lower),
            self.upper.unwrap_or(full_upper),
        )
    }
}

/// SIZE constraint for strings and collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizeConstraint {
    pub lower: Option<usize>,
    pub upper: Option<usize>,
    pub extensible: bool,
}

impl SizeConstraint {
    /// No SIZE constraint
    pub fn unconstrained() -> Self {
        Self::default()
    }

    /// `SIZE (lower..upper)`
    pub fn range(lower: usize, upper: usize) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
            extensible: false,
        }
    }

    /// `SIZE (size)`
    pub fn fixed(size: usize) -> Self {
        Self::range(size, size)
    }

    /// Mark the constraint as extensible (`SIZE (lower..upper, ...)`)
    pub fn extensible(self) -> Self {
        Self {
            extensible: true,
            ..self
        }
    }

    /// Whether `len` satisfies the constraint
    ///
    /// An extensible constraint admits every length.
    pub fn permits(&self, len: usize) -> bool {
        self.extensible
            || (self.lower.is_none_or(|lower| len >= lower)
                && self.upper.is_none_or(|upper| len <= upper))
    }

    /// `lower .. upper` with `MIN`/`MAX` for missing bounds
    pub fn describe(&self) -> String {
        let lower = self
            .lower
            .map_or_else(|| "MIN".to_string(), |l| l.to_string());
        let upper = self
            .upper
            .map_or_else(|| "MAX".to_string(), |u| u.to_string());
        format!("{} .. {}", lower, upper)
    }
}

/// One ENUMERATED item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumItem {
    pub name: String,
    /// Value written on the wire
    pub value: i64,
}

impl EnumItem {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// ENUMERATED metadata: root items followed by extension items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumeratedType {
    items: Vec<EnumItem>,
    root_count: usize,
}

impl EnumeratedType {
    /// Root items only
    pub fn new(items: Vec<EnumItem>) -> Self {
        let root_count = items.len();
        Self { items, root_count }
    }

    /// Items numbered `0, 1, 2, ...` in order
    pub fn from_names(names: &[&str]) -> Self {
        Self::new(
            names
                .iter()
                .zip(0i64..)
                .map(|(name, value)| EnumItem::new(*name, value))
                .collect(),
        )
    }

    /// Append extension additions after the root items
    pub fn with_extensions(mut self, extensions: Vec<EnumItem>) -> Self {
        self.items.extend(extensions);
        self
    }

    /// Root items followed by extension items
    pub fn items(&self) -> &[EnumItem] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&EnumItem> {
        self.items.get(index)
    }

    pub fn root_count(&self) -> usize {
        self.root_count
    }

    pub fn extension_count(&self) -> usize {
        self.items.len() - self.root_count
    }
}

/// Restricted character string kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharStringKind {
    Utf8,
    Numeric,
    Printable,
    Teletex,
    Videotex,
    Ia5,
    Graphic,
    Visible,
    General,
    Universal,
    Bmp,
}

impl CharStringKind {
    /// Bytes per character in the stored value (UTF8String is variable, 1)
    pub fn element_width(self) -> usize {
        match self {
            CharStringKind::Bmp => 2,
            CharStringKind::Universal => 4,
            _ => 1,
        }
    }

    /// ASN.1 type name (`UTF8String`, `BMPString`)
    pub fn asn1_name(self) -> &'static str {
        match self {
            CharStringKind::Utf8 => "UTF8String",
            CharStringKind::Numeric => "NumericString",
            CharStringKind::Printable => "PrintableString",
            CharStringKind::Teletex => "TeletexString",
            CharStringKind::Videotex => "VideotexString",
            CharStringKind::Ia5 => "IA5String",
            CharStringKind::Graphic => "GraphicString",
            CharStringKind::Visible => "VisibleString",
            CharStringKind::General => "GeneralString",
            CharStringKind::Universal => "UniversalString",
            CharStringKind::Bmp => "BMPString",
        }
    }

    /// UNIVERSAL tag number of the kind
    pub fn universal_tag_number(self) -> u32 {
        match self {
            CharStringKind::Utf8 => universal::UTF8_STRING,
            CharStringKind::Numeric => universal::NUMERIC_STRING,
            CharStringKind::Printable => universal::PRINTABLE_STRING,
            CharStringKind::Teletex => universal::TELETEX_STRING,
            CharStringKind::Videotex => universal::VIDEOTEX_STRING,
            CharStringKind::Ia5 => universal::IA5_STRING,
            CharStringKind::Graphic => universal::GRAPHIC_STRING,
            CharStringKind::Visible => universal::VISIBLE_STRING,
            CharStringKind::General => universal::GENERAL_STRING,
            CharStringKind::Universal => universal::UNIVERSAL_STRING,
            CharStringKind::Bmp => universal::BMP_STRING,
        }
    }

    /// Character set of the kind (X.680 clause 41); empty means any
    pub fn default_alphabet(self) -> Vec<RangeInclusive<u32>> {
        match self {
            CharStringKind::Numeric => vec![0x20..=0x20, 0x30..=0x39],
            CharStringKind::Printable => vec![
                0x20..=0x20,
                0x27..=0x29,
                0x2B..=0x3A,
                0x3D..=0x3D,
                0x3F..=0x3F,
                0x41..=0x5A,
                0x61..=0x7A,
            ],
            CharStringKind::Ia5 => vec![0x00..=0x7F],
            CharStringKind::Visible => vec![0x20..=0x7E],
            _ => Vec::new(),
        }
    }
}

/// Character string metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharStringType {
    pub kind: CharStringKind,
    /// Size in characters
    pub size: SizeConstraint,
    /// Permitted code point ranges; empty means unrestricted
    pub alphabet: Vec<RangeInclusive<u32>>,
}

impl CharStringType {
    /// A string of `kind` restricted to the kind's own character set
    pub fn new(kind: CharStringKind) -> Self {
        Self {
            kind,
            size: SizeConstraint::unconstrained(),
            alphabet: kind.default_alphabet(),
        }
    }

    pub fn with_size(self, size: SizeConstraint) -> Self {
        Self { size, ..self }
    }

    /// Replace the permitted alphabet (`FROM (...)`)
    pub fn with_alphabet(self, alphabet: Vec<RangeInclusive<u32>>) -> Self {
        Self { alphabet, ..self }
    }

    /// Whether `code_point` is in the permitted alphabet
    pub fn permits(&self, code_point: u32) -> bool {
        self.alphabet.is_empty() || self.alphabet.iter().any(|range| range.contains(&code_point))
    }
}

/// How a record field may be absent
#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    Mandatory,
    Optional,
    /// `DEFAULT value`; a field equal to its default is treated as absent
    Default(Value),
    /// Extension addition (after `...`), always optional
    Extension,
}

/// One SEQUENCE / SET component
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub ty: TypeRef,
    pub presence: Presence,
}

impl FieldDescriptor {
    /// A component that must be present
    pub fn mandatory(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            presence: Presence::Mandatory,
        }
    }

    /// An `OPTIONAL` component
    pub fn optional(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            presence: Presence::Optional,
        }
    }

    /// A component with a `DEFAULT` value
    pub fn with_default(name: impl Into<String>, ty: TypeRef, default: Value) -> Self {
        Self {
            name: name.into(),
            ty,
            presence: Presence::Default(default),
        }
    }

    /// An extension addition; absent values are omitted from every encoding
    pub fn extension(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            presence: Presence::Extension,
        }
    }

    /// The value that counts as present for this field
    ///
    /// `None` for an absent slot and for a DEFAULT field holding its default.
    pub fn present<'a>(&self, slot: Option<&'a Value>) -> Option<&'a Value> {
        match (&self.presence, slot) {
            (Presence::Default(default), Some(value)) if value == default => None,
            (_, slot) => slot,
        }
    }

    /// The field's value, falling back to its DEFAULT when absent
    pub fn value_or_default<'a>(&'a self, slot: Option<&'a Value>) -> Option<&'a Value> {
        match (&self.presence, slot) {
            (_, Some(value)) => Some(value),
            (Presence::Default(default), None) => Some(default),
            (_, None) => None,
        }
    }

    /// Whether an absent slot is a constraint violation
    pub fn is_mandatory(&self) -> bool {
        self.presence == Presence::Mandatory
    }
}

/// SEQUENCE / SET metadata
#[derive(Debug, Clone)]
pub struct RecordType {
    pub fields: Vec<FieldDescriptor>,
}

impl RecordType {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }
}

/// SEQUENCE OF / SET OF metadata
#[derive(Debug, Clone)]
pub struct CollectionType {
    pub element: TypeRef,
    pub size: SizeConstraint,
}

/// One CHOICE alternative
#[derive(Debug, Clone)]
pub struct Alternative {
    pub name: String,
    pub ty: TypeRef,
}

impl Alternative {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// CHOICE metadata: root alternatives followed by extension alternatives
#[derive(Debug, Clone)]
pub struct ChoiceType {
    alternatives: Vec<Alternative>,
    root_count: usize,
}

impl ChoiceType {
    /// Root alternatives only
    pub fn new(alternatives: Vec<Alternative>) -> Self {
        let root_count = alternatives.len();
        Self {
            alternatives,
            root_count,
        }
    }

    /// Append extension alternatives after the root alternatives
    pub fn with_extensions(mut self, extensions: Vec<Alternative>) -> Self {
        self.alternatives.extend(extensions);
        self
    }

    /// Root alternatives followed by extension alternatives
    pub fn alternatives(&self) -> &[Alternative] {
        &self.alternatives
    }

    pub fn alternative(&self, index: usize) -> Option<&Alternative> {
        self.alternatives.get(index)
    }

    pub fn root_count(&self) -> usize {
        self.root_count
    }

    pub fn extension_count(&self) -> usize {
        self.alternatives.len() - self.root_count
    }
}

/// Tagging mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMode {
    Explicit,
    Implicit,
}

/// `[tag] inner`
#[derive(Debug, Clone)]
pub struct TaggedType {
    pub tag: BerTag,
    pub mode: TagMode,
    pub inner: TypeRef,
}

/// Open type (`ANY`, `CLASS.&Type`)
#[derive(Debug, Clone, Default)]
pub struct OpenType {
    /// Information object set constraint, consulted by validation only
    pub table: Option<Arc<ConstraintTable>>,
}
