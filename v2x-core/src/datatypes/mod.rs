//! Value datatypes shared by the encoders

pub mod bit_string;
pub mod object_identifier;

pub use bit_string::BitString;
pub use object_identifier::ObjectIdentifier;
