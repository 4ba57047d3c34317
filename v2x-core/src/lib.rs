//! Core types and error handling for the V2X ASN.1 codec
//!
//! This crate provides the error type shared by every layer of the codec and
//! the value datatypes whose representation does not depend on a schema.

pub mod error;
pub mod datatypes;

pub use error::{V2xError, V2xResult};
pub use datatypes::{BitString, ObjectIdentifier};
