//! GSER (Generic String Encoding Rules) output
//!
//! Renders a value tree as ASN.1 value notation for logs and diagnostic
//! tooling:
//!
//! ```text
//! {
//!   version 3,
//!   body psid: 32,
//!   label "rsu-12"
//! }
//! ```
//!
//! Output is not meant to be parsed back by this crate.

pub mod encoder;

pub use encoder::{GserEncoder, encode_gser};
