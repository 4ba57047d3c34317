//! BER (Basic Encoding Rules) encoder for ASN.1
//!
//! This module provides the binary wire format exchanged between V2X
//! stations. Every value is written as a TLV (Tag-Length-Value) triplet:
//!
//! ```text
//! [Tag] [Length] [Value]
//! ```
//!
//! ## Tag Encoding
//!
//! ```text
//! Bits: 8 7 6 5 4 3 2 1
//!       C C P T T T T T
//! ```
//! Where:
//! - CC = Class (00=Universal, 01=Application, 10=Context, 11=Private)
//! - P = Primitive (0) or Constructed (1)
//! - TTTTT = Tag number (0-30), or 11111 followed by base-128 groups
//!
//! ## Length Encoding
//!
//! - **Short form** (1 byte): lengths 0-127
//! - **Long form**: `0x80 | n` followed by `n` big-endian length bytes,
//!   without leading zero bytes
//!
//! Only the definite form is produced. Constructed values are written with a
//! reserved length that is patched once their content is complete (see
//! [`ByteSink`](crate::sink::ByteSink)).

pub mod encoder;
pub mod types;

pub use encoder::{BerEncoder, encode_ber};
pub use types::{BerLength, BerTag, BerTagClass};
