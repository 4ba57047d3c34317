//! ASN.1 codec runtime for V2X messages
//!
//! This crate interprets shared type descriptors to encode value trees as
//! BER, check them against their subtype constraints and render them as GSER
//! or XER text. It has no compile-time knowledge of any message shape: the
//! WAVE and J2735 modules are described entirely by [`schema`] descriptors.
//!
//! # Layout
//!
//! - [`sink`]: append-only output buffer with length back-patching
//! - [`schema`]: type descriptors, value trees, information object tables
//! - [`constraints`]: constraint checking and open-type resolution
//! - [`ber`]: BER tag/length primitives and the schema-driven encoder
//! - [`gser`], [`xer`]: text encoders
//! - [`config`]: text encoder options
//!
//! # Example
//!
//! ```rust,no_run
//! use v2x_asn1::{check_constraints, encode_ber};
//! use v2x_asn1::schema::{FieldDescriptor, IntegerType, TypeDescriptor, Value};
//!
//! let header = TypeDescriptor::sequence(vec![FieldDescriptor::mandatory(
//!     "version",
//!     TypeDescriptor::integer(IntegerType::range(0, 3)).into_ref(),
//! )])
//! .with_name("Header");
//! let value = Value::record(vec![Some(Value::Integer(3))]);
//!
//! check_constraints(&header, &value)?;
//! let bytes = encode_ber(&header, &value)?;
//! assert_eq!(bytes, vec![0x30, 0x03, 0x02, 0x01, 0x03]);
//! # Ok::<(), v2x_core::V2xError>(())
//! ```
//!
//! # TODO
//!
//! ## 编码
//! - [x] BER 编码（定长形式）
//! - [x] GSER / XER 文本输出
//! - [ ] BER 解码到值树
//! - [ ] UPER 编码（J2735 空口格式）

pub mod ber;
pub mod chars;
pub mod config;
pub mod constraints;
pub mod gser;
pub mod schema;
pub mod sink;
mod text;
pub mod xer;

pub use ber::{BerEncoder, BerLength, BerTag, BerTagClass, encode_ber};
pub use config::{CodecConfig, GserOptions, XerOptions};
pub use constraints::{bind_open_types, check_constraints, resolve_open_type};
pub use gser::encode_gser;
pub use schema::{TypeDescriptor, TypeRef, Value};
pub use sink::ByteSink;
pub use xer::encode_xer;
