//! v2x - ASN.1 codec runtime for V2X (WAVE / J2735) messages
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `v2x-core`: error type and schema-independent datatypes
//! - `v2x-asn1`: type descriptors, constraint checking, BER/GSER/XER encoders
//!
//! # Usage
//!
//! ```no_run
//! use v2x::schema::{IntegerType, TypeDescriptor, Value};
//! use v2x::{GserOptions, encode_gser};
//!
//! let ty = TypeDescriptor::integer(IntegerType::range(0, 255));
//! let text = encode_gser(&ty, &Value::Integer(7), &GserOptions::default())?;
//! assert_eq!(text, "7");
//! # Ok::<(), v2x::V2xError>(())
//! ```

// Re-export core types
pub use v2x_core::datatypes::*;
pub use v2x_core::{V2xError, V2xResult};

// Re-export codec API
pub use v2x_asn1::{
    BerEncoder, BerLength, BerTag, BerTagClass, ByteSink, CodecConfig, GserOptions, TypeDescriptor,
    TypeRef, Value, XerOptions, bind_open_types, check_constraints, encode_ber, encode_gser,
    encode_xer, resolve_open_type,
};

pub mod schema {
    pub use v2x_asn1::schema::*;
}

pub mod constraints {
    pub use v2x_asn1::constraints::*;
}

pub mod ber {
    pub use v2x_asn1::ber::*;
}

pub mod xer {
    pub use v2x_asn1::xer::*;
}

pub mod gser {
    pub use v2x_asn1::gser::*;
}

pub mod config {
    pub use v2x_asn1::config::*;
}

pub mod sink {
    pub use v2x_asn1::sink::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gser_encoder_through_facade() {
        let ty = schema::TypeDescriptor::boolean();
        let mut encoder = gser::GserEncoder::with_sink(
            sink::ByteSink::new(),
            config::GserOptions::default(),
        );
        encoder.encode_value(&ty, &Value::Boolean(true)).unwrap();
        assert_eq!(encoder.into_string().unwrap(), "TRUE");
    }
}
