//! Helpers shared by the text encoders

use v2x_core::{V2xError, V2xResult};

use crate::sink::ByteSink;

/// Spellings of the REAL special values
#[derive(Debug, Clone, Copy)]
pub(crate) struct RealTokens {
    pub plus_infinity: &'static str,
    pub minus_infinity: &'static str,
    pub not_a_number: &'static str,
}

pub(crate) const GSER_REAL_TOKENS: RealTokens = RealTokens {
    plus_infinity: "PLUS-INFINITY",
    minus_infinity: "MINUS-INFINITY",
    not_a_number: "NOT-A-NUMBER",
};

pub(crate) const XER_REAL_TOKENS: RealTokens = RealTokens {
    plus_infinity: "INF",
    minus_infinity: "-INF",
    not_a_number: "NaN",
};

/// `0`, a special token, or `<mantissa>E<exponent>` (`1.5E0`, `-2.5E-3`)
pub(crate) fn real_text(value: f64, tokens: &RealTokens) -> String {
    if value.is_nan() {
        tokens.not_a_number.to_string()
    } else if value.is_infinite() {
        if value > 0.0 {
            tokens.plus_infinity.to_string()
        } else {
            tokens.minus_infinity.to_string()
        }
    } else if value == 0.0 {
        "0".to_string()
    } else {
        format!("{:E}", value)
    }
}

/// Uppercase hex digits, two per byte
pub(crate) fn hex_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Decimal rendering of a two's complement, big-endian integer
#[cfg(feature = "large-integer")]
pub(crate) fn large_integer_text(bytes: &[u8]) -> V2xResult<String> {
    const LIMB: u64 = 1_000_000_000;

    let negative = bytes.first().is_some_and(|b| b & 0x80 != 0);
    let mut magnitude = bytes.to_vec();
    if negative {
        // Two's complement negation: invert, then add one
        for b in magnitude.iter_mut() {
            *b = !*b;
        }
        for b in magnitude.iter_mut().rev() {
            let (sum, overflow) = b.overflowing_add(1);
            *b = sum;
            if !overflow {
                break;
            }
        }
    }

    // Base 10^9 limbs, least significant first
    let mut limbs: Vec<u64> = Vec::new();
    for &byte in &magnitude {
        let mut carry = u64::from(byte);
        for limb in limbs.iter_mut() {
            let v = *limb * 256 + carry;
            *limb = v % LIMB;
            carry = v / LIMB;
        }
        while carry > 0 {
            limbs.push(carry % LIMB);
            carry /= LIMB;
        }
    }

    let Some((most, rest)) = limbs.split_last() else {
        return Ok("0".to_string());
    };
    let mut text = String::with_capacity(limbs.len() * 9 + 1);
    if negative {
        text.push('-');
    }
    text.push_str(&most.to_string());
    for limb in rest.iter().rev() {
        text.push_str(&format!("{:09}", limb));
    }
    Ok(text)
}

#[cfg(not(feature = "large-integer"))]
pub(crate) fn large_integer_text(_bytes: &[u8]) -> V2xResult<String> {
    Err(V2xError::Unsupported(
        "large integer rendering requires the large-integer feature".to_string(),
    ))
}

/// Take the text accumulated in `sink`
pub(crate) fn into_string(sink: ByteSink) -> V2xResult<String> {
    String::from_utf8(sink.into_bytes()?)
        .map_err(|e| V2xError::InvalidData(format!("text output is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_text() {
        assert_eq!(real_text(0.0, &GSER_REAL_TOKENS), "0");
        assert_eq!(real_text(-0.0, &GSER_REAL_TOKENS), "0");
        assert_eq!(real_text(f64::INFINITY, &GSER_REAL_TOKENS), "PLUS-INFINITY");
        assert_eq!(real_text(f64::NEG_INFINITY, &XER_REAL_TOKENS), "-INF");
        assert_eq!(real_text(f64::NAN, &XER_REAL_TOKENS), "NaN");

        let text = real_text(1.5, &GSER_REAL_TOKENS);
        assert_eq!(text, "1.5E0");
        assert!(!text.contains('+'));
        assert_eq!(real_text(-0.0025, &GSER_REAL_TOKENS), "-2.5E-3");
        assert_eq!(real_text(12000.0, &GSER_REAL_TOKENS), "1.2E4");
    }

    #[test]
    fn test_hex_upper() {
        assert_eq!(hex_upper(&[0x0A, 0xBC, 0x00]), "0ABC00");
        assert_eq!(hex_upper(&[]), "");
    }

    #[cfg(feature = "large-integer")]
    #[test]
    fn test_large_integer_text() {
        assert_eq!(large_integer_text(&[]).unwrap(), "0");
        assert_eq!(large_integer_text(&[0x00]).unwrap(), "0");
        assert_eq!(large_integer_text(&[0x7F]).unwrap(), "127");
        assert_eq!(large_integer_text(&[0xFF]).unwrap(), "-1");
        assert_eq!(large_integer_text(&[0x80]).unwrap(), "-128");
        // 2^64
        assert_eq!(
            large_integer_text(&[0x01, 0, 0, 0, 0, 0, 0, 0, 0]).unwrap(),
            "18446744073709551616"
        );
        // -2^63
        assert_eq!(
            large_integer_text(&i64::MIN.to_be_bytes()).unwrap(),
            "-9223372036854775808"
        );
        assert_eq!(
            large_integer_text(&1_000_000_000i64.to_be_bytes()).unwrap(),
            "1000000000"
        );
    }
}
