//! Character string element decoding
//!
//! UTF8String values hold UTF-8 bytes. Every other kind holds fixed-width
//! big-endian elements (1, 2 or 4 bytes) whose numeric value is the code point.

use std::borrow::Cow;

use v2x_core::{V2xError, V2xResult};

use crate::schema::CharStringKind;

/// Validate a UTF8String value
///
/// The error names the byte offset of the first invalid sequence.
pub fn validate_utf8(bytes: &[u8]) -> V2xResult<&str> {
    std::str::from_utf8(bytes).map_err(|e| V2xError::InvalidUtf8 {
        position: e.valid_up_to(),
    })
}

/// Decode stored elements to code points
pub fn code_points(kind: CharStringKind, bytes: &[u8]) -> V2xResult<Vec<u32>> {
    if kind == CharStringKind::Utf8 {
        return Ok(validate_utf8(bytes)?.chars().map(u32::from).collect());
    }

    let width = kind.element_width();
    if bytes.len() % width != 0 {
        return Err(V2xError::InvalidData(format!(
            "{} content of {} bytes is not a multiple of {}",
            kind.asn1_name(),
            bytes.len(),
            width
        )));
    }
    Ok(bytes
        .chunks_exact(width)
        .map(|element| {
            element
                .iter()
                .fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
        })
        .collect())
}

/// Re-encode stored elements as UTF-8 text
///
/// Fails on invalid UTF-8 and on elements that are not Unicode scalar values
/// (surrogates, values above U+10FFFF).
pub fn to_text(kind: CharStringKind, bytes: &[u8]) -> V2xResult<Cow<'_, str>> {
    if kind == CharStringKind::Utf8 {
        return validate_utf8(bytes).map(Cow::Borrowed);
    }

    code_points(kind, bytes)?
        .into_iter()
        .enumerate()
        .map(|(position, code_point)| {
            char::from_u32(code_point).ok_or(V2xError::InvalidCharacter {
                position,
                code_point,
            })
        })
        .collect::<V2xResult<String>>()
        .map(Cow::Owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_validation() {
        assert!(matches!(
            validate_utf8(&[0xC3, 0x28]),
            Err(V2xError::InvalidUtf8 { position: 0 })
        ));
        assert_eq!(validate_utf8(&[0xC3, 0xA9]).unwrap(), "é");
        assert!(matches!(
            validate_utf8(b"ab\xFF"),
            Err(V2xError::InvalidUtf8 { position: 2 })
        ));
    }

    #[test]
    fn test_code_points_by_width() {
        assert_eq!(
            code_points(CharStringKind::Bmp, &[0x00, 0x41, 0x20, 0xAC]).unwrap(),
            vec![0x41, 0x20AC]
        );
        assert_eq!(
            code_points(CharStringKind::Universal, &[0x00, 0x01, 0xF6, 0x00]).unwrap(),
            vec![0x1F600]
        );
        assert!(code_points(CharStringKind::Bmp, &[0x00]).is_err());
    }

    #[test]
    fn test_to_text() {
        assert_eq!(to_text(CharStringKind::Bmp, &[0x20, 0xAC]).unwrap(), "€");
        assert_eq!(to_text(CharStringKind::Teletex, &[0xE9]).unwrap(), "é");
        assert!(matches!(
            to_text(CharStringKind::Bmp, &[0x00, 0x41, 0xD8, 0x00]),
            Err(V2xError::InvalidCharacter {
                position: 1,
                code_point: 0xD800
            })
        ));
    }
}
