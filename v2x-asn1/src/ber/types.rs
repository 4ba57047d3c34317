//! BER encoding types (Tag, Length, etc.)

use v2x_core::{V2xError, V2xResult};

/// BER Tag Class
///
/// ASN.1 defines four tag classes:
/// - **Universal**: Standard ASN.1 types (INTEGER, OCTET STRING, etc.)
/// - **Application**: Application-specific types
/// - **Context-specific**: Context-dependent types (used in SEQUENCE/SET)
/// - **Private**: Private/implementation-specific types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BerTagClass {
    /// Universal class (00)
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10)
    ContextSpecific = 2,
    /// Private class (11)
    Private = 3,
}

impl BerTagClass {
    /// Get tag class from bits (bits 7-6 of tag byte)
    pub fn from_bits(bits: u8) -> Self {
        match (bits >> 6) & 0x03 {
            0 => BerTagClass::Universal,
            1 => BerTagClass::Application,
            2 => BerTagClass::ContextSpecific,
            _ => BerTagClass::Private,
        }
    }

    /// Convert tag class to bits (for encoding)
    pub fn to_bits(self) -> u8 {
        (self as u8) << 6
    }
}

/// Universal tag numbers (X.680 clause 8.4)
pub mod universal {
    pub const BOOLEAN: u32 = 1;
    pub const INTEGER: u32 = 2;
    pub const BIT_STRING: u32 = 3;
    pub const OCTET_STRING: u32 = 4;
    pub const NULL: u32 = 5;
    pub const OBJECT_IDENTIFIER: u32 = 6;
    pub const REAL: u32 = 9;
    pub const ENUMERATED: u32 = 10;
    pub const UTF8_STRING: u32 = 12;
    pub const RELATIVE_OID: u32 = 13;
    pub const SEQUENCE: u32 = 16;
    pub const SET: u32 = 17;
    pub const NUMERIC_STRING: u32 = 18;
    pub const PRINTABLE_STRING: u32 = 19;
    pub const TELETEX_STRING: u32 = 20;
    pub const VIDEOTEX_STRING: u32 = 21;
    pub const IA5_STRING: u32 = 22;
    pub const GRAPHIC_STRING: u32 = 25;
    pub const VISIBLE_STRING: u32 = 26;
    pub const GENERAL_STRING: u32 = 27;
    pub const UNIVERSAL_STRING: u32 = 28;
    pub const BMP_STRING: u32 = 30;
}

/// BER Tag
///
/// A BER tag identifies the type of an ASN.1 value. It consists of:
/// - **Class**: Universal, Application, Context-specific, or Private
/// - **Constructed/Primitive**: Whether the value is constructed (contains other values)
/// - **Tag Number**: The actual tag number (0-30 for short form, or extended)
///
/// # Encoding Format
///
/// Short form (tag number 0-30):
/// ```text
/// Bits: 8 7 6 5 4 3 2 1
///       C C P T T T T T
/// ```
///
/// Extended form (tag number >= 31):
/// ```text
/// First byte:  C C P 1 1 1 1 1  (all tag bits set to 1)
/// Following bytes: 1 T T T T T T T  (continuation bytes, last byte has bit 7 = 0)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BerTag {
    /// Tag class
    class: BerTagClass,
    /// Whether this is a constructed type
    constructed: bool,
    /// Tag number
    number: u32,
}

impl BerTag {
    /// Create a new BER tag
    pub fn new(class: BerTagClass, constructed: bool, number: u32) -> Self {
        Self {
            class,
            constructed,
            number,
        }
    }

    /// Create a Universal class tag
    pub fn universal(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::Universal, constructed, number)
    }

    /// Create an Application class tag
    pub fn application(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::Application, constructed, number)
    }

    /// Create a Context-specific class tag
    pub fn context_specific(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::ContextSpecific, constructed, number)
    }

    /// Create a Private class tag
    pub fn private(constructed: bool, number: u32) -> Self {
        Self::new(BerTagClass::Private, constructed, number)
    }

    /// Same class and number, with the given constructed bit
    pub fn with_constructed(self, constructed: bool) -> Self {
        Self {
            constructed,
            ..self
        }
    }

    /// Get tag class
    pub fn class(&self) -> BerTagClass {
        self.class
    }

    /// Check if tag is constructed
    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    /// Get tag number
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Encode tag to bytes
    ///
    /// # Encoding Strategy
    /// - If tag number < 31: Use short form (1 byte)
    /// - Otherwise: low 5 bits all set, number follows in base-128, most
    ///   significant group first
    pub fn encode(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(6);

        // Build first byte: class (2 bits) + constructed (1 bit) + tag (5 bits)
        let class_bits = self.class.to_bits();
        let constructed_bit = if self.constructed { 0x20 } else { 0x00 };

        if self.number < 31 {
            result.push(class_bits | constructed_bit | (self.number as u8 & 0x1F));
        } else {
            result.push(class_bits | constructed_bit | 0x1F);

            let mut remaining = self.number;
            let mut groups = Vec::new();
            while remaining > 0 {
                groups.push((remaining & 0x7F) as u8);
                remaining >>= 7;
            }

            let last = groups.len() - 1;
            for (i, &group) in groups.iter().rev().enumerate() {
                result.push(if i < last { group | 0x80 } else { group });
            }
        }

        result
    }

    /// Decode tag from bytes
    ///
    /// # Returns
    /// Returns `Ok((BerTag, bytes_consumed))` if successful, `Err` otherwise
    pub fn decode(data: &[u8]) -> V2xResult<(Self, usize)> {
        let Some(&first_byte) = data.first() else {
            return Err(V2xError::InvalidData(
                "Empty buffer for tag decoding".to_string(),
            ));
        };

        let class = BerTagClass::from_bits(first_byte);
        let constructed = (first_byte & 0x20) != 0;
        let tag_bits = first_byte & 0x1F;

        if tag_bits < 31 {
            return Ok((Self::new(class, constructed, tag_bits as u32), 1));
        }

        let mut tag_number = 0u32;
        let mut pos = 1;
        let mut has_more = true;

        while has_more && pos < data.len() {
            let byte = data[pos];
            has_more = (byte & 0x80) != 0;
            tag_number = (tag_number << 7) | ((byte & 0x7F) as u32);
            pos += 1;

            // Max 5 bytes for u32
            if pos > 5 {
                return Err(V2xError::InvalidData(
                    "Tag number too large or invalid encoding".to_string(),
                ));
            }
        }

        if has_more {
            return Err(V2xError::InvalidData(
                "Incomplete extended tag encoding".to_string(),
            ));
        }

        Ok((Self::new(class, constructed, tag_number), pos))
    }
}

/// BER Length encoding
///
/// BER length can be encoded in two forms:
/// - **Short form**: For lengths 0-127 (1 byte)
/// - **Long form**: For lengths > 127 (2-127 bytes)
///
/// # Encoding Format
///
/// Short form:
/// ```text
/// Byte: 0 L L L L L L L
/// ```
///
/// Long form:
/// ```text
/// First byte:  1 N N N N N N N  (N = number of length bytes)
/// Following bytes: L L L L L L L L  (big-endian length value, no leading zero bytes)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BerLength {
    /// Short form: length 0-127
    Short(u8),
    /// Long form: length > 127, encoded with length-of-length
    Long(usize),
}

impl BerLength {
    /// Create a new BER length, choosing short or long form by value
    pub fn new(length: usize) -> Self {
        if length < 128 {
            BerLength::Short(length as u8)
        } else {
            BerLength::Long(length)
        }
    }

    /// Get the length value
    pub fn value(&self) -> usize {
        match self {
            BerLength::Short(l) => *l as usize,
            BerLength::Long(l) => *l,
        }
    }

    /// Number of bytes the encoded length occupies
    pub fn encoded_len(&self) -> usize {
        match self {
            BerLength::Short(_) => 1,
            BerLength::Long(length) => 1 + Self::significant_bytes(*length),
        }
    }

    fn significant_bytes(length: usize) -> usize {
        let bits = usize::BITS - length.leading_zeros();
        (bits as usize).div_ceil(8).max(1)
    }

    /// Encode length to bytes
    ///
    /// Returns 1 byte for short form, `1 + n` bytes for long form where `n`
    /// is the minimal big-endian byte count of the length.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            BerLength::Short(length) => vec![*length],
            BerLength::Long(length) => {
                let num_bytes = Self::significant_bytes(*length);

                let mut result = Vec::with_capacity(1 + num_bytes);
                result.push(0x80 | (num_bytes as u8));
                for i in (0..num_bytes).rev() {
                    result.push(((*length >> (i * 8)) & 0xFF) as u8);
                }
                result
            }
        }
    }

    /// Decode length from bytes
    ///
    /// # Returns
    /// Returns `Ok((BerLength, bytes_consumed))` if successful, `Err` otherwise
    ///
    /// # Error Handling
    /// Returns error if:
    /// - Buffer is too short
    /// - Indefinite length form is used
    /// - Length value needs more than 4 bytes
    pub fn decode(data: &[u8]) -> V2xResult<(Self, usize)> {
        let Some(&first_byte) = data.first() else {
            return Err(V2xError::InvalidData(
                "Empty buffer for length decoding".to_string(),
            ));
        };

        if (first_byte & 0x80) == 0 {
            return Ok((BerLength::Short(first_byte & 0x7F), 1));
        }

        let num_bytes = (first_byte & 0x7F) as usize;

        if num_bytes == 0 {
            return Err(V2xError::InvalidData(
                "Indefinite length encoding not supported".to_string(),
            ));
        }

        if num_bytes > 4 {
            return Err(V2xError::InvalidData(format!(
                "Length encoding too large: {} bytes (max 4)",
                num_bytes
            )));
        }

        if data.len() < 1 + num_bytes {
            return Err(V2xError::InvalidData(format!(
                "Buffer too short for long form length: need {} bytes, got {}",
                1 + num_bytes,
                data.len()
            )));
        }

        let length = data[1..=num_bytes]
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | b as usize);

        Ok((BerLength::Long(length), 1 + num_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ber_tag_short_form() {
        let tag = BerTag::universal(false, universal::INTEGER);
        assert_eq!(tag.encode(), vec![0x02]);
    }

    #[test]
    fn test_ber_tag_constructed() {
        let tag = BerTag::application(true, 0);
        assert_eq!(tag.encode(), vec![0x60]);
    }

    #[test]
    fn test_ber_tag_extended_boundary() {
        assert_eq!(BerTag::context_specific(false, 30).encode(), vec![0x9E]);
        assert_eq!(BerTag::context_specific(false, 31).encode(), vec![0x9F, 0x1F]);
        assert_eq!(BerTag::private(true, 128).encode(), vec![0xFF, 0x81, 0x00]);
        assert_eq!(
            BerTag::application(false, 16384).encode(),
            vec![0x5F, 0x81, 0x80, 0x00]
        );
    }

    #[test]
    fn test_ber_tag_roundtrip() {
        let classes = [
            BerTagClass::Universal,
            BerTagClass::Application,
            BerTagClass::ContextSpecific,
            BerTagClass::Private,
        ];
        for &number in &[2u32, 31, 128, 16384] {
            for &class in &classes {
                for &constructed in &[false, true] {
                    let tag = BerTag::new(class, constructed, number);
                    let encoded = tag.encode();
                    let (decoded, consumed) = BerTag::decode(&encoded).unwrap();
                    assert_eq!(consumed, encoded.len());
                    assert_eq!(decoded.class(), class);
                    assert_eq!(decoded.is_constructed(), constructed);
                    assert_eq!(decoded.number(), number);
                }
            }
        }
    }

    #[test]
    fn test_ber_tag_decode_incomplete() {
        assert!(BerTag::decode(&[]).is_err());
        assert!(BerTag::decode(&[0x1F, 0x81]).is_err());
    }

    #[test]
    fn test_ber_length_forms() {
        assert_eq!(BerLength::new(0).encode(), vec![0x00]);
        assert_eq!(BerLength::new(127).encode(), vec![0x7F]);
        assert_eq!(BerLength::new(128).encode(), vec![0x81, 0x80]);
        assert_eq!(BerLength::new(65535).encode(), vec![0x82, 0xFF, 0xFF]);
        assert_eq!(
            BerLength::new(16_777_216).encode(),
            vec![0x84, 0x01, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_ber_length_encoded_len() {
        for &n in &[0usize, 127, 128, 255, 256, 65535, 65536, 16_777_216] {
            let length = BerLength::new(n);
            assert_eq!(length.encoded_len(), length.encode().len());
        }
    }

    #[test]
    fn test_ber_length_decode() {
        let (length, consumed) = BerLength::decode(&[100]).unwrap();
        assert_eq!(consumed, 1);
        assert_eq!(length.value(), 100);

        let (length, consumed) = BerLength::decode(&[0x82, 0x01, 0x00]).unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(length.value(), 256);

        assert!(BerLength::decode(&[0x80]).is_err());
        assert!(BerLength::decode(&[0x82, 0x01]).is_err());
    }
}
