//! Bit string value type

use crate::error::{V2xError, V2xResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arbitrary string of bits (zeros and ones), most significant bit first.
/// A bit string value can have any length including zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitString {
    bytes: Vec<u8>,
    num_bits: usize,
}

impl BitString {
    /// Construct a new bit string object.
    ///
    /// # Arguments
    ///
    /// * `bytes` - The bits packed MSB first
    /// * `num_bits` - The number of significant bits
    ///
    /// # Errors
    ///
    /// Returns an error if `num_bits > bytes.len() * 8`.
    pub fn new(bytes: Vec<u8>, num_bits: usize) -> V2xResult<Self> {
        if num_bits > bytes.len() * 8 {
            return Err(V2xError::InvalidData(format!(
                "bit string is too short to hold all bits. Need {} bytes for {} bits",
                num_bits.div_ceil(8),
                num_bits
            )));
        }

        Ok(Self { bytes, num_bits })
    }

    /// Build a bit string from individual bits
    pub fn from_bits(bits: &[bool]) -> Self {
        let mut bytes = vec![0u8; bits.len().div_ceil(8)];
        for (index, _) in bits.iter().enumerate().filter(|(_, bit)| **bit) {
            bytes[index / 8] |= 0x80 >> (index % 8);
        }
        Self {
            bytes,
            num_bits: bits.len(),
        }
    }

    /// Get the bit string as byte array.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The number of bits in the byte array.
    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// Number of unused bits in the last significant byte (0-7)
    pub fn unused_bits(&self) -> u8 {
        ((8 - self.num_bits % 8) % 8) as u8
    }

    /// The significant bytes with unused trailing bits cleared
    ///
    /// Bytes beyond `ceil(num_bits / 8)` are dropped.
    pub fn content_bytes(&self) -> Vec<u8> {
        let mut content = self.bytes[..self.num_bits.div_ceil(8)].to_vec();
        let unused = self.unused_bits();
        if let Some(last) = content.last_mut() {
            *last &= 0xFF << unused;
        }
        content
    }

    /// Get the bit at a specific position
    ///
    /// # Arguments
    /// * `index` - The bit index (0-based)
    ///
    /// # Returns
    /// * `true` if the bit is set, `false` otherwise
    /// * `Err` if the index is out of bounds
    pub fn get_bit(&self, index: usize) -> V2xResult<bool> {
        if index >= self.num_bits {
            return Err(V2xError::InvalidData(format!(
                "Bit index {} out of bounds (num_bits: {})",
                index, self.num_bits
            )));
        }
        let byte_index = index / 8;
        let bit_index = 7 - (index % 8); // MSB first
        Ok((self.bytes[byte_index] >> bit_index) & 1 == 1)
    }

    /// Set the bit at a specific position
    pub fn set_bit(&mut self, index: usize, value: bool) -> V2xResult<()> {
        if index >= self.num_bits {
            return Err(V2xError::InvalidData(format!(
                "Bit index {} out of bounds (num_bits: {})",
                index, self.num_bits
            )));
        }
        let byte_index = index / 8;
        let bit_index = 7 - (index % 8); // MSB first
        if value {
            self.bytes[byte_index] |= 1 << bit_index;
        } else {
            self.bytes[byte_index] &= !(1 << bit_index);
        }
        Ok(())
    }

    /// Iterate over the significant bits, MSB first
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.num_bits).map(move |index| (self.bytes[index / 8] >> (7 - index % 8)) & 1 == 1)
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.bits() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_string_new() {
        let bytes = vec![0xFF, 0x00, 0xAA];
        let bit_string = BitString::new(bytes.clone(), 24).unwrap();
        assert_eq!(bit_string.as_bytes(), &bytes);
        assert_eq!(bit_string.num_bits(), 24);
        assert_eq!(bit_string.unused_bits(), 0);
    }

    #[test]
    fn test_bit_string_invalid() {
        let result = BitString::new(vec![0xFF], 16);
        assert!(result.is_err());
    }

    #[test]
    fn test_bit_string_partial_byte() {
        let bit_string = BitString::new(vec![0xFF, 0xFF], 4).unwrap();
        assert_eq!(bit_string.unused_bits(), 4);
        assert_eq!(bit_string.content_bytes(), vec![0xF0]);
        assert_eq!(bit_string.to_string(), "1111");
    }

    #[test]
    fn test_bit_string_from_bits() {
        let bit_string = BitString::from_bits(&[true, false, true, true, false]);
        assert_eq!(bit_string.as_bytes(), &[0b1011_0000]);
        assert_eq!(bit_string.num_bits(), 5);
        assert!(bit_string.get_bit(2).unwrap());
        assert!(!bit_string.get_bit(4).unwrap());
        assert!(bit_string.get_bit(5).is_err());
    }

    #[test]
    fn test_bit_string_set_bit() {
        let mut bit_string = BitString::new(vec![0x00], 3).unwrap();
        bit_string.set_bit(1, true).unwrap();
        assert_eq!(bit_string.to_string(), "010");
        assert!(bit_string.set_bit(3, true).is_err());
    }
}
