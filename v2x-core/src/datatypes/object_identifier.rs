//! OBJECT IDENTIFIER / RELATIVE-OID value type
//!
//! The value is kept as its BER content octets: a sequence of sub-identifiers,
//! each encoded in base-128 with the high bit set on every byte except the last.
//! For an absolute OID the first sub-identifier packs the first two arcs as
//! `40 * X + Y`.

use crate::error::{V2xError, V2xResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectIdentifier {
    content: Vec<u8>,
}

impl ObjectIdentifier {
    /// Wrap already encoded content octets
    pub fn from_content(content: Vec<u8>) -> Self {
        Self { content }
    }

    /// Build an absolute OID from its arcs (e.g. `[1, 0, 17, 0, 0, 128, 0, 1]`)
    ///
    /// # Errors
    /// Fails with fewer than two arcs, a first arc above 2, or a second arc
    /// of 40 or more under the first two roots.
    pub fn from_arcs(arcs: &[u64]) -> V2xResult<Self> {
        if arcs.len() < 2 {
            return Err(V2xError::InvalidData(
                "Object identifier must have at least 2 components".to_string(),
            ));
        }
        if arcs[0] > 2 || (arcs[0] < 2 && arcs[1] >= 40) {
            return Err(V2xError::InvalidData(format!(
                "Invalid leading arcs {}.{}",
                arcs[0], arcs[1]
            )));
        }

        let first = (arcs[0] * 40)
            .checked_add(arcs[1])
            .ok_or_else(|| V2xError::InvalidData("OID component too large".to_string()))?;

        let mut content = Vec::new();
        push_sub_identifier(&mut content, first);
        for &arc in &arcs[2..] {
            push_sub_identifier(&mut content, arc);
        }
        Ok(Self { content })
    }

    /// Build a RELATIVE-OID from its arcs
    pub fn relative_from_arcs(arcs: &[u64]) -> Self {
        let mut content = Vec::new();
        for &arc in arcs {
            push_sub_identifier(&mut content, arc);
        }
        Self { content }
    }

    /// Encoded content octets
    pub fn as_bytes(&self) -> &[u8] {
        &self.content
    }

    /// Decode the base-128 sub-identifiers
    ///
    /// # Errors
    /// Fails when the last byte still has its continuation bit set or a
    /// sub-identifier does not fit in 64 bits.
    pub fn sub_identifiers(&self) -> V2xResult<Vec<u64>> {
        let mut result = Vec::new();
        let mut current = 0u64;
        let mut pending = false;

        for &byte in &self.content {
            if current > (u64::MAX >> 7) {
                return Err(V2xError::InvalidData(
                    "OID sub-identifier exceeds 64 bits".to_string(),
                ));
            }
            current = (current << 7) | u64::from(byte & 0x7F);
            pending = byte & 0x80 != 0;
            if !pending {
                result.push(current);
                current = 0;
            }
        }

        if pending {
            return Err(V2xError::InvalidData(
                "Incomplete OID sub-identifier".to_string(),
            ));
        }
        Ok(result)
    }

    /// Arcs of an absolute OID, with the first sub-identifier split in two
    pub fn arcs(&self) -> V2xResult<Vec<u64>> {
        let subs = self.sub_identifiers()?;
        let Some((&first, rest)) = subs.split_first() else {
            return Ok(Vec::new());
        };

        // X.690 8.19.4: everything from 80 up belongs to arc 2, so 120 is 2.40
        let (x, y) = match first {
            0..=39 => (0, first),
            40..=79 => (1, first - 40),
            _ => (2, first - 80),
        };
        let mut arcs = Vec::with_capacity(subs.len() + 1);
        arcs.push(x);
        arcs.push(y);
        arcs.extend_from_slice(rest);
        Ok(arcs)
    }

    /// Dotted-decimal rendering (`1.2.840.113549`)
    ///
    /// `relative` selects RELATIVE-OID semantics (no first-arc split).
    pub fn to_dotted(&self, relative: bool) -> V2xResult<String> {
        let arcs = if relative {
            self.sub_identifiers()?
        } else {
            self.arcs()?
        };
        Ok(arcs
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join("."))
    }
}

fn push_sub_identifier(out: &mut Vec<u8>, value: u64) {
    let mut groups = Vec::new();
    let mut remaining = value;
    loop {
        groups.push((remaining & 0x7F) as u8);
        remaining >>= 7;
        if remaining == 0 {
            break;
        }
    }

    // Most significant group first, continuation bit on all but the last
    let last = groups.len() - 1;
    for (i, &group) in groups.iter().rev().enumerate() {
        out.push(if i < last { group | 0x80 } else { group });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oid_from_arcs() {
        let oid = ObjectIdentifier::from_arcs(&[1, 2, 840, 113549]).unwrap();
        assert_eq!(oid.as_bytes(), &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D]);
        assert_eq!(oid.arcs().unwrap(), vec![1, 2, 840, 113549]);
        assert_eq!(oid.to_dotted(false).unwrap(), "1.2.840.113549");
    }

    #[test]
    fn test_oid_joint_iso_itu_first_arc() {
        let oid = ObjectIdentifier::from_arcs(&[2, 100, 3]).unwrap();
        assert_eq!(oid.as_bytes(), &[0x81, 0x34, 0x03]);
        assert_eq!(oid.to_dotted(false).unwrap(), "2.100.3");
    }

    #[test]
    fn test_first_arc_split_joint_iso() {
        let dotted = |first: u8| {
            ObjectIdentifier::from_content(vec![first, 0x05])
                .to_dotted(false)
                .unwrap()
        };
        assert_eq!(dotted(0x4F), "1.39.5");
        assert_eq!(dotted(0x50), "2.0.5");
        assert_eq!(dotted(0x78), "2.40.5");
        assert_eq!(dotted(0x7F), "2.47.5");
    }

    #[test]
    fn test_oid_invalid_arcs() {
        assert!(ObjectIdentifier::from_arcs(&[1]).is_err());
        assert!(ObjectIdentifier::from_arcs(&[3, 1]).is_err());
        assert!(ObjectIdentifier::from_arcs(&[1, 40]).is_err());
    }

    #[test]
    fn test_relative_oid() {
        let oid = ObjectIdentifier::relative_from_arcs(&[8571, 3, 2]);
        assert_eq!(oid.as_bytes(), &[0xC2, 0x7B, 0x03, 0x02]);
        assert_eq!(oid.to_dotted(true).unwrap(), "8571.3.2");
    }

    #[test]
    fn test_oid_truncated_content() {
        let oid = ObjectIdentifier::from_content(vec![0x2A, 0x86]);
        assert!(oid.sub_identifiers().is_err());
    }
}
