//! Append-only output buffer shared by all encoders
//!
//! The sink reserves storage fallibly. The first failed reservation makes the
//! sink sticky-failed: every later write returns the same allocation error, so
//! an encoder can propagate with `?` and the top-level caller sees one error
//! for the whole walk.
//!
//! # Length back-patching
//!
//! Constructed BER values need their content length before the content. The
//! sink supports writing the content first:
//!
//! ```text
//! mark = reserve_patch_point()   [tag][? ? ? ? ?]
//! ... append content ...         [tag][? ? ? ? ?][content...]
//! commit_length(mark)            [tag][len][content...]
//! ```
//!
//! The placeholder is sized for the longest length encoding (5 bytes); the
//! unused part is removed by shifting the content left.

use crate::ber::BerLength;
use v2x_core::{V2xError, V2xResult};

/// Space reserved for a length: one length-of-length byte plus 4 value bytes
pub const LENGTH_PLACEHOLDER: usize = 5;

/// Position of a reserved length placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchMark(usize);

impl PatchMark {
    /// Offset of the placeholder in the sink
    pub fn offset(&self) -> usize {
        self.0
    }
}

/// Growable output buffer with a sticky failure flag
#[derive(Debug, Default)]
pub struct ByteSink {
    buffer: Vec<u8>,
    limit: Option<usize>,
    failed: bool,
}

impl ByteSink {
    /// Create an empty sink without a size budget
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty sink with preallocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Create a sink that fails once its content would exceed `limit` bytes
    ///
    /// This is the hook for allocation-constrained callers: a sink budget
    /// behaves exactly like an allocator refusing to grow the buffer.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Whether a write has failed
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Number of bytes written so far
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been written yet
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Bytes written so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the sink, returning its bytes
    ///
    /// A failed sink never hands out its partial content.
    pub fn into_bytes(self) -> V2xResult<Vec<u8>> {
        if self.failed {
            return Err(Self::failure());
        }
        Ok(self.buffer)
    }

    fn failure() -> V2xError {
        V2xError::Allocation("output buffer could not grow".to_string())
    }

    fn grow(&mut self, additional: usize) -> V2xResult<()> {
        if self.failed {
            return Err(Self::failure());
        }

        let within_limit = self
            .limit
            .is_none_or(|limit| self.buffer.len().saturating_add(additional) <= limit);
        if !within_limit || self.buffer.try_reserve(additional).is_err() {
            self.failed = true;
            return Err(Self::failure());
        }
        Ok(())
    }

    /// Append a single byte
    pub fn append_byte(&mut self, byte: u8) -> V2xResult<()> {
        self.grow(1)?;
        self.buffer.push(byte);
        Ok(())
    }

    /// Append a byte slice
    pub fn append(&mut self, bytes: &[u8]) -> V2xResult<()> {
        self.grow(bytes.len())?;
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    /// Append a UTF-8 string
    pub fn append_str(&mut self, text: &str) -> V2xResult<()> {
        self.append(text.as_bytes())
    }

    /// Append a placeholder for a length that is written later
    pub fn reserve_patch_point(&mut self) -> V2xResult<PatchMark> {
        let mark = PatchMark(self.buffer.len());
        self.append(&[0u8; LENGTH_PLACEHOLDER])?;
        Ok(mark)
    }

    /// Write the length of everything appended after `mark`'s placeholder
    ///
    /// The length is written in minimal BER form at the mark and the content
    /// is shifted left so no placeholder bytes remain.
    pub fn commit_length(&mut self, mark: PatchMark) -> V2xResult<()> {
        if self.failed {
            return Err(Self::failure());
        }

        let content_start = mark.0 + LENGTH_PLACEHOLDER;
        let Some(content_length) = self.buffer.len().checked_sub(content_start) else {
            return Err(V2xError::InvalidData(format!(
                "patch mark {} is past the end of the output",
                mark.0
            )));
        };
        if content_length > u32::MAX as usize {
            return Err(V2xError::InvalidData(format!(
                "content length {} does not fit a 4-byte BER length",
                content_length
            )));
        }

        let length = BerLength::new(content_length).encode();
        let written = length.len();
        self.buffer[mark.0..mark.0 + written].copy_from_slice(&length);
        self.buffer.copy_within(content_start.., mark.0 + written);
        self.buffer
            .truncate(self.buffer.len() - (LENGTH_PLACEHOLDER - written));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected_length(n: usize) -> Vec<u8> {
        BerLength::new(n).encode()
    }

    #[test]
    fn test_append_and_len() {
        let mut sink = ByteSink::new();
        sink.append_byte(0x30).unwrap();
        sink.append(&[1, 2, 3]).unwrap();
        assert_eq!(sink.len(), 4);
        assert_eq!(sink.as_bytes(), &[0x30, 1, 2, 3]);
    }

    #[test]
    fn test_reserve_commit_lengths() {
        for &k in &[0usize, 1, 127, 128, 70000] {
            let mut sink = ByteSink::new();
            sink.append_byte(0x30).unwrap();
            let mark = sink.reserve_patch_point().unwrap();
            assert_eq!(mark.offset(), 1);
            let content: Vec<u8> = (0..k).map(|i| (i % 251) as u8).collect();
            sink.append(&content).unwrap();
            sink.commit_length(mark).unwrap();

            let mut expected = vec![0x30];
            expected.extend(expected_length(k));
            expected.extend(&content);
            assert_eq!(sink.into_bytes().unwrap(), expected, "k = {}", k);
        }
    }

    #[test]
    fn test_nested_commit() {
        let mut sink = ByteSink::new();
        sink.append_byte(0x30).unwrap();
        let outer = sink.reserve_patch_point().unwrap();
        sink.append_byte(0x30).unwrap();
        let inner = sink.reserve_patch_point().unwrap();
        sink.append(&[0x02, 0x01, 0x05]).unwrap();
        sink.commit_length(inner).unwrap();
        sink.commit_length(outer).unwrap();
        assert_eq!(
            sink.into_bytes().unwrap(),
            vec![0x30, 0x05, 0x30, 0x03, 0x02, 0x01, 0x05]
        );
    }

    #[test]
    fn test_limit_is_sticky() {
        let mut sink = ByteSink::with_limit(4);
        sink.append(&[1, 2, 3]).unwrap();
        assert!(matches!(sink.append(&[4, 5]), Err(V2xError::Allocation(_))));
        assert!(sink.is_failed());
        // Fits the budget, but the sink already failed
        assert!(sink.append_byte(4).is_err());
        assert!(sink.into_bytes().is_err());
    }

    #[test]
    fn test_commit_invalid_mark() {
        let mut sink = ByteSink::new();
        sink.append(&[0; 3]).unwrap();
        assert!(sink.commit_length(PatchMark(2)).is_err());
    }
}
