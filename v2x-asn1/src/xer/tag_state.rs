//! Deferred start tags
//!
//! A start tag is held back until the element gets content or a child
//! element; an element closed while its tag is still pending becomes
//! `<name/>`. Only the innermost open tag can be pending, so one name is
//! buffered and never any content.
//!
//! | state | `start_tag(n)` | `start_content` | `end_tag(n)` |
//! |-------|----------------|-----------------|--------------|
//! | `NoPendingTag` | -> `PendingTag(n)` | content emitted | `</n>` |
//! | `PendingTag(p)` | write `<p>`, -> `PendingTag(n)` | write `<p>`, -> `NoPendingTag` | `<p/>`, -> `NoPendingTag` |

use v2x_core::V2xResult;

use crate::sink::ByteSink;
use crate::text;

/// Whether a start tag is waiting to be written
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TagState {
    /// Every start tag has been written
    #[default]
    NoPendingTag,
    /// Start tag of the innermost element, not yet written
    PendingTag(String),
}

/// Element writer driving [`TagState`]
#[derive(Debug)]
pub struct TagWriter {
    sink: ByteSink,
    state: TagState,
    /// Text was written since the innermost start tag
    content_emitted: bool,
    depth: usize,
    indent: bool,
    empty_tags: bool,
}

impl TagWriter {
    /// Writer appending to `sink`
    ///
    /// # Arguments
    ///
    /// * `sink` - Output buffer
    /// * `indent` - Put child elements on their own indented lines
    /// * `empty_tags` - Close elements without content as `<name/>`
    pub fn new(sink: ByteSink, indent: bool, empty_tags: bool) -> Self {
        Self {
            sink,
            state: TagState::NoPendingTag,
            content_emitted: false,
            depth: 0,
            indent,
            empty_tags,
        }
    }

    /// Current pending-tag state
    pub fn state(&self) -> &TagState {
        &self.state
    }

    /// Number of open elements
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Document written so far
    ///
    /// # Errors
    ///
    /// Fails if any write failed or the output is not UTF-8.
    pub fn into_string(self) -> V2xResult<String> {
        text::into_string(self.sink)
    }

    fn write(&mut self, text: &str) -> V2xResult<()> {
        self.sink.append_str(text)
    }

    fn newline(&mut self, depth: usize) -> V2xResult<()> {
        self.write("\n")?;
        for _ in 0..depth {
            self.write("  ")?;
        }
        Ok(())
    }

    fn flush_pending(&mut self) -> V2xResult<()> {
        if let TagState::PendingTag(name) = std::mem::take(&mut self.state) {
            self.write("<")?;
            self.write(&name)?;
            self.write(">")?;
        }
        Ok(())
    }

    /// Open element `name`
    pub fn start_tag(&mut self, name: &str) -> V2xResult<()> {
        self.flush_pending()?;
        if self.indent && !self.sink.is_empty() {
            self.newline(self.depth)?;
        }
        self.state = TagState::PendingTag(name.to_string());
        self.content_emitted = false;
        self.depth += 1;
        Ok(())
    }

    /// Announce text content for the innermost element
    pub fn start_content(&mut self) -> V2xResult<()> {
        self.flush_pending()?;
        self.content_emitted = true;
        Ok(())
    }

    /// Write markup or escaped text after [`start_content`](Self::start_content)
    pub fn write_content(&mut self, text: &str) -> V2xResult<()> {
        self.write(text)
    }

    /// Close element `name`
    pub fn end_tag(&mut self, name: &str) -> V2xResult<()> {
        self.depth = self.depth.saturating_sub(1);
        match std::mem::take(&mut self.state) {
            TagState::PendingTag(pending) if self.empty_tags => {
                self.write("<")?;
                self.write(&pending)?;
                self.write("/>")?;
            }
            TagState::PendingTag(pending) => {
                self.write(&format!("<{}></{}>", pending, pending))?;
            }
            TagState::NoPendingTag => {
                if !self.content_emitted && self.indent {
                    self.newline(self.depth)?;
                }
                self.write("</")?;
                self.write(name)?;
                self.write(">")?;
            }
        }
        self.content_emitted = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer(indent: bool, empty_tags: bool) -> TagWriter {
        TagWriter::new(ByteSink::new(), indent, empty_tags)
    }

    #[test]
    fn test_empty_element() {
        let mut w = writer(false, true);
        w.start_tag("a").unwrap();
        assert_eq!(w.state(), &TagState::PendingTag("a".to_string()));
        w.end_tag("a").unwrap();
        assert_eq!(w.state(), &TagState::NoPendingTag);
        assert_eq!(w.into_string().unwrap(), "<a/>");

        let mut w = writer(false, false);
        w.start_tag("a").unwrap();
        w.end_tag("a").unwrap();
        assert_eq!(w.into_string().unwrap(), "<a></a>");
    }

    #[test]
    fn test_content_flushes_pending() {
        let mut w = writer(true, true);
        w.start_tag("a").unwrap();
        w.start_content().unwrap();
        assert_eq!(w.state(), &TagState::NoPendingTag);
        w.write_content("5").unwrap();
        w.end_tag("a").unwrap();
        assert_eq!(w.into_string().unwrap(), "<a>5</a>");
    }

    #[test]
    fn test_nested_indentation() {
        let mut w = writer(true, true);
        w.start_tag("outer").unwrap();
        w.start_tag("x").unwrap();
        w.start_content().unwrap();
        w.write_content("1").unwrap();
        w.end_tag("x").unwrap();
        w.start_tag("y").unwrap();
        w.end_tag("y").unwrap();
        w.end_tag("outer").unwrap();
        assert_eq!(w.depth(), 0);
        assert_eq!(
            w.into_string().unwrap(),
            "<outer>\n  <x>1</x>\n  <y/>\n</outer>"
        );
    }
}
