use super::layout::ID_SLOTS;
use crate::sniff::StreamInfo;

/// Per-stream framing state: the sniffed facts, the per-id definition and
/// expected-length tables, and the running byte offset. Created at stream
/// open, mutated packet by packet by the single reading thread, discarded at
/// end of stream.
#[derive(Debug)]
pub struct StreamContext {
    info: StreamInfo,
    defined: [bool; ID_SLOTS],
    /// Outer `None`: no header has resolved this id yet. Inner `None`: the
    /// latest header resolved to an indeterminate record length. The value
    /// holds until a new header for the same id is seen.
    expected: [Option<Option<usize>>; ID_SLOTS],
    offset: u64,
}

impl StreamContext {
    pub fn new(info: StreamInfo) -> Self {
        Self {
            info,
            defined: [false; ID_SLOTS],
            expected: [None; ID_SLOTS],
            offset: 0,
        }
    }

    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    /// Byte offset of the next unread byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn advance(&mut self, bytes: usize) {
        self.offset += bytes as u64;
    }

    /// Mark an id as defined by a header packet.
    pub fn define(&mut self, id: u8) {
        self.defined[id as usize] = true;
    }

    /// Record the record length a dataset header resolved for its id
    /// (`None` = indeterminate). Also marks the id defined.
    pub fn set_expected_length(&mut self, id: u8, length: Option<usize>) {
        self.defined[id as usize] = true;
        self.expected[id as usize] = Some(length);
    }

    pub fn is_defined(&self, id: u8) -> bool {
        self.defined[id as usize]
    }

    /// Expected record length for an id: `None` until a header resolves it,
    /// `Some(None)` when the latest header resolved to indeterminate.
    pub fn expected_length(&self, id: u8) -> Option<Option<usize>> {
        self.expected[id as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::StreamContext;
    use crate::sniff::{ContentKind, StreamInfo, TagStyle};

    fn info() -> StreamInfo {
        StreamInfo {
            content: ContentKind::Stream,
            version: Some("2.2".to_string()),
            tag_style: TagStyle::Fixed,
            namespaces: false,
        }
    }

    #[test]
    fn tracks_offset_and_definitions() {
        let mut ctx = StreamContext::new(info());
        assert_eq!(ctx.offset(), 0);
        ctx.advance(10);
        assert_eq!(ctx.offset(), 10);

        assert!(!ctx.is_defined(1));
        assert_eq!(ctx.expected_length(1), None);
        ctx.set_expected_length(1, Some(28));
        assert!(ctx.is_defined(1));
        assert_eq!(ctx.expected_length(1), Some(Some(28)));
    }

    #[test]
    fn a_new_header_replaces_the_cached_length() {
        let mut ctx = StreamContext::new(info());
        ctx.set_expected_length(7, Some(28));
        ctx.set_expected_length(7, None);
        assert_eq!(ctx.expected_length(7), Some(None));
    }

    #[test]
    fn define_without_length_leaves_cache_empty() {
        let mut ctx = StreamContext::new(info());
        ctx.define(0);
        assert!(ctx.is_defined(0));
        assert_eq!(ctx.expected_length(0), None);
    }
}
