//! Packet framing.
//!
//! `PacketReader` pulls bytes from a source and yields typed packets. The
//! framing algorithm is selected once, at construction, from the sniffed tag
//! style, and never changes for the stream's lifetime. The reader is
//! single-threaded and pull-based: each call either returns the next packet
//! or signals end of stream, and any framing error is terminal.

pub mod context;
pub mod error;
pub mod fixed;
pub mod layout;
pub mod reader;
pub mod variable;

use std::io::Read;

use crate::header::Dialect;
use crate::packet::Packet;
use crate::sniff::{DetectError, StreamInfo, TagStyle, sniff};

pub use context::StreamContext;
pub use error::StreamError;
pub use reader::SpliceReader;

use reader::read_sniff_window;

/// Pull-based packet reader over an arbitrary byte source.
#[derive(Debug)]
pub struct PacketReader<R> {
    io: SpliceReader<R>,
    ctx: StreamContext,
    dialect: Dialect,
}

impl<R: Read> PacketReader<R> {
    /// Sniff the source and set up framing.
    ///
    /// The detection window is buffered and spliced ahead of further reads,
    /// so nothing is lost. Standalone documents, unversioned query streams,
    /// and fixed tags in a current-generation stream are all rejected here
    /// rather than on the first packet.
    pub fn open(mut src: R) -> Result<Self, StreamError> {
        let head = read_sniff_window(&mut src)?;
        let info = sniff(&head)?;

        let version = match &info.version {
            Some(version) => version.clone(),
            None => {
                return Err(DetectError::Unsupported(
                    "unversioned query-stream content".to_string(),
                )
                .into());
            }
        };
        let dialect = Dialect::from_version(&version);
        match info.tag_style {
            TagStyle::None => {
                return Err(DetectError::Unsupported(
                    "standalone XML documents are not packetized".to_string(),
                )
                .into());
            }
            TagStyle::Fixed if dialect != Dialect::Legacy => {
                return Err(DetectError::Unsupported(format!(
                    "fixed packet tags in a version {version} stream"
                ))
                .into());
            }
            _ => {}
        }

        Ok(Self {
            io: SpliceReader::new(head, src),
            ctx: StreamContext::new(info),
            dialect,
        })
    }

    /// Facts established at open.
    pub fn stream_info(&self) -> &StreamInfo {
        self.ctx.info()
    }

    /// Byte offset of the next unread position.
    pub fn offset(&self) -> u64 {
        self.ctx.offset()
    }

    /// Pull the next packet, or `Ok(None)` at end of stream.
    pub fn next_packet(&mut self) -> Result<Option<Packet>, StreamError> {
        match self.ctx.info().tag_style {
            TagStyle::Fixed => fixed::next_packet(&mut self.io, &mut self.ctx, self.dialect),
            TagStyle::Variable => variable::next_packet(&mut self.io, &mut self.ctx, self.dialect),
            // Rejected at open; nothing to frame.
            TagStyle::None => Ok(None),
        }
    }

    /// Iterator adapter over `next_packet`.
    pub fn packets(&mut self) -> Packets<'_, R> {
        Packets {
            reader: self,
            failed: false,
        }
    }
}

/// Iterator over the packets of a reader. Framing errors are terminal: the
/// iterator yields the error once and then ends.
pub struct Packets<'a, R> {
    reader: &'a mut PacketReader<R>,
    failed: bool,
}

impl<R: Read> Iterator for Packets<'_, R> {
    type Item = Result<Packet, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.reader.next_packet().transpose() {
            Some(Err(err)) => {
                self.failed = true;
                Some(Err(err))
            }
            other => other,
        }
    }
}
