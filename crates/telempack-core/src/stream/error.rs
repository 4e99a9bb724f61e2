use thiserror::Error;

use crate::header::HeaderError;
use crate::sniff::DetectError;

/// Errors raised while framing packets. All of them are terminal for the
/// stream: once framing is lost there is no reliable resynchronization
/// point, so the reader surfaces the error instead of attempting recovery.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Detect(#[from] DetectError),
    #[error("bad packet framing at offset {offset}: {reason}")]
    Frame { offset: u64, reason: String },
    #[error("premature end of packet at offset {offset}: expected {expected} bytes, got {actual}")]
    ShortRead {
        offset: u64,
        expected: usize,
        actual: usize,
    },
    #[error("packet at offset {offset} is not valid UTF-8 text: {source}")]
    Encoding {
        offset: u64,
        #[source]
        source: std::str::Utf8Error,
    },
    #[error("undefined data packet id {id:02} at offset {offset}")]
    UndefinedPacketId { id: u8, offset: u64 },
    #[error(
        "short data packet for id {id}: expected at least {expected} bytes, declared {declared}, at offset {offset}"
    )]
    LengthMismatch {
        id: u8,
        expected: usize,
        declared: usize,
        offset: u64,
    },
    #[error(transparent)]
    Header(#[from] HeaderError),
}
