//! Stream type detection.
//!
//! The sniffer classifies an input's content kind, protocol version, tag
//! style and namespace usage from its first bytes, before any packet is
//! framed. Detection is pure pattern matching over a bounded window; the
//! facts it establishes are immutable for the stream's lifetime.

pub mod error;
pub mod layout;
pub mod parser;

pub use error::DetectError;
pub use layout::SNIFF_WINDOW;
pub use parser::{ContentKind, StreamInfo, TagStyle, sniff};
