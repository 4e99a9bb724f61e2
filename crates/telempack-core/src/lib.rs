//! Core library for reading packetized scientific telemetry streams.
//!
//! This crate implements the stream-reading pipeline used by the CLI: the
//! sniffer classifies an input from its first bytes, the packet reader
//! frames it with one of two dialect-specific algorithms, and the header
//! modules normalize legacy header documents and resolve the implicit data
//! record lengths the legacy wire format omits. Payload semantics (units,
//! time systems, numeric content) are left to consumers; the core stops at
//! packet boundaries and header well-formedness.
//!
//! Invariants:
//! - Sniffed content kind, version, tag style and namespace usage are
//!   immutable for the stream's lifetime.
//! - Packet ids stay in 0..=99; a legacy data packet's id must have been
//!   defined by a prior header.
//! - Framing errors are terminal: there is no resynchronization point once
//!   framing is lost.
//!
//! # Examples
//! ```
//! use telempack_core::{PacketReader, PacketTag};
//!
//! let stream = b"[00]000031<stream version=\"2.2\"></stream>";
//! let mut reader = PacketReader::open(&stream[..])?;
//! let packet = reader.next_packet()?.expect("stream header");
//! assert_eq!(packet.tag, PacketTag::Sx);
//! assert!(reader.next_packet()?.is_none());
//! # Ok::<(), telempack_core::StreamError>(())
//! ```

pub mod header;
pub mod packet;
pub mod sniff;
pub mod stream;

pub use header::{Dialect, Element, HeaderError, Strictness, parse_header, record_length};
pub use packet::{DataHeaderPacket, HeaderPacket, Packet, PacketBody, PacketTag};
pub use sniff::{ContentKind, DetectError, SNIFF_WINDOW, StreamInfo, TagStyle, sniff};
pub use stream::{PacketReader, StreamContext, StreamError};
