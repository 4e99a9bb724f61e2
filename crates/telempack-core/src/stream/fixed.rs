//! Fixed (bracketed) framing, the legacy dialect.
//!
//! Headers are framed as `[NN]LLLLLL<payload>` and data records as
//! `:NN:<payload>` with no length field at all: the record size is implied
//! by the most recent dataset header for the same id, which is why this
//! framer must parse header schemas just to keep reading.

use std::io::Read;

use crate::header::{Dialect, Strictness, parse_header, record_length};
use crate::packet::{DataHeaderPacket, HeaderPacket, Packet, PacketBody, PacketTag};

use super::context::StreamContext;
use super::error::StreamError;
use super::layout;
use super::reader::SpliceReader;

pub(super) fn next_packet<R: Read>(
    io: &mut SpliceReader<R>,
    ctx: &mut StreamContext,
    dialect: Dialect,
) -> Result<Option<Packet>, StreamError> {
    let tag = io.read_up_to(layout::TAG_PREFIX_LEN)?;
    if tag.len() < layout::TAG_PREFIX_LEN {
        // Clean end of stream; a trailing fragment is not a packet.
        return Ok(None);
    }
    let tag_offset = ctx.offset();
    ctx.advance(tag.len());

    match tag[0] {
        b'[' => next_header(io, ctx, dialect, &tag, tag_offset),
        b':' => next_data(io, ctx, &tag, tag_offset),
        other => Err(StreamError::Frame {
            offset: tag_offset,
            reason: format!("unknown packet tag byte 0x{other:02x}"),
        }),
    }
}

fn next_header<R: Read>(
    io: &mut SpliceReader<R>,
    ctx: &mut StreamContext,
    dialect: Dialect,
    tag: &[u8],
    tag_offset: u64,
) -> Result<Option<Packet>, StreamError> {
    if tag[3] != b']' {
        return Err(StreamError::Frame {
            offset: tag_offset,
            reason: format!("header tag {} does not close its bracket", printable(tag)),
        });
    }

    let marker = &tag[1..3];
    let out_of_band = marker == b"xx" || marker == b"XX";
    let id = if out_of_band {
        0
    } else {
        parse_id(marker, tag_offset)?
    };

    let digits = io.read_up_to(layout::FIXED_LENGTH_DIGITS)?;
    ctx.advance(digits.len());
    if digits.len() < layout::FIXED_LENGTH_DIGITS {
        return Err(StreamError::ShortRead {
            offset: tag_offset,
            expected: layout::FIXED_LENGTH_DIGITS,
            actual: digits.len(),
        });
    }
    let length = parse_decimal(&digits).ok_or_else(|| StreamError::Frame {
        offset: tag_offset,
        reason: format!(
            "invalid header length '{}' for packet {}",
            printable(&digits),
            printable(tag)
        ),
    })?;
    if length < 1 {
        return Err(StreamError::Frame {
            offset: tag_offset,
            reason: format!("header length {length} is too short for packet {}", printable(tag)),
        });
    }

    let payload = io.read_up_to(length)?;
    ctx.advance(payload.len());
    if payload.len() < length {
        return Err(StreamError::ShortRead {
            offset: tag_offset,
            expected: length,
            actual: payload.len(),
        });
    }
    let text = String::from_utf8(payload).map_err(|err| StreamError::Encoding {
        offset: tag_offset,
        source: err.utf8_error(),
    })?;

    if out_of_band {
        // Comment and exception packets share the reserved envelope; only
        // the payload text tells them apart.
        let tag = classify_out_of_band(&text);
        return Ok(Some(Packet {
            tag,
            id,
            length,
            body: PacketBody::Header(HeaderPacket::new(text, dialect)),
        }));
    }

    ctx.define(id);

    if id == 0 {
        return Ok(Some(Packet {
            tag: PacketTag::Sx,
            id,
            length,
            body: PacketBody::Header(HeaderPacket::new(text, dialect)),
        }));
    }

    // Dataset header. This dialect has no data length field, so the record
    // size must come from the schema; resolution is advisory here and the
    // failure, if any, surfaces at the first data packet that needs it.
    let tree = parse_header(&text, dialect)?;
    let resolved = record_length(&tree, dialect, Strictness::Advisory)?;
    ctx.set_expected_length(id, resolved);

    Ok(Some(Packet {
        tag: PacketTag::Hx,
        id,
        length,
        body: PacketBody::DataHeader(DataHeaderPacket {
            header: HeaderPacket::with_tree(text, dialect, tree),
            record_length: resolved,
        }),
    }))
}

fn next_data<R: Read>(
    io: &mut SpliceReader<R>,
    ctx: &mut StreamContext,
    tag: &[u8],
    tag_offset: u64,
) -> Result<Option<Packet>, StreamError> {
    if tag[3] != b':' {
        return Err(StreamError::Frame {
            offset: tag_offset,
            reason: format!("malformed data tag {}", printable(tag)),
        });
    }
    let id = parse_id(&tag[1..3], tag_offset)?;

    if !ctx.is_defined(id) {
        return Err(StreamError::UndefinedPacketId {
            id,
            offset: tag_offset,
        });
    }
    let expected = match ctx.expected_length(id) {
        Some(Some(bytes)) => bytes,
        _ => {
            return Err(StreamError::Frame {
                offset: tag_offset,
                reason: format!("no fixed record length known for data packet id {id:02}"),
            });
        }
    };

    let payload = io.read_up_to(expected)?;
    ctx.advance(payload.len());
    if payload.len() < expected {
        return Err(StreamError::ShortRead {
            offset: tag_offset,
            expected,
            actual: payload.len(),
        });
    }

    Ok(Some(Packet {
        tag: PacketTag::Pd,
        id,
        length: expected,
        body: PacketBody::Data(payload),
    }))
}

fn parse_id(digits: &[u8], tag_offset: u64) -> Result<u8, StreamError> {
    if digits.len() == 2 && digits.iter().all(u8::is_ascii_digit) {
        Ok((digits[0] - b'0') * 10 + (digits[1] - b'0'))
    } else {
        Err(StreamError::Frame {
            offset: tag_offset,
            reason: format!("invalid packet id '{}'", printable(digits)),
        })
    }
}

fn parse_decimal(digits: &[u8]) -> Option<usize> {
    let text = std::str::from_utf8(digits).ok()?;
    if text.bytes().all(|b| b.is_ascii_digit()) {
        text.parse().ok()
    } else {
        None
    }
}

fn classify_out_of_band(text: &str) -> PacketTag {
    if text.starts_with("<exception") {
        PacketTag::Ex
    } else if text.starts_with("<comment") {
        PacketTag::Cx
    } else if text.find("comment").is_some_and(|i| i > 1) {
        PacketTag::Cx
    } else if text.find("except").is_some_and(|i| i > 1) {
        PacketTag::Ex
    } else {
        PacketTag::Cx
    }
}

fn printable(bytes: &[u8]) -> String {
    bytes
        .iter()
        .flat_map(|&b| std::ascii::escape_default(b))
        .map(char::from)
        .collect()
}
