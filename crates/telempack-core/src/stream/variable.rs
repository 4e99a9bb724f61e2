//! Variable (pipe-delimited) framing, the current dialect.
//!
//! Every packet self-declares its length in a `|TAG|ID|LEN|` envelope, so
//! dataset headers are parsed here only to pre-compute an advisory minimum
//! record size used to validate, never to frame, later data packets.

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
    let first = io.read_up_to(layout::TAG_PREFIX_LEN)?;
    if first.len() < layout::TAG_PREFIX_LEN {
        return Ok(None);
    }
    let tag_offset = ctx.offset();
    ctx.advance(first.len());

    if first[0] != b'|' {
        return Err(StreamError::Frame {
            offset: tag_offset,
            reason: format!("unknown packet tag byte 0x{:02x}", first[0]),
        });
    }

    // Accumulate the envelope until the fourth pipe, within a sanity limit.
    let mut raw = first;
    let mut pipes = raw.iter().filter(|&&b| b == b'|').count();
    while pipes < layout::VARIABLE_TAG_PIPES {
        let byte = io.read_up_to(1)?;
        if byte.is_empty() {
            return Err(StreamError::Frame {
                offset: tag_offset,
                reason: "unterminated packet tag at end of input".to_string(),
            });
        }
        ctx.advance(1);
        raw.push(byte[0]);
        if byte[0] == b'|' {
            pipes += 1;
        }
        if raw.len() > layout::TAG_SANITY_LIMIT {
            return Err(StreamError::Frame {
                offset: tag_offset,
                reason: format!(
                    "sanity limit of {} bytes exceeded for packet tag",
                    layout::TAG_SANITY_LIMIT
                ),
            });
        }
    }

    let envelope = std::str::from_utf8(&raw).map_err(|err| StreamError::Encoding {
        offset: tag_offset,
        source: err,
    })?;
    let mut fields = envelope.split('|');
    let _leading = fields.next();
    let tag_field = fields.next().unwrap_or("");
    let id_field = fields.next().unwrap_or("").trim();
    let len_field = fields.next().unwrap_or("").trim();

    let tag = PacketTag::from_wire(tag_field).ok_or_else(|| StreamError::Frame {
        offset: tag_offset,
        reason: format!("invalid packet tag '{tag_field}'"),
    })?;

    let id: u8 = if id_field.is_empty() {
        // An empty id field is the same as id 0.
        0
    } else {
        match id_field.parse::<u32>() {
            Ok(value) if value <= layout::MAX_PACKET_ID as u32 => value as u8,
            Ok(value) => {
                return Err(StreamError::Frame {
                    offset: tag_offset,
                    reason: format!(
                        "packet id {value} is outside 0-{}",
                        layout::MAX_PACKET_ID
                    ),
                });
            }
            Err(_) => {
                return Err(StreamError::Frame {
                    offset: tag_offset,
                    reason: format!("invalid packet id '{id_field}'"),
                });
            }
        }
    };

    let length: usize = len_field.parse().map_err(|_| StreamError::Frame {
        offset: tag_offset,
        reason: format!("invalid length '{len_field}' in packet tag"),
    })?;
    if length < layout::MIN_VARIABLE_LENGTH {
        return Err(StreamError::Frame {
            offset: tag_offset,
            reason: format!("invalid packet length {length} bytes"),
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

    match tag {
        PacketTag::Pd => {
            // Declared length below the schema minimum is a stream defect;
            // equal or longer is fine (variable trailing dimensions).
            if let Some(Some(minimum)) = ctx.expected_length(id) {
                if length < minimum {
                    return Err(StreamError::LengthMismatch {
                        id,
                        expected: minimum,
                        declared: length,
                        offset: tag_offset,
                    });
                }
            }
            Ok(Some(Packet {
                tag,
                id,
                length,
                body: PacketBody::Data(payload),
            }))
        }
        PacketTag::Xx => Ok(Some(Packet {
            tag,
            id,
            length,
            body: PacketBody::Unknown(payload),
        })),
        _ => {
            let text = String::from_utf8(payload).map_err(|err| StreamError::Encoding {
                offset: tag_offset,
                source: err.utf8_error(),
            })?;
            if tag == PacketTag::Hx {
                let tree = parse_header(&text, dialect)?;
                let resolved = record_length(&tree, dialect, Strictness::Advisory)?;
                ctx.set_expected_length(id, resolved);
                Ok(Some(Packet {
                    tag,
                    id,
                    length,
                    body: PacketBody::DataHeader(DataHeaderPacket {
                        header: HeaderPacket::with_tree(text, dialect, tree),
                        record_length: resolved,
                    }),
                }))
            } else {
                Ok(Some(Packet {
                    tag,
                    id,
                    length,
                    body: PacketBody::Header(HeaderPacket::new(text, dialect)),
                }))
            }
        }
    }
}
