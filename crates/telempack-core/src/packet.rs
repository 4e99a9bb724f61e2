//! Typed packets produced by the stream reader.

use std::fmt;

use crate::header::{Dialect, Element, HeaderError, parse_header};

/// Two-character content tag of a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketTag {
    /// Stream definition header (XML).
    Sx,
    /// Dataset definition header (XML).
    Hx,
    /// Data record, content defined by a prior header.
    Pd,
    /// Comment packet (XML).
    Cx,
    /// Exception packet (XML).
    Ex,
    /// Extra packet, content completely unknown.
    Xx,
}

impl PacketTag {
    /// Wire form of the tag.
    pub fn as_str(self) -> &'static str {
        match self {
            PacketTag::Sx => "Sx",
            PacketTag::Hx => "Hx",
            PacketTag::Pd => "Pd",
            PacketTag::Cx => "Cx",
            PacketTag::Ex => "Ex",
            PacketTag::Xx => "XX",
        }
    }

    /// Parse a tag field from a variable-style packet envelope.
    pub fn from_wire(field: &str) -> Option<Self> {
        match field {
            "Sx" => Some(PacketTag::Sx),
            "Hx" => Some(PacketTag::Hx),
            "Pd" => Some(PacketTag::Pd),
            "Cx" => Some(PacketTag::Cx),
            "Ex" => Some(PacketTag::Ex),
            "XX" => Some(PacketTag::Xx),
            _ => None,
        }
    }

    /// Header-class tags carry UTF-8 text; `Pd` and `XX` carry raw bytes.
    pub fn is_header_class(self) -> bool {
        !matches!(self, PacketTag::Pd | PacketTag::Xx)
    }
}

impl fmt::Display for PacketTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One length-delimited unit of a packetized stream. Immutable once
/// produced, except for the lazily built header tree cache.
#[derive(Debug)]
pub struct Packet {
    pub tag: PacketTag,
    /// Packet id, always in `0..=99`.
    pub id: u8,
    /// Payload length in bytes, before any text decoding.
    pub length: usize,
    pub body: PacketBody,
}

/// Payload-kind-specific part of a packet.
#[derive(Debug)]
pub enum PacketBody {
    /// Stream header, comment, or exception: decoded text.
    Header(HeaderPacket),
    /// Dataset definition header with its resolved record length.
    DataHeader(DataHeaderPacket),
    /// Data record: raw bytes.
    Data(Vec<u8>),
    /// Unknown content: raw bytes.
    Unknown(Vec<u8>),
}

impl Packet {
    /// Header view of this packet, for either header body kind.
    pub fn header(&self) -> Option<&HeaderPacket> {
        match &self.body {
            PacketBody::Header(header) => Some(header),
            PacketBody::DataHeader(data_header) => Some(&data_header.header),
            _ => None,
        }
    }

    pub fn header_mut(&mut self) -> Option<&mut HeaderPacket> {
        match &mut self.body {
            PacketBody::Header(header) => Some(header),
            PacketBody::DataHeader(data_header) => Some(&mut data_header.header),
            _ => None,
        }
    }

    /// Raw payload bytes, for the non-header body kinds.
    pub fn payload(&self) -> Option<&[u8]> {
        match &self.body {
            PacketBody::Data(bytes) | PacketBody::Unknown(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// A header packet: decoded text plus a document tree built on first access
/// and cached for the packet's lifetime.
#[derive(Debug)]
pub struct HeaderPacket {
    pub text: String,
    dialect: Dialect,
    tree: Option<Element>,
}

impl HeaderPacket {
    pub fn new(text: String, dialect: Dialect) -> Self {
        Self {
            text,
            dialect,
            tree: None,
        }
    }

    /// Construct with an eagerly built tree; the framer uses this when it
    /// already had to parse the payload to size later data records.
    pub fn with_tree(text: String, dialect: Dialect, tree: Element) -> Self {
        Self {
            text,
            dialect,
            tree: Some(tree),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Document tree for this header, built on first call. For a legacy
    /// header the tree is the normalized form, with the properties
    /// attributes rewritten into `<p>` children.
    pub fn tree(&mut self) -> Result<&Element, HeaderError> {
        if self.tree.is_none() {
            self.tree = Some(parse_header(&self.text, self.dialect)?);
        }
        Ok(self.tree.as_ref().expect("tree cached above"))
    }

    /// The cached tree, if one has been built.
    pub fn cached_tree(&self) -> Option<&Element> {
        self.tree.as_ref()
    }
}

/// A dataset definition header plus the record length it resolves to.
#[derive(Debug)]
pub struct DataHeaderPacket {
    pub header: HeaderPacket,
    /// Fixed byte length of following data records; `None` when the
    /// definition declares a variable-length dimension (or could not be
    /// sized under advisory resolution).
    pub record_length: Option<usize>,
}
