/// Fixed-style tags and the data-tag prefix are exactly 4 bytes.
pub const TAG_PREFIX_LEN: usize = 4;

/// ASCII decimal digits in a fixed-style header length field.
pub const FIXED_LENGTH_DIGITS: usize = 6;

/// A variable-style envelope is complete after this many pipe characters.
pub const VARIABLE_TAG_PIPES: usize = 4;

/// Sanity limit on an accumulated variable-style envelope.
pub const TAG_SANITY_LIMIT: usize = 38;

/// Smallest declared payload length a variable-style packet may carry.
pub const MIN_VARIABLE_LENGTH: usize = 2;

/// Largest valid packet id; ids occupy two decimal digits on the wire.
pub const MAX_PACKET_ID: u8 = 99;

/// Slots in the per-id definition and expected-length tables.
pub const ID_SLOTS: usize = MAX_PACKET_ID as usize + 1;
