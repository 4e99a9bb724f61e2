/// Number of leading bytes examined during detection. A stream header may
/// carry many schema and namespace references, so the window is generous.
pub const SNIFF_WINDOW: usize = 65536;

/// Minimum number of leading bytes required before detection is attempted.
pub const MIN_SNIFF_BYTES: usize = 8;

/// Leading bytes of a variable-tag (pipe-delimited) stream.
pub const VARIABLE_MAGIC: &[u8; 4] = b"|Sx|";

/// Leading bytes of a fixed-tag (bracketed) stream.
pub const FIXED_MAGIC: &[u8; 4] = b"[00]";

/// XML document prolog, required when the input is not packetized.
pub const XML_PROLOG: &[u8] = b"<?xml";

/// Token identifying the older unversioned query-stream flavor.
pub const UNVERSIONED_TOKEN: &[u8] = b"dataset_id";

/// Version assumed when a stream header carries no version attribute.
pub const DEFAULT_VERSION: &str = "2.2";
