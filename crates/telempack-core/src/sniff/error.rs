use thiserror::Error;

/// Errors raised while classifying the leading bytes of an input.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("{len} bytes are not enough to detect the stream type")]
    TooShort { len: usize },
    #[error("content is not a packetized stream and the XML document prolog is missing")]
    MissingProlog,
    #[error("no <stream> element found in the first {len} bytes")]
    MissingStreamElement { len: usize },
    #[error("unsupported content: {0}")]
    Unsupported(String),
}
