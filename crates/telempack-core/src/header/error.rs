use thiserror::Error;

/// Errors raised while parsing a header document or resolving the record
/// length it declares. Every variant carries the 1-based source line inside
/// the header payload, so consumers can point at the offending text.
#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("XML error at line {line}: {message}")]
    Xml { line: u32, message: String },
    #[error("reserved element '{name}' at line {line}")]
    ReservedElement { name: String, line: u32 },
    #[error("malformed properties attribute '{key}' at line {line}")]
    MalformedProperty { key: String, line: u32 },
    #[error("missing '{attr}' attribute on <{element}> at line {line}")]
    MissingAttribute {
        element: String,
        attr: &'static str,
        line: u32,
    },
    #[error("invalid '{attr}' value '{value}' on <{element}> at line {line}")]
    InvalidAttribute {
        element: String,
        attr: &'static str,
        value: String,
        line: u32,
    },
}

impl HeaderError {
    /// Source line the error refers to, 1-based within the header payload.
    pub fn line(&self) -> u32 {
        match self {
            HeaderError::Xml { line, .. }
            | HeaderError::ReservedElement { line, .. }
            | HeaderError::MalformedProperty { line, .. }
            | HeaderError::MissingAttribute { line, .. }
            | HeaderError::InvalidAttribute { line, .. } => *line,
        }
    }
}
