//! Header document parsing.
//!
//! Header payloads are XML. The legacy dialect encodes typed properties as
//! attributes on a single `<properties>` element, a convention no schema can
//! check directly; `parser` streams the tokens through an event parser and a
//! manual tree builder, rewriting those attributes into explicit child
//! elements while preserving source line numbers. `resolve` walks the built
//! tree to compute the fixed byte length of the data records a dataset
//! definition describes.

pub mod error;
pub mod parser;
pub mod resolve;
pub mod tree;

pub use error::HeaderError;
pub use parser::{Dialect, parse_header};
pub use resolve::{Strictness, record_length};
pub use tree::Element;
