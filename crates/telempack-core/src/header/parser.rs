use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::error::HeaderError;
use super::tree::Element;

/// Which wire dialect a header payload was written for. Selects the header
/// parsing mode and the record-length algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Protocol generations before 3: fixed tags, attribute-encoded
    /// properties, implicit data record lengths.
    Legacy,
    /// Generation 3 and later: pipe-delimited tags, self-declared lengths.
    Current,
}

impl Dialect {
    /// Derive the dialect from a stream's declared version string.
    pub fn from_version(version: &str) -> Self {
        let major = version
            .trim()
            .split('.')
            .next()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(2);
        if major >= 3 {
            Dialect::Current
        } else {
            Dialect::Legacy
        }
    }
}

/// Parse a header payload into an element tree.
///
/// For [`Dialect::Legacy`] the single `<properties>` element's
/// `Type:Name="value"` attributes are rewritten into explicit `<p>` child
/// elements carrying `name` and (unless the type is the implicit default
/// `String`) `type` attributes, with the attribute value as trimmed text
/// content. That form is what an external schema checker can validate.
/// Everything else passes through unaltered, and every element keeps the
/// source line of its opening tag.
///
/// # Errors
/// Malformed XML, a literal `p` element in legacy input (the name is
/// reserved for rewritten output), or a malformed `Type:Name` attribute key
/// are all hard errors.
pub fn parse_header(text: &str, dialect: Dialect) -> Result<Element, HeaderError> {
    let mut reader = Reader::from_str(text);
    let mut builder = TreeBuilder::default();
    let mut line: u32 = 1;
    let mut consumed: usize = 0;

    loop {
        let event = reader.read_event().map_err(|err| HeaderError::Xml {
            line,
            message: err.to_string(),
        })?;
        match event {
            Event::Start(el) => start_element(&mut builder, &el, dialect, line)?,
            Event::Empty(el) => {
                start_element(&mut builder, &el, dialect, line)?;
                builder.end();
            }
            Event::End(_) => builder.end(),
            Event::Text(data) => {
                let content = data.xml_content().map_err(|err| HeaderError::Xml {
                    line,
                    message: err.to_string(),
                })?;
                builder.text(content.trim());
            }
            Event::CData(data) => {
                let raw = std::str::from_utf8(&data).map_err(|err| HeaderError::Xml {
                    line,
                    message: err.to_string(),
                })?;
                builder.text(raw.trim());
            }
            Event::Eof => break,
            // Prolog, comments and processing instructions carry no content
            // the tree needs.
            _ => {}
        }
        let end = reader.buffer_position() as usize;
        line += newline_count(&text.as_bytes()[consumed..end.min(text.len())]);
        consumed = end.min(text.len());
    }

    builder.finish().ok_or(HeaderError::Xml {
        line,
        message: "no root element".to_string(),
    })
}

fn start_element(
    builder: &mut TreeBuilder,
    el: &BytesStart<'_>,
    dialect: Dialect,
    line: u32,
) -> Result<(), HeaderError> {
    let name = decode_name(el.name().as_ref(), line)?;

    if dialect == Dialect::Legacy {
        // 'p' is reserved for rewritten property elements.
        if name == "p" {
            return Err(HeaderError::ReservedElement { name, line });
        }
        if name == "properties" {
            let mut properties = Element::new("properties", line);
            for attr in el.attributes() {
                let attr = attr.map_err(|err| HeaderError::Xml {
                    line,
                    message: err.to_string(),
                })?;
                let key = decode_name(attr.key.as_ref(), line)?;
                let value = attr.unescape_value().map_err(|err| HeaderError::Xml {
                    line,
                    message: err.to_string(),
                })?;
                properties.children.push(property_element(&key, &value, line)?);
            }
            builder.start(properties);
            return Ok(());
        }
    }

    let mut element = Element::new(name, line);
    for attr in el.attributes() {
        let attr = attr.map_err(|err| HeaderError::Xml {
            line,
            message: err.to_string(),
        })?;
        let key = decode_name(attr.key.as_ref(), line)?;
        let value = attr.unescape_value().map_err(|err| HeaderError::Xml {
            line,
            message: err.to_string(),
        })?;
        element.attributes.push((key, value.into_owned()));
    }
    builder.start(element);
    Ok(())
}

/// Build one rewritten `<p>` element from a legacy properties attribute.
fn property_element(key: &str, value: &str, line: u32) -> Result<Element, HeaderError> {
    let mut p = Element::new("p", line);

    if key.contains(':') {
        let parts: Vec<&str> = key.split(':').map(str::trim).collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Err(HeaderError::MalformedProperty {
                key: key.to_string(),
                line,
            });
        }
        p.attributes.push(("name".to_string(), parts[1].to_string()));
        // Strings are the implicit default, so the type is dropped.
        if parts[0] != "String" {
            p.attributes.push(("type".to_string(), parts[0].to_string()));
        }
    } else {
        p.attributes.push(("name".to_string(), key.to_string()));
    }

    p.text = value.trim().to_string();
    Ok(p)
}

fn decode_name(raw: &[u8], line: u32) -> Result<String, HeaderError> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|err| HeaderError::Xml {
            line,
            message: err.to_string(),
        })
}

fn newline_count(bytes: &[u8]) -> u32 {
    bytes.iter().filter(|&&b| b == b'\n').count() as u32
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Element>,
    root: Option<Element>,
}

impl TreeBuilder {
    fn start(&mut self, element: Element) {
        self.stack.push(element);
    }

    fn text(&mut self, data: &str) {
        if data.is_empty() {
            return;
        }
        if let Some(top) = self.stack.last_mut() {
            top.text.push_str(data);
        }
    }

    fn end(&mut self) {
        if let Some(element) = self.stack.pop() {
            match self.stack.last_mut() {
                Some(parent) => parent.children.push(element),
                None => {
                    if self.root.is_none() {
                        self.root = Some(element);
                    }
                }
            }
        }
    }

    fn finish(self) -> Option<Element> {
        self.root
    }
}
