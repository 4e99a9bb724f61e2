use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use super::error::HeaderError;

/// One element of a parsed header document.
///
/// Attributes keep document order; `text` is the concatenated, trimmed
/// character data of the element itself (not its descendants). `line` is the
/// 1-based line of the opening tag in the original payload, preserved so
/// schema-level diagnostics can point back into the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
    pub line: u32,
}

impl Element {
    pub fn new(name: impl Into<String>, line: u32) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            text: String::new(),
            children: Vec::new(),
            line,
        }
    }

    /// Value of the named attribute, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Element name with any namespace prefix stripped.
    pub fn local_name(&self) -> &str {
        match self.name.rsplit_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Serialize this subtree back to XML text.
    ///
    /// This is the schema-checkable form: for a legacy header it reflects the
    /// normalized properties, not the attribute-encoded original.
    pub fn to_xml(&self) -> Result<String, HeaderError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        self.write_into(&mut writer)?;
        let bytes = writer.into_inner().into_inner();
        String::from_utf8(bytes).map_err(|err| HeaderError::Xml {
            line: self.line,
            message: err.to_string(),
        })
    }

    fn write_into(&self, writer: &mut Writer<Cursor<Vec<u8>>>) -> Result<(), HeaderError> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        writer
            .write_event(Event::Start(start))
            .map_err(|err| self.write_error(err))?;
        if !self.text.is_empty() {
            writer
                .write_event(Event::Text(BytesText::new(&self.text)))
                .map_err(|err| self.write_error(err))?;
        }
        for child in &self.children {
            child.write_into(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(|err| self.write_error(err))?;
        Ok(())
    }

    fn write_error(&self, err: std::io::Error) -> HeaderError {
        HeaderError::Xml {
            line: self.line,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Element;

    #[test]
    fn attr_lookup() {
        let mut el = Element::new("x", 1);
        el.attributes.push(("type".into(), "time24".into()));
        assert_eq!(el.attr("type"), Some("time24"));
        assert_eq!(el.attr("units"), None);
    }

    #[test]
    fn local_name_strips_prefix() {
        assert_eq!(Element::new("tm:scalar", 1).local_name(), "scalar");
        assert_eq!(Element::new("scalar", 1).local_name(), "scalar");
    }

    #[test]
    fn to_xml_round_trips_structure() {
        let mut p = Element::new("p", 1);
        p.attributes.push(("name".into(), "xTagWidth".into()));
        p.text = "128.000000 s".into();
        let mut props = Element::new("properties", 1);
        props.children.push(p);

        let xml = props.to_xml().unwrap();
        assert_eq!(
            xml,
            "<properties><p name=\"xTagWidth\">128.000000 s</p></properties>"
        );
    }
}
