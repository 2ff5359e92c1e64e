use crate::attribute::Attribute;

/// Parse events consumed by [`TreeBuilder`](crate::TreeBuilder).
///
/// The parser produces these from `quick-xml` events,
/// but any tokenizer (or a test) can feed them directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    /// `<?xml version="1.0" encoding="UTF-8"?>`
    Declaration {
        version: Option<String>,
        encoding: Option<String>,
    },
    StartElement {
        name: String,
        attributes: Vec<Attribute>,
        namespaces: Vec<Attribute>,
    },
    EndElement,
    Characters(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        data: Option<String>,
    },
}

impl XmlEvent {
    /// Start of an element without attributes.
    pub fn start<S: Into<String>>(name: S) -> XmlEvent {
        XmlEvent::StartElement {
            name: name.into(),
            attributes: Vec::new(),
            namespaces: Vec::new(),
        }
    }

    pub fn characters<S: Into<String>>(text: S) -> XmlEvent {
        XmlEvent::Characters(text.into())
    }

    pub fn comment<S: Into<String>>(text: S) -> XmlEvent {
        XmlEvent::Comment(text.into())
    }
}
