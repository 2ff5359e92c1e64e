use crate::attribute::Attribute;
use crate::builder::TreeBuilder;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::event::XmlEvent;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::Reader;
use std::io::Read;
use tracing::{debug, trace};

/// Options when parsing xml.
///
/// `trim_text`: trim whitespace around an element's text when the element closes.
///
/// `require_decl`: return error if the document doesn't start with `<?xml ...?>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    pub trim_text: bool,
    pub require_decl: bool,
}

impl Default for ReadOptions {
    fn default() -> ReadOptions {
        ReadOptions {
            trim_text: true,
            require_decl: false,
        }
    }
}

/// Reads the bytes, figures out the encoding and decodes them to a `String`.
///
/// A BOM wins, then UTF-16 detected from `<?`, then the `encoding` of the XML declaration.
/// Otherwise UTF-8.
pub(crate) fn decode<R: Read>(mut reader: R) -> Result<String> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let (encoding, content) = match Encoding::for_bom(&bytes) {
        Some((encoding, bom_len)) => (encoding, &bytes[bom_len..]),
        None => (sniff_encoding(&bytes)?, &bytes[..]),
    };
    debug!(encoding = encoding.name(), len = content.len(), "decoding document");
    let (text, had_errors) = encoding.decode_without_bom_handling(content);
    if had_errors {
        return Err(Error::CannotDecode);
    }
    Ok(text.into_owned())
}

fn sniff_encoding(bytes: &[u8]) -> Result<&'static Encoding> {
    match bytes {
        [0x00, 0x3c, 0x00, 0x3f, ..] => Ok(UTF_16BE),
        [0x3c, 0x00, 0x3f, 0x00, ..] => Ok(UTF_16LE),
        _ => match declared_encoding(bytes) {
            Some(label) => {
                let encoding = Encoding::for_label(label).ok_or(Error::CannotDecode)?;
                // The declaration was readable as ASCII, so "UTF-16" without a BOM can't be right.
                if encoding.is_ascii_compatible() {
                    Ok(encoding)
                } else {
                    Ok(UTF_8)
                }
            }
            None => Ok(UTF_8),
        },
    }
}

/// `<?xml version="1.0" encoding="ISO-8859-1"?>` -> `ISO-8859-1`
fn declared_encoding(bytes: &[u8]) -> Option<&[u8]> {
    if !bytes.starts_with(b"<?xml") {
        return None;
    }
    let end = bytes.windows(2).position(|w| w == b"?>")?;
    let decl = &bytes[..end];
    let pos = decl.windows(8).position(|w| w == b"encoding")?;
    let rest = &decl[pos + 8..];
    let start = rest.iter().position(|b| *b == b'"' || *b == b'\'')?;
    let quote = rest[start];
    let value = &rest[start + 1..];
    let len = value.iter().position(|b| *b == quote)?;
    Some(&value[..len])
}

fn unquote(value: &str) -> &str {
    value.trim_matches(|c| c == '"' || c == '\'')
}

/// `target data...` -> (`target`, Some(`data...`))
fn split_pi(content: &str) -> (String, Option<String>) {
    let content = content.trim();
    match content.find(char::is_whitespace) {
        Some(pos) => {
            let data = content[pos..].trim_start();
            let data = if data.is_empty() {
                None
            } else {
                Some(data.to_string())
            };
            (content[..pos].to_string(), data)
        }
        None => (content.to_string(), None),
    }
}

/// Drives `quick-xml` and feeds the events into a [`TreeBuilder`].
///
/// The builder trusts its input, so tag balance is checked here.
pub(crate) struct DocumentParser {
    builder: TreeBuilder,
    read_opts: ReadOptions,
    depth: usize,
    root_closed: bool,
    decl_seen: bool,
}

impl DocumentParser {
    fn new(opts: ReadOptions) -> DocumentParser {
        DocumentParser {
            builder: TreeBuilder::with_opts(opts.clone()),
            read_opts: opts,
            depth: 0,
            root_closed: false,
            decl_seen: false,
        }
    }

    pub(crate) fn parse_reader<R: Read>(reader: R, opts: ReadOptions) -> Result<Document> {
        let text = decode(reader)?;
        Self::parse_str(&text, opts)
    }

    pub(crate) fn parse_str(text: &str, opts: ReadOptions) -> Result<Document> {
        let mut parser = DocumentParser::new(opts);
        let mut reader = Reader::from_str(text);
        reader
            .expand_empty_elements(true)
            .check_end_names(true)
            .trim_text(false);

        let mut buf = Vec::with_capacity(200); // reduce time increasing capacity at start.
        loop {
            let event = reader.read_event(&mut buf)?;
            trace!(?event, "xml event");
            if parser.handle_event(event)? {
                break;
            }
            buf.clear();
        }
        let document = parser.builder.finish();
        debug!(nodes = document.store.len(), "parsed document");
        Ok(document)
    }

    fn check_decl(&self) -> Result<()> {
        if self.read_opts.require_decl && !self.decl_seen {
            return Err(Error::MalformedXML(
                "Didn't find XML Declaration at the start of file".to_string(),
            ));
        }
        Ok(())
    }

    fn handle_decl(&mut self, ev: &BytesDecl) -> Result<XmlEvent> {
        let version = String::from_utf8(ev.version()?.to_vec())?;
        let encoding = match ev.encoding() {
            Some(res) => Some(String::from_utf8(res?.to_vec())?),
            None => None,
        };
        self.decl_seen = true;
        Ok(XmlEvent::Declaration {
            version: Some(unquote(&version).to_string()),
            encoding: encoding.map(|e| unquote(&e).to_string()),
        })
    }

    fn handle_bytes_start(&mut self, ev: &BytesStart) -> Result<XmlEvent> {
        self.check_decl()?;
        if self.root_closed {
            return Err(Error::MalformedXML(
                "Found more than one root element".to_string(),
            ));
        }
        let name = String::from_utf8(ev.name().to_vec())?;
        let mut attributes = Vec::new();
        let mut namespaces = Vec::new();
        for attr in ev.attributes() {
            let attr = attr?;
            let key = String::from_utf8(attr.key.to_vec())?;
            let value = String::from_utf8(attr.unescaped_value()?.to_vec())?;
            if key == "xmlns" || key.starts_with("xmlns:") {
                namespaces.push(Attribute::new(key, value));
            } else {
                attributes.push(Attribute::new(key, value));
            }
        }
        self.depth += 1;
        Ok(XmlEvent::StartElement {
            name,
            attributes,
            namespaces,
        })
    }

    fn handle_end(&mut self) -> Result<XmlEvent> {
        // quick-xml checks if tag names match for us
        self.depth = self.depth.checked_sub(1).ok_or_else(|| {
            Error::MalformedXML("Found closing tag without opening tag".to_string())
        })?;
        if self.depth == 0 {
            self.root_closed = true;
        }
        Ok(XmlEvent::EndElement)
    }

    // Returns if document parsing is finished.
    fn handle_event(&mut self, event: Event) -> Result<bool> {
        let xml_event = match event {
            Event::Decl(ref ev) => self.handle_decl(ev)?,
            Event::Start(ref ev) => self.handle_bytes_start(ev)?,
            Event::End(_) => self.handle_end()?,
            // Only produced if `expand_empty_elements` is off.
            Event::Empty(ref ev) => {
                let start = self.handle_bytes_start(ev)?;
                self.builder.handle_event(start);
                self.handle_end()?
            }
            Event::Text(ev) => {
                if self.depth == 0 {
                    if !ev.iter().all(u8::is_ascii_whitespace) {
                        return Err(Error::MalformedXML(
                            "Found text outside of the root element".to_string(),
                        ));
                    }
                    return Ok(false);
                }
                XmlEvent::Characters(String::from_utf8(ev.unescaped()?.to_vec())?)
            }
            // CData content is not escaped.
            Event::CData(ev) => {
                if self.depth == 0 {
                    return Err(Error::MalformedXML(
                        "Found CDATA outside of the root element".to_string(),
                    ));
                }
                XmlEvent::Characters(String::from_utf8(ev.to_vec())?)
            }
            Event::Comment(ev) => {
                self.check_decl()?;
                // After the root closes it stays current, so epilog comments become its last children.
                XmlEvent::Comment(String::from_utf8(ev.to_vec())?)
            }
            Event::PI(ev) => {
                self.check_decl()?;
                let (target, data) = split_pi(std::str::from_utf8(&ev)?);
                XmlEvent::ProcessingInstruction { target, data }
            }
            Event::DocType(_) => {
                self.check_decl()?;
                trace!("skipping DOCTYPE");
                return Ok(false);
            }
            Event::Eof => {
                self.check_decl()?;
                if self.depth > 0 {
                    return Err(Error::MalformedXML(
                        "Unclosed element at end of document".to_string(),
                    ));
                }
                if !self.builder.has_root() {
                    return Err(Error::MalformedXML("No root element".to_string()));
                }
                return Ok(true);
            }
        };
        self.builder.handle_event(xml_event);
        Ok(false)
    }
}
