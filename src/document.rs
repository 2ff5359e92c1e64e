use crate::error::{Error, Result};
use crate::node::{Node, NodeData};
use crate::parser::{DocumentParser, ReadOptions};
use crate::writer::{DocumentWriter, WriteOptions};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Represents a XML document.
///
/// It owns every [`Node`] of the tree, along with the
/// version and encoding of the XML declaration and a single processing instruction.
///
/// Use [`Document::parse_str()`], [`Document::parse_reader()`] or [`Document::parse_file()`] to parse xml,
/// or build the tree by hand starting from [`Document::new()`].
///
/// # Examples
/// ```
/// use xml_object::{Document, WriteOptions};
///
/// let mut doc = Document::parse_str(r#"<?xml version="1.0" encoding="UTF-8"?>
/// <playlist>
///     <track id="7">
///         <title>Blue in Grene</title>
///     </track>
/// </playlist>
/// "#).unwrap();
/// let title = doc
///     .root_element()
///     .unwrap()
///     .find_with_attributes(&doc, "track", &[("id", "7")])
///     .unwrap()
///     .find(&doc, "title")
///     .unwrap();
/// title.set_text_content(&mut doc, "Blue in Green");
/// let xml = doc.write_str_with_opts(&WriteOptions::one_line(vec!["track"])).unwrap();
/// assert_eq!(xml, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>
/// <playlist>
/// \t<track id=\"7\"><title>Blue in Green</title></track>
/// </playlist>");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub(crate) store: Vec<NodeData>,
    pub(crate) root: Option<Node>,

    xml_version: Option<String>,
    encoding: Option<String>,
    pi_target: Option<String>,
    pi_data: Option<String>,
}

impl Document {
    /// Create a blank new xml document, without root element.
    pub fn new() -> Document {
        Document::default()
    }

    /// ```ignore
    /// self.root_element().is_none()
    /// ```
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn root_element(&self) -> Option<Node> {
        self.root
    }

    /// Make a detached node the root of this document. The previous root, if any, is dropped.
    ///
    /// # Errors
    ///
    /// - [`Error::HasAParent`]: The node is attached to another node.
    pub fn set_root(&mut self, node: Node) -> Result<()> {
        if node.has_parent(self) {
            return Err(Error::HasAParent);
        }
        self.root = Some(node);
        Ok(())
    }

    pub fn xml_version(&self) -> Option<&str> {
        self.xml_version.as_deref()
    }

    pub fn set_xml_version(&mut self, version: Option<String>) {
        self.xml_version = version;
    }

    /// Encoding named in the XML declaration. Written output is always UTF-8 regardless.
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    pub fn set_encoding(&mut self, encoding: Option<String>) {
        self.encoding = encoding;
    }

    /// Target and data of the processing instruction. Only one is kept per document.
    pub fn processing_instruction(&self) -> Option<(&str, Option<&str>)> {
        let target = self.pi_target.as_deref()?;
        Some((target, self.pi_data.as_deref()))
    }

    /// Replaces the processing instruction.
    pub fn set_processing_instruction<S: Into<String>>(&mut self, target: S, data: Option<String>) {
        self.pi_target = Some(target.into());
        self.pi_data = data;
    }

    pub fn clear_processing_instruction(&mut self) {
        self.pi_target = None;
        self.pi_data = None;
    }
}

// Read and write
impl Document {
    /// Parses xml string.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedXML`]: Could not read XML, or the tags are unbalanced.
    pub fn parse_str(str: &str) -> Result<Document> {
        DocumentParser::parse_str(str, ReadOptions::default())
    }
    pub fn parse_str_with_opts(str: &str, opts: ReadOptions) -> Result<Document> {
        DocumentParser::parse_str(str, opts)
    }

    /// Parses xml from reader. The encoding is detected from its BOM or XML declaration.
    ///
    /// # Errors
    ///
    /// - [`Error::CannotDecode`]: Could not decode XML.
    /// - [`Error::MalformedXML`]: Could not read XML.
    /// - [`Error::Io`]: IO Error
    pub fn parse_reader<R: Read>(reader: R) -> Result<Document> {
        DocumentParser::parse_reader(reader, ReadOptions::default())
    }
    pub fn parse_reader_with_opts<R: Read>(reader: R, opts: ReadOptions) -> Result<Document> {
        DocumentParser::parse_reader(reader, opts)
    }

    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
        Self::parse_file_with_opts(path, ReadOptions::default())
    }
    pub fn parse_file_with_opts<P: AsRef<Path>>(path: P, opts: ReadOptions) -> Result<Document> {
        let file = File::open(path)?;
        DocumentParser::parse_reader(file, opts)
    }

    /// Writes document as xml string, with default [`WriteOptions`].
    pub fn write_str(&self) -> Result<String> {
        DocumentWriter::write_str(self, &WriteOptions::default())
    }
    pub fn write_str_with_opts(&self, opts: &WriteOptions) -> Result<String> {
        DocumentWriter::write_str(self, opts)
    }

    /// Write document to writer. Will be written in UTF-8.
    pub fn write(&self, writer: &mut impl Write) -> Result<()> {
        self.write_with_opts(writer, &WriteOptions::default())
    }
    pub fn write_with_opts(&self, writer: &mut impl Write, opts: &WriteOptions) -> Result<()> {
        let xml = DocumentWriter::write_str(self, opts)?;
        writer.write_all(xml.as_bytes())?;
        Ok(())
    }

    /// Write document to a file in UTF-8, creating missing parent directories.
    /// An existing file is overwritten.
    pub fn write_file<P: AsRef<Path>>(&self, path: P, opts: &WriteOptions) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = File::create(path)?;
        self.write_with_opts(&mut file, opts)?;
        file.flush()?;
        debug!(path = %path.display(), "wrote document");
        Ok(())
    }
}

impl FromStr for Document {
    type Err = Error;

    fn from_str(s: &str) -> Result<Document> {
        Document::parse_str(s)
    }
}
