use crate::attribute::Attribute;
use crate::document::Document;
use crate::error::Result;
use crate::node::Node;
use quick_xml::escape::escape;
use std::collections::HashSet;
use tracing::debug;

/// Options when writing xml.
///
/// `one_line_elements`: elements with these names are written with their whole subtree on one line.
/// Elements without children are always written on one line.
///
/// `escape_attribute_values`: escape `<>&'"` in attribute and namespace values.
/// Turn off to write values verbatim, as older versions of the format did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    pub one_line_elements: HashSet<String>,
    pub escape_attribute_values: bool,
}

impl Default for WriteOptions {
    fn default() -> WriteOptions {
        WriteOptions {
            one_line_elements: HashSet::new(),
            escape_attribute_values: true,
        }
    }
}

impl WriteOptions {
    /// ```
    /// use xml_object::WriteOptions;
    ///
    /// let opts = WriteOptions::one_line(vec!["row", "cell"]);
    /// assert!(opts.one_line_elements.contains("row"));
    /// ```
    pub fn one_line<I, S>(names: I) -> WriteOptions
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        WriteOptions {
            one_line_elements: names.into_iter().map(Into::into).collect(),
            ..WriteOptions::default()
        }
    }
}

pub(crate) struct DocumentWriter<'a> {
    document: &'a Document,
    opts: &'a WriteOptions,
    buf: String,
}

impl<'a> DocumentWriter<'a> {
    pub(crate) fn write_str(document: &'a Document, opts: &'a WriteOptions) -> Result<String> {
        let mut writer = DocumentWriter {
            document,
            opts,
            buf: String::with_capacity(200),
        };
        writer.write_decl();
        writer.write_pi();
        if let Some(root) = document.root_element() {
            writer.write_node(root, 0, false)?;
        }
        debug!(len = writer.buf.len(), "serialized document");
        Ok(writer.buf)
    }

    fn write_decl(&mut self) {
        self.buf.push_str("<?xml");
        if let Some(version) = self.document.xml_version() {
            self.buf.push_str(" version=\"");
            self.buf.push_str(version);
            self.buf.push('"');
        }
        if let Some(encoding) = self.document.encoding() {
            self.buf.push_str(" encoding=\"");
            self.buf.push_str(encoding);
            self.buf.push('"');
        }
        self.buf.push_str("?>\n");
    }

    fn write_pi(&mut self) {
        if let Some((target, data)) = self.document.processing_instruction() {
            self.buf.push_str("<?");
            self.buf.push_str(target);
            if let Some(data) = data {
                self.buf.push(' ');
                self.buf.push_str(data);
            }
            self.buf.push_str("?>\n");
        }
    }

    fn write_indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.buf.push('\t');
        }
    }

    fn write_escaped(&mut self, raw: &str) -> Result<()> {
        let escaped = escape(raw.as_bytes());
        self.buf.push_str(std::str::from_utf8(&escaped)?);
        Ok(())
    }

    fn write_attribute(&mut self, attr: &Attribute) -> Result<()> {
        self.buf.push(' ');
        self.buf.push_str(attr.name());
        self.buf.push_str("=\"");
        if self.opts.escape_attribute_values {
            self.write_escaped(attr.value())?;
        } else {
            self.buf.push_str(attr.value());
        }
        self.buf.push('"');
        Ok(())
    }

    // `inline`: an ancestor is written on one line, so no indentation or line breaks.
    fn write_node(&mut self, node: Node, depth: usize, inline: bool) -> Result<()> {
        let doc = self.document;
        self.write_indent(depth);

        // Comment text is not escaped.
        if node.is_comment(doc) {
            self.buf.push_str("<!--");
            self.buf.push_str(node.text_content(doc).unwrap_or(""));
            // Even inside a one-line element.
            self.buf.push_str("-->\n");
            return Ok(());
        }

        let name = node.name(doc);
        self.buf.push('<');
        self.buf.push_str(name);
        for attr in node.namespace_declarations(doc) {
            self.write_attribute(attr)?;
        }
        for attr in node.attributes(doc) {
            self.write_attribute(attr)?;
        }

        let children = node.children(doc);
        let text = node.text_content(doc);
        if children.is_empty() && text.is_none() {
            self.buf.push_str("/>");
        } else {
            self.buf.push('>');
            let one_line = inline || children.is_empty() || self.opts.one_line_elements.contains(name);
            if !one_line {
                self.buf.push('\n');
            }
            for child in children {
                if one_line {
                    self.write_node(*child, 0, true)?;
                } else {
                    self.write_node(*child, depth + 1, false)?;
                }
            }
            // Text always comes after the children.
            if let Some(text) = text {
                self.write_escaped(text)?;
            }
            if !one_line {
                self.write_indent(depth);
            }
            self.buf.push_str("</");
            self.buf.push_str(name);
            self.buf.push('>');
            // Only after a closing tag: `<tag/>` is followed directly by the next sibling.
            // The root gets no line break after it.
            if !inline && depth > 0 {
                self.buf.push('\n');
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECL: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

    fn new_doc(root_name: &str) -> (Document, Node) {
        let mut doc = Document::new();
        doc.set_xml_version(Some("1.0".to_string()));
        doc.set_encoding(Some("UTF-8".to_string()));
        let root = Node::new(&mut doc, root_name);
        doc.set_root(root).unwrap();
        (doc, root)
    }

    fn body(doc: &Document, opts: &WriteOptions) -> String {
        let xml = doc.write_str_with_opts(opts).unwrap();
        xml.strip_prefix(DECL).unwrap().to_string()
    }

    #[test]
    fn test_self_closing() {
        let (mut doc, root) = new_doc("root");
        let empty = Node::build("empty").no_text().push_to(&mut doc, root);
        Node::build("explicit").push_to(&mut doc, root);
        assert_eq!(
            body(&doc, &WriteOptions::default()),
            "<root>\n\t<empty/>\t<explicit></explicit>\n</root>"
        );
        empty.set_text_content(&mut doc, "");
        assert_eq!(
            body(&doc, &WriteOptions::default()),
            "<root>\n\t<empty></empty>\n\t<explicit></explicit>\n</root>"
        );
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::new();
        assert_eq!(doc.write_str().unwrap(), "<?xml?>\n");
    }

    #[test]
    fn test_declaration_and_pi() {
        let (mut doc, root) = new_doc("root");
        root.clear_text_content(&mut doc);
        doc.set_encoding(None);
        doc.set_processing_instruction("xml-stylesheet", Some("href=\"a.xsl\"".to_string()));
        assert_eq!(
            doc.write_str().unwrap(),
            "<?xml version=\"1.0\"?>\n<?xml-stylesheet href=\"a.xsl\"?>\n<root/>"
        );
        doc.set_processing_instruction("page-break", None);
        assert_eq!(
            doc.write_str().unwrap(),
            "<?xml version=\"1.0\"?>\n<?page-break?>\n<root/>"
        );
    }

    #[test]
    fn test_one_line() {
        let (mut doc, root) = new_doc("table");
        let row = Node::build("row").push_to(&mut doc, root);
        Node::build("cell").text_content("a").push_to(&mut doc, row);
        let cell = Node::build("cell").push_to(&mut doc, row);
        Node::build("b").text_content("bold").push_to(&mut doc, cell);

        assert_eq!(
            body(&doc, &WriteOptions::one_line(vec!["row"])),
            "<table>\n\t<row><cell>a</cell><cell><b>bold</b></cell></row>\n</table>"
        );
        assert_eq!(
            body(&doc, &WriteOptions::default()),
            "<table>\n\t<row>\n\t\t<cell>a</cell>\n\t\t<cell>\n\t\t\t<b>bold</b>\n\t\t</cell>\n\t</row>\n</table>"
        );
    }

    #[test]
    fn test_text_after_children() {
        let (mut doc, root) = new_doc("p");
        root.set_text_content(&mut doc, "tail");
        Node::build("b").push_to(&mut doc, root);
        assert_eq!(body(&doc, &WriteOptions::default()), "<p>\n\t<b></b>\ntail</p>");
        assert_eq!(
            body(&doc, &WriteOptions::one_line(vec!["p"])),
            "<p><b></b>tail</p>"
        );
    }

    #[test]
    fn test_comments() {
        let (mut doc, root) = new_doc("root");
        let comment = Node::comment(&mut doc, " a < b ");
        root.push_child(&mut doc, comment).unwrap();
        let inner = Node::build("inner").push_to(&mut doc, root);
        let inner_comment = Node::comment(&mut doc, "x");
        inner.push_child(&mut doc, inner_comment).unwrap();
        assert_eq!(
            body(&doc, &WriteOptions::default()),
            "<root>\n\t<!-- a < b -->\n\t<inner>\n\t\t<!--x-->\n\t</inner>\n</root>"
        );
        assert_eq!(
            body(&doc, &WriteOptions::one_line(vec!["root"])),
            "<root><!-- a < b -->\n<inner><!--x-->\n</inner></root>"
        );
    }

    #[test]
    fn test_self_closing_child_has_no_line_break() {
        let (mut doc, root) = new_doc("list");
        Node::build("first").no_text().push_to(&mut doc, root);
        Node::build("second").no_text().push_to(&mut doc, root);
        Node::build("last").text_content("x").push_to(&mut doc, root);
        assert_eq!(
            body(&doc, &WriteOptions::default()),
            "<list>\n\t<first/>\t<second/>\t<last>x</last>\n</list>"
        );
    }

    #[test]
    fn test_comment_in_one_line_element() {
        let (mut doc, root) = new_doc("table");
        let row = Node::build("row").push_to(&mut doc, root);
        let comment = Node::comment(&mut doc, "c");
        row.push_child(&mut doc, comment).unwrap();
        Node::build("cell").text_content("a").push_to(&mut doc, row);
        assert_eq!(
            body(&doc, &WriteOptions::one_line(vec!["row"])),
            "<table>\n\t<row><!--c-->\n<cell>a</cell></row>\n</table>"
        );
    }

    #[test]
    fn test_attributes_order_and_namespaces() {
        let (mut doc, root) = new_doc("root");
        root.add_attribute(&mut doc, "b", "2");
        root.add_attribute(&mut doc, "a", "1");
        root.add_namespace_declaration(&mut doc, "xmlns:p", "urn:p");
        root.clear_text_content(&mut doc);
        assert_eq!(
            body(&doc, &WriteOptions::default()),
            r#"<root xmlns:p="urn:p" b="2" a="1"/>"#
        );
    }

    #[test]
    fn test_escape() {
        let (mut doc, root) = new_doc("root");
        root.add_attribute(&mut doc, "attr", "><&\"'attrval");
        root.set_text_content(&mut doc, "><&\"'text");
        assert_eq!(
            body(&doc, &WriteOptions::default()),
            r#"<root attr="&gt;&lt;&amp;&quot;&apos;attrval">&gt;&lt;&amp;&quot;&apos;text</root>"#
        );
        let opts = WriteOptions {
            escape_attribute_values: false,
            ..WriteOptions::default()
        };
        assert_eq!(
            body(&doc, &opts),
            r#"<root attr="><&"'attrval">&gt;&lt;&amp;&quot;&apos;text</root>"#
        );
    }
}
