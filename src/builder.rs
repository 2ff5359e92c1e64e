use crate::attribute::Attribute;
use crate::document::Document;
use crate::event::XmlEvent;
use crate::node::Node;
use crate::parser::ReadOptions;
use tracing::trace;

/// Builds a [`Document`] from a flat sequence of [`XmlEvent`]s.
///
/// The builder keeps the node currently receiving children and text, and a stack of its ancestors.
/// An element is pushed on the stack only when its first child element arrives,
/// so childless elements never take a slot.
/// The bottom of the stack is the root, which is never popped:
/// extra end events leave the built tree untouched.
///
/// Balance of start and end events is not checked here.
/// [`Document::parse_str`] reports unbalanced input as [`Error::MalformedXML`](crate::Error::MalformedXML).
///
/// ```
/// use xml_object::{TreeBuilder, XmlEvent};
///
/// let doc = TreeBuilder::build(vec![
///     XmlEvent::start("a"),
///     XmlEvent::start("b"),
///     XmlEvent::EndElement,
///     XmlEvent::EndElement,
/// ]);
/// let a = doc.root_element().unwrap();
/// assert_eq!(a.name(&doc), "a");
/// assert_eq!(a.children(&doc).len(), 1);
/// ```
#[derive(Debug)]
pub struct TreeBuilder {
    document: Document,
    read_opts: ReadOptions,
    current: Option<Node>,
    ancestors: Vec<Node>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> TreeBuilder {
        Self::with_opts(ReadOptions::default())
    }

    pub fn with_opts(opts: ReadOptions) -> TreeBuilder {
        TreeBuilder {
            document: Document::new(),
            read_opts: opts,
            current: None,
            ancestors: Vec::new(),
        }
    }

    /// Feed every event and return the document.
    pub fn build<I: IntoIterator<Item = XmlEvent>>(events: I) -> Document {
        let mut builder = TreeBuilder::new();
        for event in events {
            builder.handle_event(event);
        }
        builder.finish()
    }

    pub fn has_root(&self) -> bool {
        self.document.root_element().is_some()
    }

    pub fn finish(self) -> Document {
        self.document
    }

    pub fn handle_event(&mut self, event: XmlEvent) {
        match event {
            XmlEvent::Declaration { version, encoding } => {
                self.document.set_xml_version(version);
                self.document.set_encoding(encoding);
            }
            XmlEvent::StartElement {
                name,
                attributes,
                namespaces,
            } => self.start_element(name, attributes, namespaces),
            XmlEvent::EndElement => self.end_element(),
            XmlEvent::Characters(text) => match self.current {
                Some(current) => current.add_text_content(&mut self.document, &text),
                None => trace!("dropping text outside of the root element"),
            },
            XmlEvent::Comment(text) => match self.current {
                Some(current) => {
                    let comment = Node::comment(&mut self.document, text);
                    current.attach(&mut self.document, None, comment);
                }
                None => trace!("dropping comment outside of the root element"),
            },
            // Only the last processing instruction is kept.
            XmlEvent::ProcessingInstruction { target, data } => {
                self.document.set_processing_instruction(target, data)
            }
        }
    }

    fn start_element(
        &mut self,
        name: String,
        attributes: Vec<Attribute>,
        namespaces: Vec<Attribute>,
    ) {
        let node = Node::with_data(
            &mut self.document,
            name,
            Some(String::new()),
            attributes,
            namespaces,
            false,
        );
        match self.current {
            None => {
                self.document.root = Some(node);
                self.current = Some(node);
                self.ancestors.push(node);
            }
            Some(current) => {
                current.attach(&mut self.document, None, node);
                // First child of `current`: remember where to come back to.
                if self.ancestors.last().map_or(false, |top| *top != current) {
                    self.ancestors.push(current);
                }
                self.current = Some(node);
            }
        }
    }

    fn end_element(&mut self) {
        let current = match self.current {
            Some(current) => current,
            None => return,
        };
        if self.read_opts.trim_text {
            current.trim_text_content(&mut self.document);
        }
        self.current = self.ancestors.last().copied();
        if self.ancestors.len() > 1 {
            self.ancestors.pop();
        }
    }
}
