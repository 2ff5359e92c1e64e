//! Read xml into an ordered tree of nodes, modify it, and write it back.
//!
//! [`Document::parse_str`] drives `quick-xml` and hands its events to a [`TreeBuilder`],
//! which can also be fed [`XmlEvent`]s directly.
//! [`Document::write_str_with_opts`] writes the tree with tab indentation,
//! keeping comments, namespace declarations and attribute order.
//! Elements named in [`WriteOptions::one_line_elements`] are written on a single line.
//!
//! ```
//! use xml_object::{Document, Node, WriteOptions};
//!
//! let mut doc = Document::new();
//! doc.set_xml_version(Some("1.0".to_string()));
//! let root = Node::build("rows").finish(&mut doc);
//! doc.set_root(root).unwrap();
//! let row = Node::build("row").attribute("id", "1").push_to(&mut doc, root);
//! Node::build("cell").text_content("a & b").push_to(&mut doc, row);
//!
//! let xml = doc.write_str_with_opts(&WriteOptions::one_line(vec!["row"])).unwrap();
//! assert_eq!(xml, "<?xml version=\"1.0\"?>\n<rows>\n\t<row id=\"1\"><cell>a &amp; b</cell></row>\n</rows>");
//! ```

mod attribute;
mod builder;
mod document;
mod error;
mod event;
mod node;
mod parser;
mod writer;

pub use crate::attribute::Attribute;
pub use crate::builder::TreeBuilder;
pub use crate::document::Document;
pub use crate::error::{Error, Result};
pub use crate::event::XmlEvent;
pub use crate::node::{Node, NodeBuilder};
pub use crate::parser::ReadOptions;
pub use crate::writer::WriteOptions;
