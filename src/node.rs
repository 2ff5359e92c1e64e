use crate::attribute::Attribute;
use crate::document::Document;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    name: String,
    text: Option<String>, // None: text was never set (or cleared). Drives `<tag/>` on write.
    attributes: Vec<Attribute>,
    namespace_decls: Vec<Attribute>, // xmlns="..." and xmlns:p="..." in source order
    parent: Option<Node>,
    children: Vec<Node>,
    is_comment: bool,
}

/// Represents a node of the xml tree: an element, or a comment.
///
/// This struct only contains a unique usize id and implements trait `Copy`.
/// So you do not need to bother with having a reference.
///
/// Because the actual data of the node is stored in [`Document`],
/// most methods takes `&Document` or `&mut Document` as its first argument.
///
/// # Panics
///
/// Methods panic if the node was created by another [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Node {
    id: usize,
}

impl Node {
    /// Create a new detached element with name and empty (but present) text.
    pub fn new<S: Into<String>>(document: &mut Document, name: S) -> Node {
        Self::with_data(
            document,
            name.into(),
            Some(String::new()),
            Vec::new(),
            Vec::new(),
            false,
        )
    }

    pub fn with_text<N: Into<String>, T: Into<String>>(
        document: &mut Document,
        name: N,
        text: T,
    ) -> Node {
        Self::with_data(
            document,
            name.into(),
            Some(text.into()),
            Vec::new(),
            Vec::new(),
            false,
        )
    }

    /// Create a new detached comment node. Its name is empty.
    pub fn comment<S: Into<String>>(document: &mut Document, text: S) -> Node {
        Self::with_data(
            document,
            String::new(),
            Some(text.into()),
            Vec::new(),
            Vec::new(),
            true,
        )
    }

    /// Start building a new element.
    ///
    /// ```
    /// use xml_object::{Document, Node};
    ///
    /// let mut doc = Document::new();
    /// let root = Node::build("root").attribute("id", "1").finish(&mut doc);
    /// doc.set_root(root).unwrap();
    /// let item = Node::build("item").no_text().push_to(&mut doc, root);
    /// assert_eq!(root.find(&doc, "item"), Some(item));
    /// ```
    pub fn build<S: Into<String>>(name: S) -> NodeBuilder {
        NodeBuilder {
            name: name.into(),
            text: Some(String::new()),
            attributes: Vec::new(),
            namespace_decls: Vec::new(),
        }
    }

    pub(crate) fn with_data(
        document: &mut Document,
        name: String,
        text: Option<String>,
        attributes: Vec<Attribute>,
        namespace_decls: Vec<Attribute>,
        is_comment: bool,
    ) -> Node {
        let node = Node {
            id: document.store.len(),
        };
        document.store.push(NodeData {
            name,
            text,
            attributes,
            namespace_decls,
            parent: None,
            children: Vec::new(),
            is_comment,
        });
        node
    }
}

impl Node {
    fn data<'a>(&self, document: &'a Document) -> &'a NodeData {
        &document.store[self.id]
    }

    fn mut_data<'a>(&self, document: &'a mut Document) -> &'a mut NodeData {
        &mut document.store[self.id]
    }

    /// Get raw name of element, including its namespace prefix.
    /// Comment nodes have an empty name.
    pub fn name<'a>(&self, document: &'a Document) -> &'a str {
        &self.data(document).name
    }

    pub fn set_name<S: Into<String>>(&self, document: &mut Document, name: S) {
        self.mut_data(document).name = name.into();
    }

    pub fn is_comment(&self, document: &Document) -> bool {
        self.data(document).is_comment
    }

    /// `None` if the text was never set, which is different from `Some("")`.
    /// For comments, this is the comment body.
    pub fn text_content<'a>(&self, document: &'a Document) -> Option<&'a str> {
        self.data(document).text.as_deref()
    }

    pub fn set_text_content<S: Into<String>>(&self, document: &mut Document, text: S) {
        self.mut_data(document).text = Some(text.into());
    }

    /// Unset text. A childless element without text is written as `<tag/>`.
    pub fn clear_text_content(&self, document: &mut Document) {
        self.mut_data(document).text = None;
    }

    /// Appends to the existing text. Absent text is treated as empty.
    pub fn add_text_content(&self, document: &mut Document, fragment: &str) {
        match &mut self.mut_data(document).text {
            Some(text) => text.push_str(fragment),
            text => *text = Some(fragment.to_string()),
        }
    }

    /// Strips leading and trailing whitespace from text in place.
    /// Whitespace is every character up to and including `' '`, so `\u{a0}` stays.
    pub fn trim_text_content(&self, document: &mut Document) {
        if let Some(text) = &mut self.mut_data(document).text {
            let trimmed = text.trim_matches(|c: char| c <= ' ');
            if trimmed.len() != text.len() {
                *text = trimmed.to_string();
            }
        }
    }
}

// Attributes
impl Node {
    /// Attributes in insertion order. Duplicate names are possible.
    pub fn attributes<'a>(&self, document: &'a Document) -> &'a [Attribute] {
        &self.data(document).attributes
    }

    pub fn mut_attributes<'a>(&self, document: &'a mut Document) -> &'a mut Vec<Attribute> {
        &mut self.mut_data(document).attributes
    }

    /// Appends an attribute. Never deduplicates.
    pub fn add_attribute<N: Into<String>, V: Into<String>>(
        &self,
        document: &mut Document,
        name: N,
        value: V,
    ) {
        self.mut_attributes(document)
            .push(Attribute::new(name, value));
    }

    /// Changes the value of the first attribute named `name`.
    ///
    /// Does nothing if there is no such attribute: use [`Node::add_attribute`] to create one.
    /// Returns whether an attribute was changed.
    pub fn set_attribute<V: Into<String>>(
        &self,
        document: &mut Document,
        name: &str,
        value: V,
    ) -> bool {
        match self.attribute_mut(document, name) {
            Some(attr) => {
                attr.set_value(value);
                true
            }
            None => false,
        }
    }

    /// Removes the first attribute named `name`.
    pub fn remove_attribute(&self, document: &mut Document, name: &str) -> Option<Attribute> {
        let attributes = self.mut_attributes(document);
        let pos = attributes.iter().position(|a| a.name() == name)?;
        Some(attributes.remove(pos))
    }

    /// First attribute named `name`.
    pub fn attribute<'a>(&self, document: &'a Document, name: &str) -> Option<&'a Attribute> {
        self.attributes(document).iter().find(|a| a.name() == name)
    }

    pub fn attribute_mut<'a>(
        &self,
        document: &'a mut Document,
        name: &str,
    ) -> Option<&'a mut Attribute> {
        self.mut_attributes(document)
            .iter_mut()
            .find(|a| a.name() == name)
    }

    pub fn attribute_value<'a>(&self, document: &'a Document, name: &str) -> Option<&'a str> {
        self.attribute(document, name).map(Attribute::value)
    }

    pub fn contains_attribute(&self, document: &Document, name: &str) -> bool {
        self.attribute(document, name).is_some()
    }

    /// Namespace declarations, with their full attribute name (`xmlns`, `xmlns:prefix`).
    pub fn namespace_declarations<'a>(&self, document: &'a Document) -> &'a [Attribute] {
        &self.data(document).namespace_decls
    }

    pub fn mut_namespace_declarations<'a>(
        &self,
        document: &'a mut Document,
    ) -> &'a mut Vec<Attribute> {
        &mut self.mut_data(document).namespace_decls
    }

    /// ```ignore
    /// node.add_namespace_declaration(&mut doc, "xmlns:dc", "http://purl.org/dc/elements/1.1/");
    /// ```
    pub fn add_namespace_declaration<N: Into<String>, V: Into<String>>(
        &self,
        document: &mut Document,
        name: N,
        value: V,
    ) {
        self.mut_namespace_declarations(document)
            .push(Attribute::new(name, value));
    }
}

// Tree structure
impl Node {
    pub fn parent(&self, document: &Document) -> Option<Node> {
        self.data(document).parent
    }

    /// ```ignore
    /// self.parent(document).is_some()
    /// ```
    pub fn has_parent(&self, document: &Document) -> bool {
        self.parent(document).is_some()
    }

    /// Child nodes in document order, comments included.
    pub fn children<'a>(&self, document: &'a Document) -> &'a [Node] {
        &self.data(document).children
    }

    /// ```ignore
    /// !self.children(document).is_empty()
    /// ```
    pub fn has_children(&self, document: &Document) -> bool {
        !self.children(document).is_empty()
    }

    pub fn first_child(&self, document: &Document) -> Option<Node> {
        self.children(document).first().copied()
    }

    pub fn child_at(&self, document: &Document, index: usize) -> Option<Node> {
        self.children(document).get(index).copied()
    }

    /// Children that are not comments.
    pub fn child_elements(&self, document: &Document) -> Vec<Node> {
        self.children(document)
            .iter()
            .filter(|node| !node.is_comment(document))
            .copied()
            .collect()
    }

    fn _children_recursive(&self, document: &Document, nodes: &mut Vec<Node>) {
        for node in self.children(document) {
            nodes.push(*node);
            node._children_recursive(document, nodes);
        }
    }

    /// All descendants in document order.
    pub fn children_recursive(&self, document: &Document) -> Vec<Node> {
        let mut nodes = Vec::new();
        self._children_recursive(document, &mut nodes);
        nodes
    }

    fn check_attachable(&self, document: &Document, child: Node) -> Result<()> {
        if document.root_element() == Some(child) {
            return Err(Error::RootCannotMove);
        }
        if child.has_parent(document) {
            return Err(Error::HasAParent);
        }
        let mut ancestor = Some(*self);
        while let Some(node) = ancestor {
            if node == child {
                return Err(Error::CyclicTree);
            }
            ancestor = node.parent(document);
        }
        Ok(())
    }

    // Callers guarantee `child` is detached and not an ancestor.
    pub(crate) fn attach(&self, document: &mut Document, index: Option<usize>, child: Node) {
        child.mut_data(document).parent = Some(*self);
        let children = &mut self.mut_data(document).children;
        match index {
            Some(index) => children.insert(index, child),
            None => children.push(child),
        }
    }

    /// Equivalent to `vec.push()`. Returns `child` for chaining.
    ///
    /// # Errors
    ///
    /// - [`Error::RootCannotMove`]: `child` is the document root.
    /// - [`Error::HasAParent`]: `child` must not have a parent.
    /// Call `node.detach()` before.
    /// - [`Error::CyclicTree`]: `child` is `self` or one of its ancestors.
    pub fn push_child(&self, document: &mut Document, child: Node) -> Result<Node> {
        self.check_attachable(document, child)?;
        self.attach(document, None, child);
        Ok(child)
    }

    /// Equivalent to `vec.insert()`. Returns `child` for chaining.
    ///
    /// # Errors
    ///
    /// Same as [`Node::push_child`], and [`Error::IndexOutOfBounds`] if `index > len`.
    pub fn insert_child(&self, document: &mut Document, index: usize, child: Node) -> Result<Node> {
        let len = self.children(document).len();
        if index > len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        self.check_attachable(document, child)?;
        self.attach(document, Some(index), child);
        Ok(child)
    }

    /// Remove child at `index`. The removed node keeps its subtree and can be attached again.
    pub fn remove_child(&self, document: &mut Document, index: usize) -> Option<Node> {
        let children = &mut self.mut_data(document).children;
        if index >= children.len() {
            return None;
        }
        let child = children.remove(index);
        child.mut_data(document).parent = None;
        Some(child)
    }

    /// Remove this node from its parent. Does nothing if it has no parent.
    pub fn detach(&self, document: &mut Document) {
        if let Some(parent) = self.parent(document) {
            if let Some(pos) = parent.children(document).iter().position(|n| n == self) {
                parent.remove_child(document, pos);
            }
        }
    }
}

// Search
impl Node {
    fn is_element_named(&self, document: &Document, name: &str) -> bool {
        let data = self.data(document);
        !data.is_comment && data.name == name
    }

    fn has_attributes(&self, document: &Document, required: &[(&str, &str)]) -> bool {
        required
            .iter()
            .all(|(name, value)| self.attribute_value(document, name) == Some(*value))
    }

    /// First child element named `name`.
    pub fn find(&self, document: &Document, name: &str) -> Option<Node> {
        self.children(document)
            .iter()
            .find(|n| n.is_element_named(document, name))
            .copied()
    }

    /// All child elements named `name`, in document order.
    pub fn find_all(&self, document: &Document, name: &str) -> Vec<Node> {
        self.children(document)
            .iter()
            .filter(|n| n.is_element_named(document, name))
            .copied()
            .collect()
    }

    /// Removes the first child element named `name` and returns it.
    pub fn remove_first_child_by_name(&self, document: &mut Document, name: &str) -> Option<Node> {
        let pos = self
            .children(document)
            .iter()
            .position(|n| n.is_element_named(document, name))?;
        self.remove_child(document, pos)
    }

    /// Search for an element named `name` having all `attributes`.
    ///
    /// Direct children are checked first. If none of them match,
    /// each child's subtree is searched in order and the first match is returned.
    pub fn find_with_attributes(
        &self,
        document: &Document,
        name: &str,
        attributes: &[(&str, &str)],
    ) -> Option<Node> {
        let children = self.children(document);
        children
            .iter()
            .find(|n| n.is_element_named(document, name) && n.has_attributes(document, attributes))
            .copied()
            .or_else(|| {
                children
                    .iter()
                    .find_map(|n| n.find_with_attributes(document, name, attributes))
            })
    }

    /// Returns `self` if its text contains `text`,
    /// otherwise the first descendant in document order whose text does. Comments are searched too.
    pub fn find_by_text_content(&self, document: &Document, text: &str) -> Option<Node> {
        let matches = self
            .text_content(document)
            .map_or(false, |content| content.contains(text));
        if matches {
            return Some(*self);
        }
        self.children(document)
            .iter()
            .find_map(|n| n.find_by_text_content(document, text))
    }
}

/// Builder returned by [`Node::build`].
#[derive(Debug, Clone)]
pub struct NodeBuilder {
    name: String,
    text: Option<String>,
    attributes: Vec<Attribute>,
    namespace_decls: Vec<Attribute>,
}

impl NodeBuilder {
    pub fn attribute<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    pub fn namespace_decl<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.namespace_decls.push(Attribute::new(name, value));
        self
    }

    pub fn text_content<S: Into<String>>(mut self, text: S) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Leave text unset, so that the element is written as `<tag/>` while it has no children.
    pub fn no_text(mut self) -> Self {
        self.text = None;
        self
    }

    pub fn finish(self, document: &mut Document) -> Node {
        Node::with_data(
            document,
            self.name,
            self.text,
            self.attributes,
            self.namespace_decls,
            false,
        )
    }

    /// Create the element and push it to `parent`.
    pub fn push_to(self, document: &mut Document, parent: Node) -> Node {
        let node = self.finish(document);
        parent.attach(document, None, node);
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_root(name: &str) -> (Document, Node) {
        let mut doc = Document::new();
        let root = Node::new(&mut doc, name);
        doc.set_root(root).unwrap();
        (doc, root)
    }

    #[test]
    fn test_set_attribute_does_not_create() {
        let (mut doc, root) = doc_with_root("root");
        assert!(!root.set_attribute(&mut doc, "x", "v"));
        assert!(root.attributes(&doc).is_empty());
        assert!(!root.contains_attribute(&doc, "x"));
    }

    #[test]
    fn test_duplicate_attributes_first_match() {
        let (mut doc, root) = doc_with_root("root");
        root.add_attribute(&mut doc, "x", "1");
        root.add_attribute(&mut doc, "x", "2");
        assert!(root.set_attribute(&mut doc, "x", "changed"));
        let values: Vec<&str> = root.attributes(&doc).iter().map(|a| a.value()).collect();
        assert_eq!(values, vec!["changed", "2"]);

        let removed = root.remove_attribute(&mut doc, "x").unwrap();
        assert_eq!(removed.value(), "changed");
        assert_eq!(root.attribute_value(&doc, "x"), Some("2"));
        root.remove_attribute(&mut doc, "x");
        assert!(root.remove_attribute(&mut doc, "x").is_none());
    }

    #[test]
    fn test_text_content() {
        let (mut doc, root) = doc_with_root("root");
        assert_eq!(root.text_content(&doc), Some(""));
        root.add_text_content(&mut doc, "  a ");
        root.add_text_content(&mut doc, "b\n");
        assert_eq!(root.text_content(&doc), Some("  a b\n"));
        root.trim_text_content(&mut doc);
        assert_eq!(root.text_content(&doc), Some("a b"));
        root.clear_text_content(&mut doc);
        assert_eq!(root.text_content(&doc), None);
        root.trim_text_content(&mut doc);
        assert_eq!(root.text_content(&doc), None);
        root.add_text_content(&mut doc, "x");
        assert_eq!(root.text_content(&doc), Some("x"));
    }

    #[test]
    fn test_trim_control_characters_only() {
        let (mut doc, root) = doc_with_root("root");
        root.set_text_content(&mut doc, "\u{0}\r\n\t \u{a0}text\u{2003} \u{1f}");
        root.trim_text_content(&mut doc);
        assert_eq!(root.text_content(&doc), Some("\u{a0}text\u{2003}"));
    }

    #[test]
    fn test_push_and_insert_child() {
        let (mut doc, root) = doc_with_root("root");
        let a = Node::new(&mut doc, "a");
        let b = Node::new(&mut doc, "b");
        let c = Node::new(&mut doc, "c");
        assert_eq!(root.push_child(&mut doc, a).unwrap(), a);
        root.push_child(&mut doc, c).unwrap();
        root.insert_child(&mut doc, 1, b).unwrap();
        assert_eq!(root.children(&doc), &[a, b, c]);
        assert_eq!(b.parent(&doc), Some(root));
        assert_eq!(root.first_child(&doc), Some(a));
        assert_eq!(root.child_at(&doc, 2), Some(c));
        assert_eq!(root.child_at(&doc, 3), None);

        let d = Node::new(&mut doc, "d");
        assert!(matches!(
            root.insert_child(&mut doc, 5, d),
            Err(Error::IndexOutOfBounds { index: 5, len: 3 })
        ));
        assert!(!d.has_parent(&doc));
    }

    #[test]
    fn test_push_child_errors() {
        let (mut doc, root) = doc_with_root("root");
        let a = Node::new(&mut doc, "a");
        let b = Node::new(&mut doc, "b");
        root.push_child(&mut doc, a).unwrap();
        a.push_child(&mut doc, b).unwrap();

        assert!(matches!(root.push_child(&mut doc, b), Err(Error::HasAParent)));
        assert!(matches!(b.push_child(&mut doc, root), Err(Error::RootCannotMove)));

        a.detach(&mut doc);
        assert!(matches!(a.push_child(&mut doc, a), Err(Error::CyclicTree)));
        assert!(matches!(b.push_child(&mut doc, a), Err(Error::CyclicTree)));
        assert!(!a.has_parent(&doc));
        assert!(root.children(&doc).is_empty());
    }

    #[test]
    fn test_remove_child() {
        let (mut doc, root) = doc_with_root("root");
        let a = Node::new(&mut doc, "a");
        root.push_child(&mut doc, a).unwrap();
        assert_eq!(root.remove_child(&mut doc, 1), None);
        assert_eq!(root.remove_child(&mut doc, 0), Some(a));
        assert!(!a.has_parent(&doc));
        // detached nodes can move again
        root.push_child(&mut doc, a).unwrap();
        assert_eq!(a.parent(&doc), Some(root));
    }

    #[test]
    fn test_find_skips_comments() {
        let (mut doc, root) = doc_with_root("root");
        let comment = Node::comment(&mut doc, "item");
        root.push_child(&mut doc, comment).unwrap();
        let first = Node::new(&mut doc, "item");
        let second = Node::new(&mut doc, "item");
        root.push_child(&mut doc, first).unwrap();
        root.push_child(&mut doc, second).unwrap();
        // a comment's name is empty
        assert_eq!(root.find(&doc, ""), None);
        assert_eq!(root.find(&doc, "item"), Some(first));
        assert_eq!(root.find_all(&doc, "item"), vec![first, second]);
        assert_eq!(root.child_elements(&doc), vec![first, second]);

        assert_eq!(root.remove_first_child_by_name(&mut doc, "item"), Some(first));
        assert_eq!(root.children(&doc), &[comment, second]);
        assert_eq!(root.remove_first_child_by_name(&mut doc, "missing"), None);
    }

    #[test]
    fn test_find_with_attributes() {
        let (mut doc, root) = doc_with_root("root");
        let left = Node::build("group").push_to(&mut doc, root);
        let right = Node::build("group").push_to(&mut doc, root);
        let deep = Node::build("field")
            .attribute("name", "title")
            .attribute("lang", "en")
            .push_to(&mut doc, left);
        Node::build("field")
            .attribute("name", "title")
            .attribute("lang", "en")
            .push_to(&mut doc, right);
        let other = Node::build("field")
            .attribute("name", "title")
            .push_to(&mut doc, root);

        // direct children win over deeper matches
        assert_eq!(
            root.find_with_attributes(&doc, "field", &[("name", "title")]),
            Some(other)
        );
        // otherwise the first subtree in document order
        assert_eq!(
            root.find_with_attributes(&doc, "field", &[("name", "title"), ("lang", "en")]),
            Some(deep)
        );
        assert_eq!(
            root.find_with_attributes(&doc, "field", &[("lang", "fr")]),
            None
        );
        assert_eq!(root.find_with_attributes(&doc, "group", &[]), Some(left));
    }

    #[test]
    fn test_find_by_text_content() {
        let (mut doc, root) = doc_with_root("root");
        let a = Node::build("a").push_to(&mut doc, root);
        let b = Node::build("b").text_content("needle here").push_to(&mut doc, a);
        let c = Node::build("c").text_content("another needle").push_to(&mut doc, root);
        assert_eq!(root.find_by_text_content(&doc, "needle"), Some(b));
        assert_eq!(c.find_by_text_content(&doc, "needle"), Some(c));
        assert_eq!(root.find_by_text_content(&doc, "hay"), None);
        root.set_text_content(&mut doc, "needle in root");
        assert_eq!(root.find_by_text_content(&doc, "needle"), Some(root));
    }

    #[test]
    fn test_children_recursive() {
        let (mut doc, root) = doc_with_root("outer");
        let middle = Node::build("middle").push_to(&mut doc, root);
        let inner = Node::build("inner").push_to(&mut doc, middle);
        let comment = Node::comment(&mut doc, "c");
        middle.push_child(&mut doc, comment).unwrap();
        let after = Node::build("after").push_to(&mut doc, root);
        assert_eq!(
            root.children_recursive(&doc),
            vec![middle, inner, comment, after]
        );
        assert!(comment.is_comment(&doc));
        assert_eq!(comment.name(&doc), "");
    }
}
