//! Span-annotated markup tree for tpl-i18n templates.
//!
//! Templates are HTML-like markup. Parsing never fails: malformed input is
//! recovered into a tree using a small, fixed set of rules (see [`parser`]),
//! and every node produced from source text remembers the byte range it came
//! from so callers can splice the original text.
//!
//! # Example
//!
//! ```rust
//! let document = tpl_i18n_ast::parse("<p>hello <b>world</b></p>");
//! let names: Vec<_> = tpl_i18n_ast::traverse(&document, [document.root()])
//!     .map(|node| node.name().to_string())
//!     .collect();
//! assert_eq!(names, ["p", "#text", "b", "#text"]);
//! ```

pub mod lexer;
pub mod parser;
pub mod serialize;
pub mod token;
pub mod walk;

use std::ops::Range;

pub use walk::{traverse, Ancestors, Traverse};

// ============================================================================
// Location
// ============================================================================

/// Location in source code (1-indexed line and column, 0-indexed byte offset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line: usize,
    pub column: usize,
    pub byte_offset: usize,
}

impl Location {
    pub fn new(line: usize, column: usize, byte_offset: usize) -> Self {
        Self {
            line,
            column,
            byte_offset,
        }
    }
}

/// Half-open byte range `[start, end)` into the original source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if `other` lies entirely within this span.
    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// Name reported for the synthetic document root.
pub const DOCUMENT_NAME: &str = "#document";
/// Name reported for text nodes.
pub const TEXT_NAME: &str = "#text";
/// Name reported for comment nodes.
pub const COMMENT_NAME: &str = "#comment";
/// Name reported for doctype nodes.
pub const DOCTYPE_NAME: &str = "#documentType";

/// Index of a node inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element,
    Text,
    Comment,
    Doctype,
}

/// An attribute as it appears on a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Lowercased attribute name.
    pub name: String,
    /// Value with character references decoded. Empty for bare attributes.
    pub value: String,
    /// Raw value range in the source, excluding quotes. `None` for bare attributes.
    pub value_span: Option<Span>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    kind: NodeKind,
    name: String,
    data: String,
    attrs: Vec<Attribute>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    span: Option<Span>,
    location: Location,
}

impl NodeData {
    pub(crate) fn element(name: String, attrs: Vec<Attribute>, span: Span, location: Location) -> Self {
        Self::new(NodeKind::Element, name, String::new(), attrs, Some(span), location)
    }

    pub(crate) fn text(data: String, span: Span, location: Location) -> Self {
        Self::new(NodeKind::Text, TEXT_NAME.to_string(), data, Vec::new(), Some(span), location)
    }

    pub(crate) fn comment(data: String, span: Span, location: Location) -> Self {
        Self::new(NodeKind::Comment, COMMENT_NAME.to_string(), data, Vec::new(), Some(span), location)
    }

    pub(crate) fn doctype(data: String, span: Span, location: Location) -> Self {
        Self::new(NodeKind::Doctype, DOCTYPE_NAME.to_string(), data, Vec::new(), Some(span), location)
    }

    fn new(
        kind: NodeKind,
        name: String,
        data: String,
        attrs: Vec<Attribute>,
        span: Option<Span>,
        location: Location,
    ) -> Self {
        Self {
            kind,
            name,
            data,
            attrs,
            children: Vec::new(),
            parent: None,
            span,
            location,
        }
    }
}

/// A parsed template: an arena of nodes rooted at a synthetic `#document` node.
///
/// Children are owned by position in the arena; `parent` links are plain
/// indices used only for upward navigation.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Document {
    pub(crate) fn new() -> Self {
        let root = NodeData::new(
            NodeKind::Document,
            DOCUMENT_NAME.to_string(),
            String::new(),
            Vec::new(),
            None,
            Location::new(1, 1, 0),
        );
        Self { nodes: vec![root] }
    }

    /// The `#document` node. It has no span.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Top-level nodes of the template, in document order.
    pub fn top_level(&self) -> &[NodeId] {
        &self.nodes[0].children
    }

    pub fn get(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { document: self, id }
    }

    /// Number of nodes, including the document root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub(crate) fn append(&mut self, parent: NodeId, mut data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        data.parent = Some(parent);
        self.nodes.push(data);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub(crate) fn last_child(&self, parent: NodeId) -> Option<NodeId> {
        self.nodes[parent.0].children.last().copied()
    }

    pub(crate) fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    pub(crate) fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }
}

/// Borrowed handle to one node of a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    document: &'a Document,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'a Document {
        self.document
    }

    pub fn kind(&self) -> NodeKind {
        self.data().kind
    }

    /// Lowercased tag name for elements, `#text`, `#comment`,
    /// `#documentType` or `#document` otherwise.
    pub fn name(&self) -> &'a str {
        &self.data().name
    }

    pub fn is_element(&self) -> bool {
        self.kind() == NodeKind::Element
    }

    /// Decoded content of text, comment and doctype nodes.
    pub fn text(&self) -> Option<&'a str> {
        match self.kind() {
            NodeKind::Text | NodeKind::Comment | NodeKind::Doctype => Some(&self.data().data),
            NodeKind::Element | NodeKind::Document => None,
        }
    }

    pub fn attrs(&self) -> &'a [Attribute] {
        &self.data().attrs
    }

    pub fn attr(&self, name: &str) -> Option<&'a Attribute> {
        self.attrs().iter().find(|attr| attr.name == name)
    }

    pub fn span(&self) -> Option<Span> {
        self.data().span
    }

    pub fn location(&self) -> Location {
        self.data().location
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.data().parent.map(|id| self.document.get(id))
    }

    pub fn children(&self) -> impl DoubleEndedIterator<Item = NodeRef<'a>> + 'a {
        let document = self.document;
        self.data().children.iter().map(move |&id| document.get(id))
    }

    /// Parent chain, nearest first, ending with the document root.
    pub fn ancestors(&self) -> Ancestors<'a> {
        Ancestors::new(self.parent())
    }

    pub fn has_ancestor(&self, name: &str) -> bool {
        self.ancestors().any(|ancestor| ancestor.name() == name)
    }

    fn data(&self) -> &'a NodeData {
        self.document.data(self.id)
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.document, other.document) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

// ============================================================================
// Parsing
// ============================================================================

/// Parse template source into a span-annotated tree.
pub fn parse(source: &str) -> Document {
    let tokens = lexer::tokenize(source);
    parser::build(tokens)
}

// ============================================================================
// Tests
// ============================================================================
