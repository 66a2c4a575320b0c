//! Tree builder for template markup.
//!
//! Consumes the lexer's token stream and produces a [`Document`]. The builder
//! never fails; malformed markup is recovered with these rules:
//! - void elements (`input`, `br`, ...) never take children, and `/>` is only
//!   honoured on them
//! - an end tag closes the nearest open element with the same name; elements
//!   opened after it are closed implicitly and their span ends where that end
//!   tag starts
//! - an end tag with no matching open element is ignored
//! - elements still open at end of input end at the source length
//! - adjacent text merges into a single text node

use crate::token::{Token, TokenKind};
use crate::{Document, Location, NodeData, NodeId, NodeKind, Span};

/// Elements that never have content or an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Build a document from a token stream.
pub fn build(tokens: Vec<Token>) -> Document {
    let mut builder = TreeBuilder::new();
    builder.build(tokens)
}

struct TreeBuilder {
    document: Document,
    open_elements: Vec<NodeId>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            document: Document::new(),
            open_elements: Vec::new(),
        }
    }

    fn build(&mut self, tokens: Vec<Token>) -> Document {
        for token in tokens {
            match token.kind {
                TokenKind::Text(text) => self.insert_text(text, token.span, token.location),
                TokenKind::Comment(data) => {
                    let parent = self.current_node();
                    self.document
                        .append(parent, NodeData::comment(data, token.span, token.location));
                }
                TokenKind::Doctype(data) => {
                    let parent = self.current_node();
                    self.document
                        .append(parent, NodeData::doctype(data, token.span, token.location));
                }
                TokenKind::StartTag { name, attrs, .. } => {
                    let parent = self.current_node();
                    let void = is_void_element(&name);
                    let id = self.document.append(
                        parent,
                        NodeData::element(name, attrs, token.span, token.location),
                    );
                    if !void {
                        self.open_elements.push(id);
                    }
                }
                TokenKind::EndTag { name } => self.close_element(&name, token.span),
                TokenKind::Eof => self.close_all(token.span.start),
            }
        }

        std::mem::replace(&mut self.document, Document::new())
    }

    fn current_node(&self) -> NodeId {
        self.open_elements
            .last()
            .copied()
            .unwrap_or_else(|| self.document.root())
    }

    fn insert_text(&mut self, text: String, span: Span, location: Location) {
        let parent = self.current_node();

        if let Some(last) = self.document.last_child(parent) {
            let data = self.document.data_mut(last);
            if data.kind == NodeKind::Text {
                data.data.push_str(&text);
                if let Some(existing) = data.span.as_mut() {
                    existing.end = span.end;
                }
                return;
            }
        }

        self.document
            .append(parent, NodeData::text(text, span, location));
    }

    fn close_element(&mut self, name: &str, end_tag: Span) {
        let Some(position) = self
            .open_elements
            .iter()
            .rposition(|&id| self.document.data(id).name == name)
        else {
            return;
        };

        for id in self.open_elements.drain(position + 1..) {
            set_end(&mut self.document, id, end_tag.start);
        }
        if let Some(id) = self.open_elements.pop() {
            set_end(&mut self.document, id, end_tag.end);
        }
    }

    fn close_all(&mut self, end: usize) {
        for id in self.open_elements.drain(..) {
            set_end(&mut self.document, id, end);
        }
    }
}

fn set_end(document: &mut Document, id: NodeId, end: usize) {
    if let Some(span) = document.data_mut(id).span.as_mut() {
        span.end = end;
    }
}
