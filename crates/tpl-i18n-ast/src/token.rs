//! Token types for the markup lexer.

use crate::{Attribute, Location, Span};

/// Token payloads produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// `<name attr=value ...>` or `<name ... />`
    StartTag {
        name: String,
        attrs: Vec<Attribute>,
        self_closing: bool,
    },
    /// `</name>`
    EndTag { name: String },
    /// Character data with references decoded.
    Text(String),
    /// `<!-- ... -->`, or a bogus comment such as `<? ... >`.
    Comment(String),
    /// `<!DOCTYPE ...>`
    Doctype(String),
    /// End of input
    Eof,
}

/// A token with its payload, source range, and start location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub location: Location,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, location: Location) -> Self {
        Self {
            kind,
            span,
            location,
        }
    }
}
