//! Hand-written lexer for template markup.
//!
//! Three-mode state machine over the source bytes:
//! - Data mode: accumulates text until something that opens markup
//!   (`<` followed by a letter, `/`, `!` or `?`)
//! - Tag mode: start tags with attributes, end tags, comments, doctypes
//! - Raw text mode: the content of `script`-like elements, up to the
//!   matching end tag
//!
//! A tag cut off by the end of input produces no token.

use crate::token::{Token, TokenKind};
use crate::{Attribute, Location, Span};

/// Elements whose content is never parsed as markup.
pub(crate) const RAW_TEXT_ELEMENTS: &[&str] =
    &["script", "style", "xmp", "iframe", "noembed", "noframes"];

/// Elements whose content is text with character references.
const ESCAPABLE_RAW_TEXT_ELEMENTS: &[&str] = &["textarea", "title"];

const NAMED_REFERENCES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
    ("copy", '\u{a9}'),
    ("reg", '\u{ae}'),
];

/// Longest reference body we try to decode (`#x10FFFF` fits comfortably).
const MAX_REFERENCE_LEN: usize = 10;

/// Tokenize a source string into a sequence of tokens ending with `Eof`.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    lexer.tokenize()
}

/// Decode character references (`&amp;`, `&#39;`, `&#x4e2d;` ...).
///
/// Unknown or unterminated references are kept literally.
pub fn decode_character_references(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut output = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(index) = rest.find('&') {
        output.push_str(&rest[..index]);
        rest = &rest[index..];
        match decode_reference(rest) {
            Some((ch, len)) => {
                output.push(ch);
                rest = &rest[len..];
            }
            None => {
                output.push('&');
                rest = &rest[1..];
            }
        }
    }
    output.push_str(rest);
    output
}

/// Decode one reference at the start of `input` (which begins with `&`).
/// Returns the character and the number of bytes consumed.
fn decode_reference(input: &str) -> Option<(char, usize)> {
    let semicolon = input[1..].find(';')? + 1;
    if semicolon - 1 > MAX_REFERENCE_LEN {
        return None;
    }
    let body = &input[1..semicolon];

    let ch = if let Some(number) = body.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
                u32::from_str_radix(hex, 16).ok()?
            }
            Some(_) => return None,
            None if !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()) => {
                number.parse::<u32>().ok()?
            }
            None => return None,
        };
        char::from_u32(code)?
    } else {
        NAMED_REFERENCES
            .iter()
            .find(|(name, _)| *name == body)
            .map(|(_, ch)| *ch)?
    };

    Some((ch, semicolon + 1))
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
}

fn is_continuation_byte(b: u8) -> bool {
    b & 0xC0 == 0x80
}

struct RawText {
    end_name: String,
    decode: bool,
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
    raw_text: Option<RawText>,
}

impl<'a> Lexer<'a> {
    const COMMENT_OPEN: &'static [u8] = b"<!--";
    const COMMENT_CLOSE: &'static str = "-->";
    const DOCTYPE_OPEN: &'static [u8] = b"<!doctype";

    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
            raw_text: None,
        }
    }

    fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while self.pos < self.bytes.len() {
            if let Some(raw_text) = self.raw_text.take() {
                self.tokenize_raw_text(&mut tokens, &raw_text);
            } else if self.at_markup() {
                self.tokenize_markup(&mut tokens);
            } else {
                self.tokenize_text(&mut tokens);
            }
        }

        let eof_loc = self.location();
        tokens.push(Token::new(
            TokenKind::Eof,
            Span::new(self.pos, self.pos),
            eof_loc,
        ));
        tokens
    }

    /// Data mode: everything up to the next markup opener.
    fn tokenize_text(&mut self, tokens: &mut Vec<Token>) {
        let start = self.pos;
        let loc = self.location();

        // The current byte is known not to open markup, even if it is `<`.
        self.advance_one();
        while self.pos < self.bytes.len() && !self.at_markup() {
            self.advance_one();
        }

        let raw = &self.source[start..self.pos];
        tokens.push(Token::new(
            TokenKind::Text(decode_character_references(raw)),
            Span::new(start, self.pos),
            loc,
        ));
    }

    fn tokenize_markup(&mut self, tokens: &mut Vec<Token>) {
        let start = self.pos;
        let loc = self.location();

        match self.peek_at(1) {
            Some(b'!') if self.looking_at(Self::COMMENT_OPEN) => {
                self.tokenize_comment(tokens, start, loc)
            }
            Some(b'!') if self.looking_at_ignore_case(Self::DOCTYPE_OPEN) => {
                self.tokenize_doctype(tokens, start, loc)
            }
            Some(b'!') => self.tokenize_bogus_comment(tokens, start + 2, start, loc),
            Some(b'?') => self.tokenize_bogus_comment(tokens, start + 1, start, loc),
            Some(b'/') => self.tokenize_end_tag(tokens, start, loc),
            _ => self.tokenize_start_tag(tokens, start, loc),
        }
    }

    fn tokenize_comment(&mut self, tokens: &mut Vec<Token>, start: usize, loc: Location) {
        let data_start = start + Self::COMMENT_OPEN.len();
        let rest = &self.source[data_start..];

        // `<!-->` and `<!--->` are complete, empty comments.
        let (data_end, end) = if rest.starts_with('>') {
            (data_start, data_start + 1)
        } else if rest.starts_with("->") {
            (data_start, data_start + 2)
        } else {
            match rest.find(Self::COMMENT_CLOSE) {
                Some(index) => (
                    data_start + index,
                    data_start + index + Self::COMMENT_CLOSE.len(),
                ),
                None => (self.bytes.len(), self.bytes.len()),
            }
        };

        let data = self.source[data_start..data_end].to_string();
        self.advance_to(end);
        tokens.push(Token::new(TokenKind::Comment(data), Span::new(start, end), loc));
    }

    fn tokenize_doctype(&mut self, tokens: &mut Vec<Token>, start: usize, loc: Location) {
        let data_start = start + Self::DOCTYPE_OPEN.len();
        let (data_end, end) = match self.find_tag_end(data_start) {
            Some(index) => (index, index + 1),
            None => (self.bytes.len(), self.bytes.len()),
        };

        let data = self.source[data_start..data_end].trim().to_string();
        self.advance_to(end);
        tokens.push(Token::new(TokenKind::Doctype(data), Span::new(start, end), loc));
    }

    /// `<!...>`, `<?...>` and `</` followed by a non-letter.
    fn tokenize_bogus_comment(
        &mut self,
        tokens: &mut Vec<Token>,
        data_start: usize,
        start: usize,
        loc: Location,
    ) {
        let (data_end, end) = match self.find_tag_end(data_start) {
            Some(index) => (index, index + 1),
            None => (self.bytes.len(), self.bytes.len()),
        };

        let data = self.source[data_start..data_end].to_string();
        self.advance_to(end);
        tokens.push(Token::new(TokenKind::Comment(data), Span::new(start, end), loc));
    }

    fn tokenize_end_tag(&mut self, tokens: &mut Vec<Token>, start: usize, loc: Location) {
        let name_start = start + 2;
        match self.bytes[name_start] {
            b'>' => {
                // `</>` is dropped entirely.
                self.advance_to(name_start + 1);
                return;
            }
            b if !b.is_ascii_alphabetic() => {
                self.tokenize_bogus_comment(tokens, name_start, start, loc);
                return;
            }
            _ => {}
        }

        let name_end = self.scan_name(name_start);
        let name = self.source[name_start..name_end].to_ascii_lowercase();

        let Some(close) = self.find_tag_end(name_end) else {
            self.advance_to(self.bytes.len());
            return;
        };
        self.advance_to(close + 1);
        tokens.push(Token::new(
            TokenKind::EndTag { name },
            Span::new(start, self.pos),
            loc,
        ));
    }

    fn tokenize_start_tag(&mut self, tokens: &mut Vec<Token>, start: usize, loc: Location) {
        let name_end = self.scan_name(start + 1);
        let name = self.source[start + 1..name_end].to_ascii_lowercase();
        self.advance_to(name_end);

        let mut attrs: Vec<Attribute> = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return,
                Some(b'>') => {
                    self.advance_one();
                    break;
                }
                Some(b'/') => {
                    self.advance_one();
                    if self.peek() == Some(b'>') {
                        self.advance_one();
                        self_closing = true;
                        break;
                    }
                }
                Some(_) => {
                    let attr = self.tokenize_attribute();
                    // Later duplicates are dropped.
                    if !attrs.iter().any(|existing| existing.name == attr.name) {
                        attrs.push(attr);
                    }
                }
            }
        }

        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            self.raw_text = Some(RawText {
                end_name: name.clone(),
                decode: false,
            });
        } else if ESCAPABLE_RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            self.raw_text = Some(RawText {
                end_name: name.clone(),
                decode: true,
            });
        }

        tokens.push(Token::new(
            TokenKind::StartTag {
                name,
                attrs,
                self_closing,
            },
            Span::new(start, self.pos),
            loc,
        ));
    }

    fn tokenize_attribute(&mut self) -> Attribute {
        let location = self.location();
        let name_start = self.pos;

        // The first character may be anything, including `=`.
        self.advance_one();
        while let Some(b) = self.peek() {
            if is_whitespace(b) || matches!(b, b'/' | b'>' | b'=') {
                break;
            }
            self.advance_one();
        }
        let name = self.source[name_start..self.pos].to_ascii_lowercase();

        self.skip_whitespace();
        if self.peek() != Some(b'=') {
            return Attribute {
                name,
                value: String::new(),
                value_span: None,
                location,
            };
        }
        self.advance_one();
        self.skip_whitespace();

        let (value_start, value_end) = match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.advance_one();
                let value_start = self.pos;
                let value_end = self.bytes[value_start..]
                    .iter()
                    .position(|&b| b == quote)
                    .map_or(self.bytes.len(), |index| value_start + index);
                self.advance_to(value_end);
                // closing quote
                self.advance_one();
                (value_start, value_end)
            }
            _ => {
                let value_start = self.pos;
                while let Some(b) = self.peek() {
                    if is_whitespace(b) || b == b'>' {
                        break;
                    }
                    self.advance_one();
                }
                (value_start, self.pos)
            }
        };

        Attribute {
            name,
            value: decode_character_references(&self.source[value_start..value_end]),
            value_span: Some(Span::new(value_start, value_end)),
            location,
        }
    }

    /// Raw text mode: everything up to `</name` followed by a tag delimiter.
    fn tokenize_raw_text(&mut self, tokens: &mut Vec<Token>, raw_text: &RawText) {
        let start = self.pos;
        let loc = self.location();
        let end = self.find_raw_text_end(&raw_text.end_name);
        self.advance_to(end);

        if end > start {
            let text = &self.source[start..end];
            let data = if raw_text.decode {
                decode_character_references(text)
            } else {
                text.to_string()
            };
            tokens.push(Token::new(TokenKind::Text(data), Span::new(start, end), loc));
        }
    }

    fn find_raw_text_end(&self, name: &str) -> usize {
        let name = name.as_bytes();
        let mut from = self.pos;

        while let Some(offset) = self.bytes[from..].iter().position(|&b| b == b'<') {
            let at = from + offset;
            let after = at + 2 + name.len();
            let closes = self.bytes.get(at + 1) == Some(&b'/')
                && self
                    .bytes
                    .get(at + 2..after)
                    .map_or(false, |candidate| candidate.eq_ignore_ascii_case(name))
                && self
                    .bytes
                    .get(after)
                    .map_or(true, |&b| is_whitespace(b) || b == b'/' || b == b'>');
            if closes {
                return at;
            }
            from = at + 1;
        }

        self.bytes.len()
    }

    /// Check whether the current position opens markup rather than text.
    fn at_markup(&self) -> bool {
        if self.peek() != Some(b'<') {
            return false;
        }
        match self.peek_at(1) {
            Some(b'/') => self.peek_at(2).is_some(),
            Some(b) => b.is_ascii_alphabetic() || b == b'!' || b == b'?',
            None => false,
        }
    }

    /// End of a tag or element name starting at `from`.
    fn scan_name(&self, from: usize) -> usize {
        self.bytes[from..]
            .iter()
            .position(|&b| is_whitespace(b) || b == b'/' || b == b'>')
            .map_or(self.bytes.len(), |index| from + index)
    }

    /// Index of the next `>` at or after `from`.
    fn find_tag_end(&self, from: usize) -> Option<usize> {
        self.bytes[from..]
            .iter()
            .position(|&b| b == b'>')
            .map(|index| from + index)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn looking_at(&self, pattern: &[u8]) -> bool {
        self.bytes[self.pos..].starts_with(pattern)
    }

    fn looking_at_ignore_case(&self, pattern: &[u8]) -> bool {
        self.bytes
            .get(self.pos..self.pos + pattern.len())
            .map_or(false, |candidate| candidate.eq_ignore_ascii_case(pattern))
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, is_whitespace) {
            self.advance_one();
        }
    }

    fn location(&self) -> Location {
        Location::new(self.line, self.col, self.pos)
    }

    /// Advance position by one byte, updating line/column tracking.
    fn advance_one(&mut self) {
        if let Some(&b) = self.bytes.get(self.pos) {
            if b == b'\n' {
                self.line += 1;
                self.col = 1;
            } else if !is_continuation_byte(b) {
                self.col += 1;
            }
            self.pos += 1;
        }
    }

    fn advance_to(&mut self, target: usize) {
        while self.pos < target && self.pos < self.bytes.len() {
            self.advance_one();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    fn start_tag(name: &str) -> TokenKind {
        TokenKind::StartTag {
            name: name.to_string(),
            attrs: Vec::new(),
            self_closing: false,
        }
    }

    fn end_tag(name: &str) -> TokenKind {
        TokenKind::EndTag {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(
            kinds("Hello, World!"),
            vec![TokenKind::Text("Hello, World!".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_element() {
        let tokens = tokenize("<lang>中文</lang>");
        assert_eq!(tokens[0].kind, start_tag("lang"));
        assert_eq!(tokens[0].span, Span::new(0, 6));
        assert_eq!(tokens[1].kind, TokenKind::Text("中文".to_string()));
        assert_eq!(tokens[1].span, Span::new(6, 12));
        assert_eq!(tokens[2].kind, end_tag("lang"));
        assert_eq!(tokens[2].span, Span::new(12, 19));
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn test_tag_names_are_lowercased() {
        assert_eq!(
            kinds("<LANG></Lang>"),
            vec![start_tag("lang"), end_tag("lang"), TokenKind::Eof]
        );
    }

    #[test]
    fn test_attribute_quoting_styles() {
        let tokens = tokenize(r#"<input a="<lang>x</lang>" b='y' c=z d>"#);
        let TokenKind::StartTag { attrs, .. } = &tokens[0].kind else {
            panic!("expected start tag");
        };
        let values: Vec<_> = attrs
            .iter()
            .map(|a| (a.name.as_str(), a.value.as_str()))
            .collect();
        assert_eq!(
            values,
            vec![("a", "<lang>x</lang>"), ("b", "y"), ("c", "z"), ("d", "")]
        );
        assert_eq!(attrs[0].value_span, Some(Span::new(10, 24)));
        assert_eq!(attrs[1].value_span, Some(Span::new(29, 30)));
        assert_eq!(attrs[2].value_span, Some(Span::new(34, 35)));
        assert_eq!(attrs[3].value_span, None);
    }

    #[test]
    fn test_self_closing_flag() {
        let tokens = tokenize(r#"<input type="button" />"#);
        match &tokens[0].kind {
            TokenKind::StartTag { self_closing, .. } => assert!(*self_closing),
            other => panic!("expected start tag, got {other:?}"),
        }
        assert_eq!(tokens[0].span, Span::new(0, 23));
    }

    #[test]
    fn test_duplicate_attribute_keeps_first() {
        let tokens = tokenize(r#"<a title="one" TITLE="two">"#);
        let TokenKind::StartTag { attrs, .. } = &tokens[0].kind else {
            panic!("expected start tag");
        };
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].value, "one");
    }

    #[test]
    fn test_comment_and_doctype() {
        assert_eq!(
            kinds("<!DOCTYPE html><!-- <lang>x</lang> -->"),
            vec![
                TokenKind::Doctype("html".to_string()),
                TokenKind::Comment(" <lang>x</lang> ".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_bogus_comments() {
        assert_eq!(
            kinds("<?xml version=\"1.0\"?></ 1>"),
            vec![
                TokenKind::Comment("?xml version=\"1.0\"?".to_string()),
                TokenKind::Comment(" 1".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        assert_eq!(
            kinds("a < b <"),
            vec![TokenKind::Text("a < b <".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_empty_end_tag_is_dropped() {
        assert_eq!(
            kinds("a</>b"),
            vec![
                TokenKind::Text("a".to_string()),
                TokenKind::Text("b".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_tag_is_dropped() {
        assert_eq!(
            kinds("x<div class=\"a\""),
            vec![TokenKind::Text("x".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_script_content_is_raw() {
        assert_eq!(
            kinds("<script>if (a<b) '<lang>x</lang>'</SCRIPT>"),
            vec![
                start_tag("script"),
                TokenKind::Text("if (a<b) '<lang>x</lang>'".to_string()),
                end_tag("script"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_textarea_decodes_references() {
        assert_eq!(
            kinds("<textarea>&lt;b&gt;</textarea>"),
            vec![
                start_tag("textarea"),
                TokenKind::Text("<b>".to_string()),
                end_tag("textarea"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_character_references() {
        assert_eq!(decode_character_references("a &amp; b"), "a & b");
        assert_eq!(decode_character_references("&#20013;&#x6587;"), "中文");
        assert_eq!(decode_character_references("&nbsp;"), "\u{a0}");
        assert_eq!(decode_character_references("&bogus; & &amp"), "&bogus; & &amp");
        assert_eq!(decode_character_references("&#;&#x;"), "&#;&#x;");
    }

    #[test]
    fn test_locations() {
        let tokens = tokenize("中\n <p>");
        assert_eq!(tokens[1].location, Location::new(2, 2, 5));
    }
}
