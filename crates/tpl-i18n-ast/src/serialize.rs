//! Markup serialization for parsed nodes.

use crate::lexer::RAW_TEXT_ELEMENTS;
use crate::parser::is_void_element;
use crate::{NodeKind, NodeRef};

impl<'a> NodeRef<'a> {
    /// Serialize this node's children back to markup.
    ///
    /// The output is normalized rather than byte-exact: attribute values are
    /// always double-quoted, void elements lose any trailing `/`, and text is
    /// re-escaped.
    pub fn inner_html(&self) -> String {
        let mut output = String::new();
        for child in self.children() {
            serialize_node(child, &mut output);
        }
        output
    }
}

fn serialize_node(node: NodeRef<'_>, output: &mut String) {
    match node.kind() {
        NodeKind::Document => output.push_str(&node.inner_html()),
        NodeKind::Element => {
            output.push('<');
            output.push_str(node.name());
            for attr in node.attrs() {
                output.push(' ');
                output.push_str(&attr.name);
                output.push_str("=\"");
                output.push_str(&escape_attribute(&attr.value));
                output.push('"');
            }
            output.push('>');

            if is_void_element(node.name()) {
                return;
            }

            for child in node.children() {
                serialize_node(child, output);
            }
            output.push_str("</");
            output.push_str(node.name());
            output.push('>');
        }
        NodeKind::Text => {
            let text = node.text().unwrap_or_default();
            // Only text the lexer kept raw goes back out unescaped.
            let raw_parent = node
                .parent()
                .map_or(false, |parent| RAW_TEXT_ELEMENTS.contains(&parent.name()));
            if raw_parent {
                output.push_str(text);
            } else {
                output.push_str(&escape_text(text));
            }
        }
        NodeKind::Comment => {
            output.push_str("<!--");
            output.push_str(node.text().unwrap_or_default());
            output.push_str("-->");
        }
        NodeKind::Doctype => {
            output.push_str("<!DOCTYPE ");
            output.push_str(node.text().unwrap_or_default());
            output.push('>');
        }
    }
}

/// Escape text content: `&`, no-break space, `<`, `>`.
pub fn escape_text(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            _ => output.push(c),
        }
    }
    output
}

/// Escape a double-quoted attribute value: `&`, no-break space, `"`.
pub fn escape_attribute(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            '"' => output.push_str("&quot;"),
            _ => output.push(c),
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use pretty_assertions::assert_eq;

    fn inner(source: &str) -> String {
        let document = parse(source);
        document.get(document.top_level()[0]).inner_html()
    }

    #[test]
    fn test_inner_html_of_text() {
        assert_eq!(inner("<lang>汉字</lang>"), "汉字");
    }

    #[test]
    fn test_inner_html_normalizes_markup() {
        assert_eq!(
            inner("<lang>a<input type='button' disabled />b</lang>"),
            r#"a<input type="button" disabled="">b"#
        );
    }

    #[test]
    fn test_inner_html_keeps_nested_elements() {
        assert_eq!(
            inner("<lang>头部<lang>中间</lang>尾部</lang>"),
            "头部<lang>中间</lang>尾部"
        );
    }

    #[test]
    fn test_inner_html_reescapes_text() {
        assert_eq!(inner("<p>a &amp; b &lt; c&nbsp;</p>"), "a &amp; b &lt; c&nbsp;");
    }

    #[test]
    fn test_inner_html_reescapes_decoded_noscript_text() {
        assert_eq!(
            inner("<div><noscript>&lt;b&gt;</noscript></div>"),
            "<noscript>&lt;b&gt;</noscript>"
        );
    }

    #[test]
    fn test_inner_html_keeps_script_text_raw() {
        assert_eq!(
            inner("<div><script>a < b && c</script></div>"),
            "<script>a < b && c</script>"
        );
    }

    #[test]
    fn test_raw_text_is_not_escaped() {
        assert_eq!(
            inner("<div><script>a < b && c</script></div>"),
            "<script>a < b && c</script>"
        );
    }

    #[test]
    fn test_attributes_and_comments() {
        assert_eq!(
            inner(r#"<div><p title="x &quot;y&quot;"><!-- c --></p></div>"#),
            r#"<p title="x &quot;y&quot;"><!-- c --></p>"#
        );
    }

    #[test]
    fn test_escape_helpers() {
        assert_eq!(escape_text("<a & b>"), "&lt;a &amp; b&gt;");
        assert_eq!(escape_attribute(r#"say "hi" & <go>"#), "say &quot;hi&quot; &amp; <go>");
    }
}
