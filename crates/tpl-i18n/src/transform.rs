//! Marker extraction and template rewriting.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tpl_i18n_ast::{traverse, Attribute, NodeRef};

use crate::error::Result;
use crate::policy::KeyPolicy;
use crate::replacement::{KeyGenerator, Occurrence};
use crate::splice::SpliceBuffer;

/// Element name that marks translatable text.
pub const MARKER_TAG: &str = "lang";

static MARKER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^<lang>(.*?)</lang>$").expect("valid marker regex"));

/// Extracted entries, key to source text, in encounter order.
pub type LangMap = IndexMap<String, String>;

/// Inner text of `text` if it is exactly one `<lang>...</lang>` marker.
///
/// The match is lazy, so `<lang>a</lang><lang>b</lang>` captures
/// `a</lang><lang>b`.
pub fn marker_text(text: &str) -> Option<&str> {
    MARKER_PATTERN
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|inner| inner.as_str())
}

/// True if any ancestor of `node` is a marker element.
pub fn has_marker_ancestor(node: NodeRef<'_>) -> bool {
    node.has_ancestor(MARKER_TAG)
}

/// Rewritten template and the entries extracted from it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transformed {
    pub code: String,
    pub lang_map: LangMap,
}

/// Runs extractions with one key policy.
///
/// The policy is kept between calls, so a counter-based policy keeps
/// counting across templates.
pub struct Transformer<P> {
    generator: KeyGenerator<P>,
}

impl<P: KeyPolicy> Transformer<P> {
    pub fn new(policy: P) -> Self {
        Self {
            generator: KeyGenerator::new(policy),
        }
    }

    pub fn policy(&self) -> &P {
        self.generator.policy()
    }

    pub fn into_policy(self) -> P {
        self.generator.into_policy()
    }

    /// Extract every outer-most marker in `source` and rewrite it.
    ///
    /// Empty or whitespace-only input is returned as is without parsing.
    pub fn transform(&mut self, source: &str) -> Result<Transformed> {
        if source.trim().is_empty() {
            return Ok(Transformed {
                code: source.to_string(),
                lang_map: LangMap::new(),
            });
        }

        let document = tpl_i18n_ast::parse(source);
        let mut buffer = SpliceBuffer::new(source);
        let mut lang_map = LangMap::new();

        for node in traverse(&document, [document.root()]) {
            if node.name() == MARKER_TAG && !has_marker_ancestor(node) {
                self.extract_element(node, &mut buffer, &mut lang_map)?;
            }
            for attribute in node.attrs() {
                self.extract_attribute(node, attribute, &mut buffer, &mut lang_map)?;
            }
        }

        debug!(
            "extracted {} entries with {} edits",
            lang_map.len(),
            buffer.edit_count()
        );

        Ok(Transformed {
            code: buffer.finish(),
            lang_map,
        })
    }

    /// Read `path` (relative to the current directory) and transform it.
    pub fn transform_file(&mut self, path: impl AsRef<Path>) -> Result<Transformed> {
        let path = resolve_path(path.as_ref())?;
        debug!("reading template {}", path.display());
        let source = fs::read_to_string(&path)?;
        self.transform(&source)
    }

    fn extract_element(
        &mut self,
        node: NodeRef<'_>,
        buffer: &mut SpliceBuffer<'_>,
        lang_map: &mut LangMap,
    ) -> Result<()> {
        let Some(span) = node.span() else {
            return Ok(());
        };

        // Anything but a single clean marker (nested markers, recovered
        // markup) falls back to the re-serialized children.
        let text = buffer
            .slice(span.range())
            .and_then(marker_text)
            .map(str::to_string)
            .unwrap_or_else(|| node.inner_html());

        self.record(&Occurrence::Element(node), text, span.range(), buffer, lang_map)
    }

    fn extract_attribute(
        &mut self,
        element: NodeRef<'_>,
        attribute: &Attribute,
        buffer: &mut SpliceBuffer<'_>,
        lang_map: &mut LangMap,
    ) -> Result<()> {
        let Some(span) = attribute.value_span else {
            return Ok(());
        };
        let Some(text) = marker_text(attribute.value.trim()) else {
            return Ok(());
        };

        let occurrence = Occurrence::Attribute { element, attribute };
        self.record(&occurrence, text.to_string(), span.range(), buffer, lang_map)
    }

    fn record(
        &mut self,
        occurrence: &Occurrence<'_>,
        text: String,
        range: Range<usize>,
        buffer: &mut SpliceBuffer<'_>,
        lang_map: &mut LangMap,
    ) -> Result<()> {
        let (key, expression) = self.generator.make_replacement(occurrence)?.into_parts();
        let location = occurrence.location();
        debug!(
            "entry {:?} at {}:{} ({})",
            key,
            location.line,
            location.column,
            if occurrence.is_attribute() { "attribute" } else { "element" }
        );

        // An attribute marker inside an outer marker element keeps its entry,
        // but its expression is not written: the outer expression covers it.
        if !buffer.overwrite(range, &expression)? {
            debug!(
                "entry {:?} lies inside an earlier marker, its expression is not written",
                key
            );
        }

        if lang_map.contains_key(&key) {
            warn!(
                "duplicate key {:?} at {}:{}, earlier text is overwritten",
                key, location.line, location.column
            );
        }
        lang_map.insert(key, text);
        Ok(())
    }
}

fn resolve_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}

/// Transform `source` with `policy`.
///
/// Pass `&mut policy` to keep a stateful policy after the call.
pub fn transform<P: KeyPolicy>(source: &str, policy: P) -> Result<Transformed> {
    Transformer::new(policy).transform(source)
}

/// Read a template from `path` and transform it with `policy`.
///
/// Read failures are returned as [`TplI18nError::IoError`](crate::TplI18nError::IoError)
/// carrying the original [`std::io::Error`].
pub fn transform_from_file<P: KeyPolicy>(path: impl AsRef<Path>, policy: P) -> Result<Transformed> {
    Transformer::new(policy).transform_file(path)
}
