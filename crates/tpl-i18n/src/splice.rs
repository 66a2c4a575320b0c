//! Range overwrites against an immutable source string.
//!
//! All edits are expressed in byte offsets of the *original* text, so
//! positions stay valid no matter how many edits were recorded before.

use std::ops::Range;

use log::trace;

use crate::error::{Result, TplI18nError};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    start: usize,
    end: usize,
    content: String,
}

impl Edit {
    fn contains(&self, range: &Range<usize>) -> bool {
        self.start <= range.start && range.end <= self.end
    }

    fn overlaps(&self, range: &Range<usize>) -> bool {
        self.start < range.end && range.start < self.end
    }
}

/// Records overwrites of the original text and produces the edited result.
#[derive(Debug, Clone)]
pub struct SpliceBuffer<'a> {
    original: &'a str,
    edits: Vec<Edit>,
}

impl<'a> SpliceBuffer<'a> {
    pub fn new(original: &'a str) -> Self {
        Self {
            original,
            edits: Vec::new(),
        }
    }

    pub fn original(&self) -> &'a str {
        self.original
    }

    /// Original text for `range`, ignoring any edits.
    pub fn slice(&self, range: Range<usize>) -> Option<&'a str> {
        self.original.get(range)
    }

    pub fn edit_count(&self) -> usize {
        self.edits.len()
    }

    /// Replace `range` of the original text with `content`.
    ///
    /// A range that lies inside an earlier overwrite is absorbed by it and
    /// `Ok(false)` is returned. Earlier overwrites that lie inside `range`
    /// are dropped. Partial overlaps are rejected.
    pub fn overwrite(&mut self, range: Range<usize>, content: &str) -> Result<bool> {
        self.check_range(&range)?;

        if let Some(outer) = self.edits.iter().find(|edit| edit.contains(&range)) {
            trace!(
                "edit {}..{} absorbed by earlier edit {}..{}",
                range.start,
                range.end,
                outer.start,
                outer.end
            );
            return Ok(false);
        }

        let inside = |edit: &Edit| range.start <= edit.start && edit.end <= range.end;
        if self
            .edits
            .iter()
            .any(|edit| edit.overlaps(&range) && !inside(edit))
        {
            return Err(TplI18nError::InvalidEdit {
                start: range.start,
                end: range.end,
                reason: "partially overlaps an earlier edit",
            });
        }
        self.edits.retain(|edit| !inside(edit));

        self.edits.push(Edit {
            start: range.start,
            end: range.end,
            content: content.to_string(),
        });
        Ok(true)
    }

    /// Overwrite the first occurrence of `literal` in the original text.
    ///
    /// Returns `Ok(false)` when `literal` does not occur.
    pub fn replace_first(&mut self, literal: &str, content: &str) -> Result<bool> {
        if literal.is_empty() {
            return Ok(false);
        }
        match self.original.find(literal) {
            Some(start) => self.overwrite(start..start + literal.len(), content),
            None => Ok(false),
        }
    }

    /// Apply every recorded edit to the original text.
    pub fn finish(&self) -> String {
        let mut edits: Vec<&Edit> = self.edits.iter().collect();
        // Apply from the back so earlier offsets stay valid.
        edits.sort_by(|a, b| b.start.cmp(&a.start));

        let mut output = self.original.to_string();
        for edit in edits {
            output.replace_range(edit.start..edit.end, &edit.content);
        }
        output
    }

    fn check_range(&self, range: &Range<usize>) -> Result<()> {
        let reason = if range.start >= range.end {
            Some("empty range")
        } else if range.end > self.original.len() {
            Some("out of bounds")
        } else if !self.original.is_char_boundary(range.start)
            || !self.original.is_char_boundary(range.end)
        {
            Some("not on a character boundary")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(TplI18nError::InvalidEdit {
                start: range.start,
                end: range.end,
                reason,
            }),
            None => Ok(()),
        }
    }
}
