//! Persistent JSON catalog of extracted entries.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::debug;
use tpl_i18n::LangMap;

/// Counts from one [`Catalog::merge`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub added: usize,
    pub updated: usize,
}

/// Flat key to text JSON object, kept in insertion order.
pub struct Catalog {
    file_path: PathBuf,
    entries: IndexMap<String, String>,
}

impl Catalog {
    /// Open an existing catalog or start an empty one
    pub fn open_or_create(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Catalog must be a JSON object of strings: {}", path.display()))?
        } else {
            IndexMap::new()
        };

        Ok(Self {
            file_path: path.to_path_buf(),
            entries,
        })
    }

    /// Add new keys at the end; existing keys keep their position and get the new text.
    pub fn merge(&mut self, lang_map: &LangMap) -> MergeStats {
        let mut stats = MergeStats::default();
        for (key, text) in lang_map {
            match self.entries.insert(key.clone(), text.clone()) {
                Some(previous) if previous != *text => stats.updated += 1,
                Some(_) => {}
                None => stats.added += 1,
            }
        }
        debug!(
            "catalog {}: {} added, {} updated",
            self.file_path.display(),
            stats.added,
            stats.updated
        );
        stats
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Save the catalog with pretty formatting
    ///
    /// Uses 2-space indentation and adds a trailing newline.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(&self.entries).context("Failed to serialize catalog")?;

        fs::write(&self.file_path, format!("{}\n", content))
            .with_context(|| format!("Failed to write file: {}", self.file_path.display()))?;

        Ok(())
    }
}
