//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::Parser;
use tpl_i18n::{SequentialKeys, KEY_PLACEHOLDER};

/// Extract `<lang>` markers from templates and rewrite them into lookup expressions.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    /// Template files to transform, in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Prefix for generated keys
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// First key number
    #[arg(long, default_value_t = 1)]
    pub start: u64,

    /// Expression written in place of each marker; `{key}` is replaced by the key
    #[arg(long, default_value = KEY_PLACEHOLDER)]
    pub expression: String,

    /// Write rewritten templates into this directory instead of stdout
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Emit each template as an ES module (`export default "...";`)
    #[arg(long)]
    pub module: bool,

    /// Merge extracted entries into this JSON catalog (created if missing)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Arguments {
    /// Key policy shared by every file of the run.
    pub fn policy(&self) -> SequentialKeys {
        SequentialKeys::new(self.prefix.clone(), self.expression.clone()).with_start(self.start)
    }
}
