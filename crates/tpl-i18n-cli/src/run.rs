//! Per-file transform loop.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::info;
use tpl_i18n::{Transformed, Transformer};

use crate::args::Arguments;
use crate::catalog::Catalog;
use crate::module::to_module;

/// Transform every file with one shared key policy.
///
/// Rewritten templates go to `--out-dir` when given, otherwise to `out`.
pub fn run(args: &Arguments, out: &mut impl Write) -> Result<()> {
    if let Some(dir) = &args.out_dir {
        check_targets(dir, &args.files, args.module)?;
    }

    let mut transformer = Transformer::new(args.policy());
    let mut catalog = match &args.catalog {
        Some(path) => Some(Catalog::open_or_create(path)?),
        None => None,
    };

    for file in &args.files {
        let Transformed { code, lang_map } = transformer
            .transform_file(file)
            .with_context(|| format!("Failed to transform {}", file.display()))?;
        info!("{}: {} entries", file.display(), lang_map.len());

        let output = if args.module { to_module(&code)? } else { code };

        match &args.out_dir {
            Some(dir) => {
                let target = output_path(dir, file, args.module);
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
                fs::write(&target, &output)
                    .with_context(|| format!("Failed to write file: {}", target.display()))?;
                info!("wrote {}", target.display());
            }
            None => out
                .write_all(output.as_bytes())
                .context("Failed to write output")?,
        }

        if let Some(catalog) = catalog.as_mut() {
            catalog.merge(&lang_map);
        }
    }

    if let Some(catalog) = catalog {
        catalog.save()?;
        info!("catalog holds {} entries", catalog.entry_count());
    }

    Ok(())
}

/// Run with stdout as the output stream.
pub fn run_cli(args: &Arguments) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(args, &mut out)
}

/// Fail before any work if two inputs would be written to the same file.
fn check_targets(dir: &Path, files: &[PathBuf], module: bool) -> Result<()> {
    let mut seen: HashMap<PathBuf, &Path> = HashMap::new();
    for file in files {
        let target = output_path(dir, file, module);
        if let Some(earlier) = seen.get(&target) {
            bail!(
                "{} and {} both write to {}",
                earlier.display(),
                file.display(),
                target.display()
            );
        }
        seen.insert(target, file);
    }
    Ok(())
}

/// `<dir>/<file name>`, with a `.js` extension for module output.
fn output_path(dir: &Path, file: &Path, module: bool) -> PathBuf {
    let name = file.file_name().map(PathBuf::from).unwrap_or_else(|| file.to_path_buf());
    let target = dir.join(name);
    if module {
        target.with_extension("js")
    } else {
        target
    }
}
