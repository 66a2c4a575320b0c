//! ES module output for rewritten templates.

use anyhow::{Context, Result};

/// Wrap `code` as `export default "<code>";` so bundlers can import it.
pub fn to_module(code: &str) -> Result<String> {
    let literal = serde_json::to_string(code).context("Failed to encode template as a string literal")?;
    Ok(format!("export default {literal};\n"))
}
