//! Reading note text from arguments, files, or stdin.

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Resolve the note text for a command.
///
/// A file wins over inline text. Inline text `-` (or no text at all) reads
/// stdin.
pub fn read_input(text: Option<&str>, file: Option<&Path>) -> Result<String> {
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    match text {
        Some("-") | None => read_stdin(),
        Some(text) => Ok(text.to_string()),
    }
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("failed to read stdin")?;
    if buffer.is_empty() {
        bail!("no input: pass text, --file, or pipe text on stdin");
    }
    Ok(buffer)
}
