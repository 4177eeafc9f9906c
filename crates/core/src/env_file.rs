//! Admin settings persistence into a dotenv file.
//!
//! Each update replaces an existing `KEY=` line (including `export KEY=`) or
//! is appended at the end. Other lines and comments are preserved verbatim.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{Error, Result};

static KEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("invalid env key pattern"));

/// Applies `updates` to dotenv `contents`.
pub fn upsert_env(contents: &str, updates: &[(String, String)]) -> Result<String> {
    for (key, value) in updates {
        if !KEY_REGEX.is_match(key) {
            return Err(Error::invalid_input(format!("invalid setting key: {}", key)));
        }
        if value.contains('\n') || value.contains('\r') {
            return Err(Error::invalid_input(format!(
                "setting {} must be a single line",
                key
            )));
        }
    }

    let mut lines: Vec<String> = contents.lines().map(str::to_string).collect();

    for (key, value) in updates {
        let rendered = format!("{}={}", key, quote_value(value));
        match lines.iter().position(|line| line_key(line) == Some(key.as_str())) {
            Some(idx) => lines[idx] = rendered,
            None => lines.push(rendered),
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    Ok(out)
}

/// Reads `path` (missing is treated as empty), applies updates, writes back.
pub fn write_env_file(path: &Path, updates: &[(String, String)]) -> Result<()> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    let updated = upsert_env(&contents, updates)?;
    std::fs::write(path, updated)?;
    Ok(())
}

fn line_key(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        return None;
    }
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    trimmed.split_once('=').map(|(k, _)| k.trim())
}

fn quote_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '#' | '"' | '\'' | '$' | '\\'));
    if needs_quotes {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}
