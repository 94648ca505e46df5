//! TOML parser with helpful error messages

use super::schema::MigrationFile;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse views-migrate.toml with detailed error messages
pub fn parse_config(path: &Path) -> Result<MigrationFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Read views-migrate.toml without validating it.
///
/// Used when overrides may still fill in missing values.
pub fn read_config(path: &Path) -> Result<MigrationFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    deserialize(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse views-migrate.toml content from string
pub fn parse_config_str(content: &str) -> Result<MigrationFile> {
    let config = deserialize(content)?;

    config.validate()?;

    Ok(config)
}

fn deserialize(content: &str) -> Result<MigrationFile> {
    toml::from_str(content).map_err(|e| enhance_toml_error(e, content))
}

/// Enhance TOML parsing errors with the offending lines
fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let error_msg = error.message().to_string();

    let line_hint = error
        .span()
        .and_then(|span| content.get(..span.start))
        .map(|before| before.matches('\n').count() + 1);

    if let Some(line_num) = line_hint {
        let context = get_line_context(content, line_num);
        anyhow::anyhow!(
            "TOML parsing error at line {}:\n{}\n\nError: {}",
            line_num,
            context,
            error_msg
        )
    } else {
        anyhow::anyhow!("TOML parsing error: {}", error_msg)
    }
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 2).min(lines.len());

    lines[start.min(end)..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
