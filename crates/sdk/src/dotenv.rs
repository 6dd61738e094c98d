//! Minimal `.env` reader used by [`crate::config::Settings`].
//!
//! Only reading is supported; the server never writes configuration back.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
enum DotenvLine {
    Ignored,
    Variable { key: String, value: String },
}

/// Read a dotenv file into a key/value map.
///
/// A missing file is not an error and yields an empty map. Comments, blank
/// lines and an optional `export ` prefix are accepted; values may be single-
/// or double-quoted. Duplicate keys are rejected so a typo cannot silently
/// shadow a credential.
pub fn read_dotenv(path: &Path) -> std::result::Result<HashMap<String, String>, String> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let contents = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read dotenv file {}: {err}", path.display()))?;

    let mut seen_keys = HashSet::new();
    let mut vars = HashMap::new();

    for (index, line) in contents.lines().enumerate() {
        let parsed = parse_line(line).map_err(|err| {
            format!(
                "Failed to parse dotenv file {} at line {}: {err}",
                path.display(),
                index + 1
            )
        })?;

        if let DotenvLine::Variable { key, value } = parsed {
            if !seen_keys.insert(key.clone()) {
                return Err(format!(
                    "Duplicate variable '{key}' in dotenv file {}",
                    path.display()
                ));
            }
            vars.insert(key, value);
        }
    }

    Ok(vars)
}

fn parse_line(line: &str) -> std::result::Result<DotenvLine, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(DotenvLine::Ignored);
    }

    let stripped = trimmed.strip_prefix("export ").unwrap_or(trimmed);

    let eq_index = stripped
        .find('=')
        .ok_or_else(|| "Invalid dotenv line, missing '='".to_string())?;
    if eq_index == 0 {
        return Err("Invalid dotenv line, missing key".to_string());
    }

    let before = stripped[..eq_index].chars().last();
    let after = stripped[eq_index + 1..].chars().next();
    if before.is_some_and(|ch| ch.is_whitespace()) || after.is_some_and(|ch| ch.is_whitespace()) {
        return Err("Whitespace around '=' is not allowed".to_string());
    }

    let key = &stripped[..eq_index];
    if !is_valid_key(key) {
        return Err(format!("Invalid dotenv variable name '{key}'"));
    }

    let mut value = stripped[eq_index + 1..].to_string();
    if value.starts_with('"') || value.starts_with('\'') {
        let quote = value.chars().next().unwrap_or('"');
        if !value.ends_with(quote) || value.len() == 1 {
            return Err("Invalid quoted value".to_string());
        }
        value = value[1..value.len() - 1].to_string();
    }

    Ok(DotenvLine::Variable {
        key: key.to_string(),
        value,
    })
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn parse_ok(line: &str) -> Option<(String, String)> {
        match parse_line(line).unwrap() {
            DotenvLine::Variable { key, value } => Some((key, value)),
            DotenvLine::Ignored => None,
        }
    }

    #[test]
    fn parses_plain_assignment() {
        assert_eq!(
            parse_ok("DATABRICKS_HOST=https://example.databricks.net"),
            Some((
                "DATABRICKS_HOST".to_string(),
                "https://example.databricks.net".to_string()
            ))
        );
    }

    #[test]
    fn parses_export_prefix_and_quotes() {
        assert_eq!(
            parse_ok("export DATABRICKS_TOKEN=\"dapi123\""),
            Some(("DATABRICKS_TOKEN".to_string(), "dapi123".to_string()))
        );
        assert_eq!(
            parse_ok("NAME='quoted value'"),
            Some(("NAME".to_string(), "quoted value".to_string()))
        );
    }

    #[test]
    fn skips_comments_and_blanks() {
        assert_eq!(parse_ok("# a comment"), None);
        assert_eq!(parse_ok("   "), None);
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse_line("NOVALUE").is_err());
        assert!(parse_line("=value").is_err());
        assert!(parse_line("KEY = value").is_err());
        assert!(parse_line("BAD KEY=value").is_err());
        assert!(parse_line("OPEN=\"unterminated").is_err());
    }
}
