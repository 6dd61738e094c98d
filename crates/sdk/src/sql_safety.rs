//! Read-only SQL validation.
//!
//! The `execute_sql` tool is driven by an AI agent, so destructive statements
//! are rejected locally before they ever reach a warehouse. Validation is a
//! keyword heuristic over normalized SQL, not a parser; it errs on the side
//! of rejecting.

use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Keywords blocked at the main-statement level.
const DESTRUCTIVE_KEYWORDS: &[&str] = &[
    "DROP", "DELETE", "TRUNCATE", "ALTER", "UPDATE", "INSERT", "MERGE", "CREATE", "REPLACE",
];

/// Keywords tolerated inside subqueries and `WITH` clauses in lenient mode.
const CONDITIONAL_KEYWORDS: &[&str] = &["CREATE", "INSERT", "REPLACE"];

#[derive(Debug, Error)]
#[error("{message}")]
pub struct SqlSafetyError {
    pub message: String,
}

/// Validate that a statement is read-only.
///
/// Returns `Ok(())` for safe statements and an error naming the offending
/// keyword otherwise. `strict_mode` additionally blocks the conditional
/// keywords everywhere.
pub fn check_sql_safety(sql: &str, strict_mode: bool) -> Result<(), SqlSafetyError> {
    let normalized = normalize_sql(sql);

    let keywords: Vec<&str> = if strict_mode {
        DESTRUCTIVE_KEYWORDS.to_vec()
    } else {
        DESTRUCTIVE_KEYWORDS
            .iter()
            .copied()
            .filter(|kw| !CONDITIONAL_KEYWORDS.contains(kw))
            .collect()
    };

    for keyword in keywords {
        if contains_destructive_keyword(&normalized, keyword) {
            let mut message = format!(
                "SQL contains potentially destructive operation '{keyword}'. \
                 This tool is designed for read-only queries (SELECT statements)."
            );
            message.push_str(&suggest_safe_alternative(sql));
            return Err(SqlSafetyError { message });
        }
    }

    // Statement separators followed by a destructive verb are rejected even
    // when the first statement looked harmless.
    for verb in ["DROP", "DELETE", "TRUNCATE"] {
        let pattern = case_insensitive(&format!(r";\s*{verb}\s+"));
        if pattern.is_match(&normalized) {
            return Err(SqlSafetyError {
                message: format!(
                    "SQL contains dangerous pattern: statement separator followed by {verb}"
                ),
            });
        }
    }

    Ok(())
}

/// Strip comments and collapse whitespace.
fn normalize_sql(sql: &str) -> String {
    let without_line_comments = case_insensitive(r"--[^\n]*")
        .replace_all(sql, "")
        .into_owned();
    let without_comments = match RegexBuilder::new(r"/\*.*?\*/")
        .dot_matches_new_line(true)
        .build()
    {
        Ok(re) => re.replace_all(&without_line_comments, "").into_owned(),
        Err(_) => without_line_comments,
    };
    case_insensitive(r"\s+")
        .replace_all(&without_comments, " ")
        .trim()
        .to_string()
}

/// Whether `keyword` appears as a main operation rather than part of an
/// identifier (`created_at`) or a subquery.
fn contains_destructive_keyword(sql: &str, keyword: &str) -> bool {
    let pattern = case_insensitive(&format!(r"\b{keyword}\b"));
    let mut found_any = false;

    for found in pattern.find_iter(sql) {
        found_any = true;
        let before = sql[..found.start()].trim_end();

        // Keyword opens the statement.
        if before.is_empty() || before.ends_with(';') {
            return true;
        }

        if CONDITIONAL_KEYWORDS.contains(&keyword) {
            // Inside parentheses or a WITH clause the keyword may be part of
            // a legitimate read-only construct.
            let open = before.matches('(').count();
            let close = before.matches(')').count();
            if open > close {
                continue;
            }
            if case_insensitive(r"\bWITH\b").is_match(before) {
                continue;
            }
            return true;
        }
    }

    found_any
}

/// Suggest read-only replacements for the statement that was rejected.
fn suggest_safe_alternative(sql: &str) -> String {
    let upper = sql.to_uppercase();
    let mut suggestions = Vec::new();

    if upper.contains("DROP") {
        suggestions.push(
            "Instead of DROP, use SELECT to query the table structure: \
             DESCRIBE TABLE or SHOW COLUMNS FROM",
        );
    }
    if upper.contains("DELETE") || upper.contains("TRUNCATE") {
        suggestions.push(
            "Instead of deleting data, use SELECT with a WHERE clause to view \
             the data you want to remove",
        );
    }
    if upper.contains("UPDATE") {
        suggestions.push("Instead of UPDATE, use SELECT to view the data you want to modify");
    }
    if upper.contains("INSERT") {
        suggestions.push(
            "Instead of INSERT, use SELECT to query existing data. If you need \
             to insert data, use a separate write-enabled tool.",
        );
    }

    if suggestions.is_empty() {
        "\n\nUse SELECT statements to query data without modifying it.".to_string()
    } else {
        format!("\n\nSuggestions:\n- {}", suggestions.join("\n- "))
    }
}

/// Redact string literals and quoted identifiers before a statement is
/// logged, and bound the logged length.
pub fn sanitize_sql_for_logging(sql: &str, max_length: usize) -> String {
    let redacted = case_insensitive(r"'[^']*'").replace_all(sql, "'***'");
    let redacted = case_insensitive(r#""[^"]*""#).replace_all(&redacted, "\"***\"");

    if redacted.len() > max_length {
        let cut = redacted
            .char_indices()
            .take_while(|(i, _)| *i < max_length)
            .last()
            .map_or(0, |(i, c)| i + c.len_utf8());
        format!("{}... [truncated]", &redacted[..cut])
    } else {
        redacted.into_owned()
    }
}

fn case_insensitive(pattern: &str) -> Regex {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => re,
        Err(_) => {
            // Patterns here are compile-time literals; if one ever fails to
            // build, match nothing rather than panic mid-validation.
            #[allow(clippy::unwrap_used)]
            let never = Regex::new(r"[^\s\S]").unwrap();
            never
        }
    }
}
