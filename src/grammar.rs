//! Statement classification for schema dumps.
//!
//! Each scanned span is classified as exactly one of: a table definition,
//! a foreign-key constraint, a comment, or an unrecognized statement.
//! Productions are tried in that order and a span whose body fails the
//! structured form it started like falls through to Other, so arbitrary
//! SQL (CREATE INDEX, COMMENT ON, INSERT, ...) never fails the run.

use crate::schema::{ColumnDef, ColumnList, ForeignKeyDef, RefAction, TableDef};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Classification of one statement span
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Table(TableDef),
    ForeignKey(ForeignKeyDef),
    Comment,
    Other,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrammarError {
    #[error("empty statement")]
    Empty,
}

/// Regex for the head of a CREATE TABLE statement, up to and including
/// the opening parenthesis of the column list.
/// Names are either "quoted" (PostgreSQL style, quotes stripped) or bare
static CREATE_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)^CREATE\s+(?:UNLOGGED\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:"([^"]+)"|([A-Za-z0-9_`.]+))\s*\("#,
    )
    .unwrap()
});

/// Regex for a whole ALTER TABLE .. ADD CONSTRAINT .. FOREIGN KEY statement
static FOREIGN_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)^ALTER\s+TABLE\s+(?:ONLY\s+)?(?:"([^"]+)"|([A-Za-z0-9_`.]+))\s+ADD\s+CONSTRAINT\s+\S+\s+FOREIGN\s+KEY\s*(?:IF\s+NOT\s+EXISTS\s*)?\(([^)]+)\)\s*REFERENCES\s+(?:"([^"]+)"|([A-Za-z0-9_`.]+))\s*\(([^)]+)\)\s*(?:DEFERRABLE\s*)?(?:ON\s+UPDATE\s+(CASCADE|RESTRICT|NO\s+ACTION|SET\s+NULL|SET\s+DEFAULT)\s*)?(?:ON\s+DELETE\s+(CASCADE|RESTRICT|NO\s+ACTION|SET\s+NULL|SET\s+DEFAULT)\s*)?;$"#,
    )
    .unwrap()
});

/// Classify one statement span.
///
/// The span must be exactly one scanner-produced statement; only an
/// empty statement (a bare `;`) is an error, everything else that is
/// not a recognized form classifies as `Other`.
pub fn classify(span: &str) -> Result<Statement, GrammarError> {
    let span = span.trim();
    if span.starts_with("--") {
        return Ok(Statement::Comment);
    }
    if span.is_empty() || span == ";" {
        return Err(GrammarError::Empty);
    }
    if let Some(table) = parse_table_definition(span) {
        return Ok(Statement::Table(table));
    }
    if let Some(key) = parse_foreign_key(span) {
        return Ok(Statement::ForeignKey(key));
    }
    Ok(Statement::Other)
}

fn parse_table_definition(stmt: &str) -> Option<TableDef> {
    let caps = CREATE_TABLE_RE.captures(stmt)?;
    let name = caps.get(1).or_else(|| caps.get(2))?.as_str().to_string();

    // The match ends on the opening parenthesis of the column list
    let open = caps.get(0)?.end() - 1;
    let end = balanced_group_end(stmt, open)?;
    if stmt[end..].trim_start() != ";" {
        return None;
    }

    let body = &stmt[open + 1..end - 1];
    let columns = split_definitions(body)
        .iter()
        .filter_map(|definition| parse_column_def(definition))
        .collect();
    Some(TableDef { name, columns })
}

fn parse_foreign_key(stmt: &str) -> Option<ForeignKeyDef> {
    let caps = FOREIGN_KEY_RE.captures(stmt)?;
    let source_table = caps.get(1).or_else(|| caps.get(2))?.as_str().to_string();
    let source_columns = parse_identifier_list(caps.get(3)?.as_str());
    let target_table = caps.get(4).or_else(|| caps.get(5))?.as_str().to_string();
    let target_columns = parse_identifier_list(caps.get(6)?.as_str());

    if source_columns.is_empty() || source_columns.len() != target_columns.len() {
        return None;
    }

    Some(ForeignKeyDef {
        source_table,
        source_columns,
        target_table,
        target_columns,
        on_update: caps.get(7).and_then(|m| RefAction::parse(m.as_str())),
        on_delete: caps.get(8).and_then(|m| RefAction::parse(m.as_str())),
    })
}

/// Find the end of the parenthesized group opening at `start`, honoring
/// nesting and single-quoted strings. Returns the index one past the
/// closing parenthesis.
fn balanced_group_end(s: &str, start: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    match bytes.get(start) {
        Some(b'(') => {}
        _ => return None,
    }

    let mut depth = 0usize;
    let mut in_string = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if b == b'\'' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'\'' => in_string = true,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a column-list body on top-level commas. Commas nested in
/// parentheses or single-quoted strings do not split.
fn split_definitions(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut in_string = false;

    for ch in body.chars() {
        if in_string {
            if ch == '\'' {
                in_string = false;
            }
            current.push(ch);
            continue;
        }
        match ch {
            '\'' => {
                in_string = true;
                current.push(ch);
            }
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth -= 1;
                current.push(ch);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }

    parts
}

/// Parse one column definition: first token is the name (quotes
/// stripped), the rest joins into the specification string.
fn parse_column_def(definition: &str) -> Option<ColumnDef> {
    let tokens = tokenize_definition(definition);
    let (name, spec) = tokens.split_first()?;
    Some(ColumnDef {
        name: name.replace(['"', '`'], ""),
        spec: escape_spec(&spec.join(" ")),
    })
}

/// Tokenize a column definition: whitespace-separated words, except that
/// balanced parenthesized groups and single-quoted literals (plus any
/// directly attached suffix, e.g. `'now()'::timestamp`) stay whole.
/// Newlines inside captured groups become the literal two-char `\n`.
fn tokenize_definition(definition: &str) -> Vec<String> {
    let bytes = definition.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        match b {
            b'(' => {
                let end = balanced_group_end(definition, i).unwrap_or(bytes.len());
                tokens.push(definition[i..end].replace('\n', "\\n"));
                i = end;
            }
            b'\'' => {
                let mut j = i + 1;
                while j < bytes.len() && bytes[j] != b'\'' {
                    j += 1;
                }
                if j < bytes.len() {
                    j += 1;
                }
                while j < bytes.len() && !bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
                tokens.push(definition[i..j].replace('\n', "\\n"));
                i = j;
            }
            _ => {
                let start = i;
                while i < bytes.len()
                    && !bytes[i].is_ascii_whitespace()
                    && bytes[i] != b'('
                    && bytes[i] != b'\''
                {
                    i += 1;
                }
                tokens.push(definition[start..i].to_string());
            }
        }
    }

    tokens
}

fn parse_identifier_list(list: &str) -> ColumnList {
    list.split(',')
        .map(|c| c.trim().trim_matches('`').trim_matches('"').to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Escape a specification string for embedding in an HTML-like label:
/// double quotes get a backslash, then HTML special characters are
/// entity-escaped (so `"` renders as `\&quot;`).
fn escape_spec(spec: &str) -> String {
    spec.replace('"', "\\\"")
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
