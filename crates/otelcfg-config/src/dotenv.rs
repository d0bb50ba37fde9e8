//! Strict parser for `KEY=value` env files.
//!
//! Env files are read as data, never evaluated. The accepted grammar is:
//!
//! ```text
//! file    := (line '\n')*
//! line    := blank | comment | ['export' ' '+] KEY '=' value
//! comment := '#' any*
//! KEY     := [A-Za-z_][A-Za-z0-9_]*
//! value   := quoted | unquoted [blank+ comment]
//! quoted  := '"' [^"]* '"' [blank* comment] | "'" [^']* "'" [blank* comment]
//! ```
//!
//! As in a shell, a `#` starts a trailing comment only when it follows
//! whitespace outside quotes, so `http://host/#frag` keeps its fragment while
//! `grpc # or http` is just `grpc`.
//!
//! Values that contain command substitution or parameter expansion
//! (`$(`, `${`, or a backtick) are rejected rather than passed through, as is
//! any other line that does not match the grammar. A file with a single bad
//! line yields an error and no values.

use std::collections::BTreeMap;

use crate::error::{ConfigError, ConfigResult};

/// Substrings that a shell would evaluate.
const SHELL_SYNTAX: &[&str] = &["$(", "${", "`"];

/// Parse env-file `contents`. `path` is only used in error messages.
///
/// Later assignments of the same key replace earlier ones.
///
/// # Errors
///
/// Returns [`ConfigError::ParseError`] for the first line that does not match
/// the grammar.
pub fn parse(contents: &str, path: &str) -> ConfigResult<BTreeMap<String, String>> {
    let mut values = BTreeMap::new();

    for (idx, raw_line) in contents.lines().enumerate() {
        let line_no = idx.saturating_add(1);
        let err = |message: String| ConfigError::ParseError {
            path: path.to_owned(),
            line: line_no,
            message,
        };

        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line
            .strip_prefix("export ")
            .map_or(line, str::trim_start);

        let Some((key, raw_value)) = line.split_once('=') else {
            return Err(err(format!("expected KEY=value, found '{line}'")));
        };

        if !is_valid_key(key) {
            return Err(err(format!("'{key}' is not a valid variable name")));
        }

        let value = parse_value(raw_value).map_err(err)?;
        if let Some(syntax) = SHELL_SYNTAX.iter().find(|s| value.contains(**s)) {
            return Err(err(format!(
                "value for {key} contains shell syntax '{syntax}', which is not evaluated"
            )));
        }

        values.insert(key.to_owned(), value.to_owned());
    }

    Ok(values)
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Extract the value from the text after `=`, dropping any trailing comment.
fn parse_value(raw: &str) -> Result<&str, String> {
    let value = raw.trim();

    for quote in ['"', '\''] {
        let Some(rest) = value.strip_prefix(quote) else {
            continue;
        };
        let Some(end) = rest.find(quote) else {
            return Err(format!("unterminated {quote} quote in '{value}'"));
        };
        let (inner, tail) = rest.split_at(end);
        let tail = tail[quote.len_utf8()..].trim_start();
        if !tail.is_empty() && !tail.starts_with('#') {
            return Err(format!("unexpected text after closing quote: '{tail}'"));
        }
        return Ok(inner);
    }

    let mut prev_blank = raw.starts_with(char::is_whitespace);
    for (idx, c) in value.char_indices() {
        if c == '#' && prev_blank {
            return Ok(value[..idx].trim_end());
        }
        prev_blank = c.is_whitespace();
    }
    Ok(value)
}
