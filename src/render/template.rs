// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Placeholder substitution.
//!
//! Generated artifacts are full of `$VAR` and `${VAR}` shell syntax that must
//! survive untouched, so placeholders use `<$>` as their delimiter instead:
//!
//! - `<$>name` and `<$>{name}` are replaced by the value bound to `name`.
//! - `<$><$>` produces a literal `<$>`.
//!
//! Names follow the usual identifier rules, i.e., `[_A-Za-z][_A-Za-z0-9]*`.

use indexmap::IndexMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Values bound to placeholder names.
pub type Parameters = IndexMap<String, String>;

const DELIMITER: &str = "<$>";

/// Text with `<$>` placeholders.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Template {
    text: String,
}

impl Template {
    /// Construct new template.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Replace every placeholder.
    ///
    /// # Errors
    ///
    /// - Return [`TemplateError::Missing`] if a placeholder has no value.
    /// - Return [`TemplateError::Invalid`] if a delimiter is not followed by a
    ///   valid placeholder.
    pub fn substitute(&self, params: &Parameters) -> Result<String> {
        self.expand(params, true)
    }

    /// Replace placeholders that have a value, leave everything else as is.
    pub fn safe_substitute(&self, params: &Parameters) -> String {
        // INVARIANT: Non-strict expansion never reports an error.
        self.expand(params, false).unwrap_or_else(|_| self.text.clone())
    }

    /// Treat template as plain string slice.
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    fn expand(&self, params: &Parameters, strict: bool) -> Result<String> {
        let mut out = String::with_capacity(self.text.len());
        let mut rest = self.text.as_str();

        while let Some(start) = rest.find(DELIMITER) {
            out.push_str(&rest[..start]);
            let after = &rest[start + DELIMITER.len()..];

            if let Some(tail) = after.strip_prefix(DELIMITER) {
                out.push_str(DELIMITER);
                rest = tail;
                continue;
            }

            let placeholder = match after.strip_prefix('{') {
                Some(inner) => {
                    let len = identifier_len(inner);
                    (len > 0 && inner[len..].starts_with('}')).then(|| (&inner[..len], len + 2))
                }
                None => {
                    let len = identifier_len(after);
                    (len > 0).then(|| (&after[..len], len))
                }
            };

            match placeholder {
                Some((name, consumed)) => {
                    match params.get(name) {
                        Some(value) => out.push_str(value),
                        None if strict => return Err(TemplateError::Missing(name.into())),
                        None => out.push_str(&rest[start..start + DELIMITER.len() + consumed]),
                    }
                    rest = &after[consumed..];
                }
                None if strict => {
                    let offset = self.text.len() - rest.len() + start;
                    let (line, column) = line_and_column(&self.text, offset);
                    return Err(TemplateError::Invalid { line, column });
                }
                None => {
                    out.push_str(DELIMITER);
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        Ok(out)
    }
}

impl Display for Template {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.as_str())
    }
}

fn identifier_len(data: &str) -> usize {
    let mut chars = data.char_indices();
    match chars.next() {
        Some((_, ch)) if ch == '_' || ch.is_ascii_alphabetic() => {}
        _ => return 0,
    }

    chars
        .find(|(_, ch)| !(*ch == '_' || ch.is_ascii_alphanumeric()))
        .map(|(idx, _)| idx)
        .unwrap_or(data.len())
}

fn line_and_column(text: &str, offset: usize) -> (usize, usize) {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map_or(offset, |nl| offset - nl - 1) + 1;
    (line, column)
}

/// Template substitution error types.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// Placeholder has no bound value.
    #[error("no value for placeholder {0:?}")]
    Missing(String),

    /// Delimiter not followed by a valid placeholder.
    #[error("invalid placeholder at line {line}, column {column}")]
    Invalid { line: usize, column: usize },
}

/// Friendly result alias :3
type Result<T, E = TemplateError> = std::result::Result<T, E>;
