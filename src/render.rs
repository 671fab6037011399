// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Recipe rendering.
//!
//! A [`RecipeTable`] has two textual projections: a Dockerfile that bakes every
//! tool into a container image, and a standalone `setup.sh` that installs
//! tools one function at a time on an existing machine. Both projections share
//! the same rules:
//!
//! - Tools are rendered in table order.
//! - A `prepare` command shared by several tools is emitted once, at its first
//!   occurrence.
//! - Multi-line commands are reindented so continuation lines line up with
//!   whatever context they are embedded into.
//!
//! # See Also
//!
//! 1. [`dockerfile`]
//! 2. [`shell`]
//! 3. [`template`]

pub mod dockerfile;
pub mod shell;
pub mod template;

use crate::recipe::RecipeTable;

/// Textual projection of a recipe table.
pub trait Render {
    /// Render full artifact for given recipe table.
    fn render(&self, recipes: &RecipeTable) -> Result<String>;
}

/// Reindent every line after the first one.
///
/// The first line is left alone because it is always glued to some prefix,
/// e.g., `RUN ` or function body indentation. Blank lines are emptied, and
/// every other line is stripped of leading whitespace then indented by
/// `indent` spaces.
pub fn reindent(text: &str, indent: usize) -> String {
    let mut lines = text.lines();
    let Some(first) = lines.next() else {
        return text.to_string();
    };

    let padding = " ".repeat(indent);
    let mut out = String::from(first);
    for line in lines {
        out.push('\n');
        if !line.trim().is_empty() {
            out.push_str(&padding);
            out.push_str(line.trim_start());
        }
    }

    out
}

/// Quote string for safe use as a single shell word.
///
/// Strings made only of safe characters are returned as is.
pub fn shell_quote(word: &str) -> String {
    if word.is_empty() {
        return "''".into();
    }

    let is_safe = word
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || "@%+=:,./_-".contains(ch));
    if is_safe {
        return word.into();
    }

    format!("'{}'", word.replace('\'', r#"'"'"'"#))
}

/// Rendering error types.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Artifact template cannot be filled in.
    #[error(transparent)]
    Template(#[from] crate::render::template::TemplateError),

    /// Tool name cannot be used as shell function name.
    #[error("tool name {0:?} is not a valid shell function name")]
    InvalidFunctionName(String),
}

/// Friendly result alias :3
pub type Result<T, E = RenderError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    #[test]
    fn reindent_continuation_lines() {
        let command = indoc! {r#"
            curl -LO https://go.dev/dl/go.tar.gz && \
                    sudo tar -C /usr/local -xzf go.tar.gz && \

              rm go.tar.gz"#};
        let expect = "curl -LO https://go.dev/dl/go.tar.gz && \\\n    \
                      sudo tar -C /usr/local -xzf go.tar.gz && \\\n\n    \
                      rm go.tar.gz";
        assert_eq!(reindent(command, 4), expect);
    }

    #[test]
    fn reindent_single_line_is_untouched() {
        assert_eq!(reindent("  sudo dnf update -y", 8), "  sudo dnf update -y");
        assert_eq!(reindent("", 8), "");
    }

    #[test_case("init", "init"; "plain word")]
    #[test_case("", "''"; "empty")]
    #[test_case("my tool", "'my tool'"; "whitespace")]
    #[test_case("it's", r#"'it'"'"'s'"#; "single quote")]
    #[test_case("$HOME/.config/", "'$HOME/.config/'"; "variable")]
    #[test]
    fn quote_shell_words(input: &str, expect: &str) {
        pretty_assertions::assert_eq!(shell_quote(input), expect);
    }
}
