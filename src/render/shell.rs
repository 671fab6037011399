// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Shell installer rendering.
//!
//! Every tool becomes a bash function named after the tool. The generated
//! script dispatches on its arguments, so the user can pick which tools to
//! install on the current machine:
//!
//! ```text
//! ./setup.sh --install rust go
//! ./setup.sh --list
//! ```
//!
//! # Shared Preparation
//!
//! Prepare commands are hoisted out of the tool functions into a single
//! `install_deps` function, deduplicated in table order. The dispatcher always
//! runs `install_deps` before any tool, so every tool function can rely on its
//! prerequisites no matter which subset of tools gets installed.

use crate::{
    recipe::{RecipeTable, Tool},
    render::{
        reindent,
        template::{Parameters, Template},
        Render, RenderError, Result,
    },
};

use indexmap::IndexMap;
use indoc::indoc;
use std::fmt::Write;
use tracing::warn;

/// Indentation of continuation lines inside function bodies.
const BODY_INDENT: usize = 8;

/// Function name reserved by the dispatcher.
const INSTALL_DEPS: &str = "install_deps";

const SCRIPT_TEMPLATE: &str = indoc! {r#"
    #!/bin/bash

    <$>tool_functions
    function install_deps() {
        echo "Installing base dependencies..."<$>install_deps
    }

    TOOLS=(<$>tool_names)

    function is_tool() {
        local tool
        for tool in "${TOOLS[@]}"; do
            if [ "$tool" == "$1" ]; then
                return 0
            fi
        done
        return 1
    }

    if [ "$1" == "--install" ]; then
        shift
        for tool in "$@"; do
            if ! is_tool "$tool"; then
                echo "Error: Unknown tool '$tool'"
                exit 1
            fi
        done
        install_deps
        for tool in "$@"; do
            "$tool"
        done
    elif [ "$1" == "--list" ]; then
        printf '%s\n' "${TOOLS[@]}"
    else
        echo "Usage: $0 --install tool1 tool2 ... | --list"
        exit 1
    fi
"#};

/// Render recipe table as standalone bash installer.
#[derive(Debug, Clone)]
pub struct SetupShRenderer {
    template: Template,
}

impl SetupShRenderer {
    /// Construct new shell installer renderer.
    pub fn new() -> Self {
        Self {
            template: Template::new(SCRIPT_TEMPLATE),
        }
    }

    fn render_function(&self, name: &str, tool: &Tool) -> String {
        // INVARIANT: Writing into a String never fails.
        let mut body = String::new();

        if !tool.env.is_empty() {
            let _ = writeln!(body, "    # setting env for {name}");
            for (key, value) in tool.env.iter().flatten() {
                let _ = writeln!(body, "    export {key}={value}");
            }
        }

        if !tool.copy.is_empty() {
            let _ = writeln!(body, "    # file copy for {name}");
            for spec in &tool.copy {
                let source = double_quote(&spec.source);
                let destination = double_quote(&spec.destination);
                let _ = writeln!(body, "    mkdir -p \"$(dirname {destination})\"");
                let _ = writeln!(body, "    cp -r {source} {destination}");
            }
        }

        if !tool.setup.is_empty() {
            let _ = writeln!(body, "    # setup for {name}");
            for command in &tool.setup {
                let _ = writeln!(body, "    {}", reindent(command, BODY_INDENT));
            }
        }

        if !tool.validation.is_empty() {
            let _ = writeln!(body, "    # validation for {name}");
            for check in &tool.validation {
                let _ = writeln!(body, "    {}", reindent(check, BODY_INDENT));
            }
        }

        // INVARIANT: Bash rejects functions with empty bodies.
        if body.is_empty() {
            body.push_str("    :\n");
        }

        format!("function {name} {{\n{body}}}\n")
    }
}

impl Default for SetupShRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Render for SetupShRenderer {
    fn render(&self, recipes: &RecipeTable) -> Result<String> {
        if let Some(name) = recipes.names().find(|name| !is_function_name(name)) {
            return Err(RenderError::InvalidFunctionName(name.into()));
        }

        for (name, tool) in recipes.iter().filter(|(name, tool)| calls_itself(name, tool)) {
            warn!("tool {name:?} runs a command of the same name, its function will call itself");
        }

        // INVARIANT: First occurrence of prepare command wins across all tools.
        let mut prepared: IndexMap<&str, &str> = IndexMap::new();
        for (name, tool) in recipes.iter() {
            for command in &tool.prepare {
                prepared.entry(command.as_str()).or_insert(name);
            }
        }

        let mut install_deps = String::new();
        let mut current = None;
        for (command, name) in &prepared {
            if current != Some(*name) {
                let _ = write!(install_deps, "\n    # preparation for {name}");
                current = Some(*name);
            }
            let _ = write!(install_deps, "\n    {command}");
        }

        let functions = recipes
            .iter()
            .map(|(name, tool)| self.render_function(name, tool))
            .collect::<Vec<_>>()
            .join("\n");

        let params: Parameters = [
            ("tool_functions", functions),
            ("install_deps", install_deps),
            ("tool_names", recipes.names().collect::<Vec<_>>().join(" ")),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();

        Ok(self.template.substitute(&params)?)
    }
}

fn is_function_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|ch| ch == '_' || ch.is_ascii_alphabetic());

    starts_well
        && chars.all(|ch| ch == '_' || ch == '-' || ch.is_ascii_alphanumeric())
        && name != INSTALL_DEPS
        && name != "is_tool"
}

/// Check if a step inside the function of a tool starts a command named
/// after the tool, which bash resolves to that same function.
fn calls_itself(name: &str, tool: &Tool) -> bool {
    tool.setup.iter().chain(&tool.validation).any(|command| {
        command
            .split(['&', '|', ';', '\n', '(', '`'])
            .filter_map(|segment| segment.split_whitespace().next())
            .any(|word| word == name)
    })
}

/// Double quote word, keeping parameter expansion alive.
fn double_quote(word: &str) -> String {
    let escaped = word
        .replace('\\', r"\\")
        .replace('"', r#"\""#)
        .replace('`', r"\`");
    format!("\"{escaped}\"")
}
