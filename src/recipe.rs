// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Tool recipes.
//!
//! A __recipe__ is a named bundle of install steps for one tool. Recipes are
//! collected into an ordered [`RecipeTable`], which is the single source of
//! truth for every artifact that envcraft renders.
//!
//! # Step Kinds
//!
//! Each tool may carry any of the following step kinds, always rendered in the
//! same order:
//!
//! 1. `env`: environment variables the tool needs afterwards.
//! 2. `prepare`: commands that install prerequisites. These are commonly
//!    shared between tools, e.g., installing curl, so renderers only emit the
//!    first occurrence of each.
//! 3. `copy`: files to copy from the build context.
//! 4. `setup`: the actual install commands.
//! 5. `validation`: checks that the tool works once installed.
//!
//! # Recipe Files
//!
//! Users can extend or override the built-in catalog through a TOML recipe
//! file:
//!
//! ```toml
//! [versions]
//! go = "go1.24.0"
//!
//! [tool.bat]
//! prepare = ["<$>tar_install"]
//! setup = ["curl -L https://example.org/bat-<$>eza_target.tar.gz | tar -xz"]
//! validation = ["command -v bat"]
//! ```
//!
//! Strings in a recipe file may refer to platform parameters through `<$>`
//! placeholders. See [`DevEnvironment::parameters`] for what is available.

pub mod catalog;

pub use catalog::DevEnvironment;

use crate::{
    platform::Versions,
    render::template::{Parameters, Template, TemplateError},
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    str::FromStr,
};
use tracing::warn;

/// Name of tool that every selection keeps.
pub const INIT_TOOL: &str = "init";

/// Environment variable assignments.
pub type EnvVars = IndexMap<String, String>;

/// Install steps of a single tool.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Tool {
    /// Environment variables to set.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVars>,

    /// Prerequisite commands shared across tools.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prepare: Vec<String>,

    /// Files to copy from build context.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub copy: Vec<CopySpec>,

    /// Install commands.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub setup: Vec<String>,

    /// Post-install checks.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<String>,
}

impl Tool {
    /// Construct new empty tool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add environment variable assignment.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push(EnvVars::from([(key.into(), value.into())]));
        self
    }

    /// Add prerequisite command.
    pub fn prepare(mut self, command: impl Into<String>) -> Self {
        self.prepare.push(command.into());
        self
    }

    /// Add file copy.
    pub fn copy(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.copy.push(CopySpec {
            source: source.into(),
            destination: destination.into(),
        });
        self
    }

    /// Add install command.
    pub fn setup(mut self, command: impl Into<String>) -> Self {
        self.setup.push(command.into());
        self
    }

    /// Add a listing of install commands.
    pub fn setup_all(mut self, commands: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.setup.extend(commands.into_iter().map(Into::into));
        self
    }

    /// Add post-install check.
    pub fn validation(mut self, check: impl Into<String>) -> Self {
        self.validation.push(check.into());
        self
    }

    /// Fill in `<$>` placeholders of every step.
    ///
    /// # Errors
    ///
    /// - Return [`RecipeError::Template`] if a placeholder is unknown or
    ///   malformed.
    pub fn resolve(&self, params: &Parameters) -> Result<Self> {
        let fill = |text: &String| Template::new(text.as_str()).substitute(params);
        let fill_all = |texts: &[String]| texts.iter().map(fill).collect::<Result<Vec<_>, _>>();

        let env = self
            .env
            .iter()
            .map(|vars| {
                vars.iter()
                    .map(|(key, value)| Ok((key.clone(), fill(value)?)))
                    .collect::<Result<EnvVars, TemplateError>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        let copy = self
            .copy
            .iter()
            .map(|spec| {
                Ok(CopySpec {
                    source: fill(&spec.source)?,
                    destination: fill(&spec.destination)?,
                })
            })
            .collect::<Result<Vec<_>, TemplateError>>()?;

        Ok(Self {
            env,
            prepare: fill_all(&self.prepare)?,
            copy,
            setup: fill_all(&self.setup)?,
            validation: fill_all(&self.validation)?,
        })
    }
}

/// File copy from build context.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct CopySpec {
    /// Path relative to build context.
    pub source: String,

    /// Destination path inside target environment.
    pub destination: String,
}

/// Ordered mapping of tool names to their recipes.
///
/// # Invariant
///
/// - Insertion order is rendering order.
/// - Replacing an existing tool keeps its original position.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RecipeTable {
    tools: IndexMap<String, Tool>,
}

impl RecipeTable {
    /// Construct new empty recipe table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert tool recipe, replacing any recipe under the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, tool: Tool) -> Option<Tool> {
        self.tools.insert(name.into(), tool)
    }

    /// Chainable form of [`RecipeTable::insert`].
    pub fn with(mut self, name: impl Into<String>, tool: Tool) -> Self {
        self.insert(name, tool);
        self
    }

    /// Get recipe of target tool.
    pub fn get(&self, name: impl AsRef<str>) -> Option<&Tool> {
        self.tools.get(name.as_ref())
    }

    /// Iterate through tools in rendering order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tool)> {
        self.tools.iter().map(|(name, tool)| (name.as_str(), tool))
    }

    /// List tool names in rendering order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    /// Merge recipes of another table into this one.
    ///
    /// Tools already present are replaced in place, new tools are appended.
    pub fn extend(&mut self, other: RecipeTable) {
        self.tools.extend(other.tools);
    }

    /// Narrow table down to a selection of tools.
    ///
    /// Selected tools are kept in the order they were requested. Unknown names
    /// are skipped. An empty selection keeps the whole table.
    ///
    /// The `init` tool is always kept and always comes first, even when the
    /// selection omits it or lists it after other tools. It is never appended
    /// after the selection, since every other tool relies on the base packages
    /// it installs.
    pub fn select(&self, names: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        let mut selected = IndexMap::new();
        if let Some(init) = self.tools.get(INIT_TOOL) {
            selected.insert(INIT_TOOL.to_string(), init.clone());
        }

        let mut requested = false;
        for name in names {
            requested = true;
            let name = name.as_ref();
            match self.tools.get(name) {
                Some(tool) => {
                    selected.insert(name.to_string(), tool.clone());
                }
                None => warn!("no recipe for tool {name:?}, skipping it"),
            }
        }

        if !requested {
            return self.clone();
        }

        Self { tools: selected }
    }

    /// Fill in `<$>` placeholders of every tool.
    ///
    /// # Errors
    ///
    /// - Return [`RecipeError::Template`] if any placeholder is unknown or
    ///   malformed.
    pub fn resolve(&self, params: &Parameters) -> Result<Self> {
        let tools = self
            .tools
            .iter()
            .map(|(name, tool)| Ok((name.clone(), tool.resolve(params)?)))
            .collect::<Result<IndexMap<_, _>>>()?;

        Ok(Self { tools })
    }
}

impl FromIterator<(String, Tool)> for RecipeTable {
    fn from_iter<I: IntoIterator<Item = (String, Tool)>>(iter: I) -> Self {
        Self {
            tools: iter.into_iter().collect(),
        }
    }
}

/// User recipe file layout.
///
/// Pin overrides are optional. Missing pins keep their default value.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct RecipeFile {
    /// Version pin overrides for the built-in catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub versions: Option<Versions>,

    /// Extra or replacement tools, still holding `<$>` placeholders.
    #[serde(default, rename = "tool")]
    pub tools: RecipeTable,
}

impl FromStr for RecipeFile {
    type Err = RecipeError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        toml::de::from_str(data).map_err(RecipeError::Deserialize)
    }
}

impl Display for RecipeFile {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(RecipeError::Serialize)?
                .as_str(),
        )
    }
}

/// Recipe error types.
#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    /// Failed to deserialize recipe file.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize recipe file.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to fill in recipe placeholders.
    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl From<RecipeError> for FmtError {
    fn from(_: RecipeError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = RecipeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn sample_table() -> RecipeTable {
        RecipeTable::new()
            .with("init", Tool::new().setup("sudo dnf install -y vim"))
            .with("rust", Tool::new().setup("curl https://sh.rustup.rs | sh"))
            .with("go", Tool::new().prepare("sudo dnf install -y curl"))
            .with("pnpm", Tool::new().setup("curl -fsSL https://get.pnpm.io/install.sh | sh -"))
    }

    #[test]
    fn select_keeps_requested_order_with_init_first() {
        let result = sample_table().select(["pnpm", "zig", "rust"]);
        assert_eq!(result.names().collect::<Vec<_>>(), vec!["init", "pnpm", "rust"]);
    }

    #[test]
    fn select_moves_listed_init_to_front() {
        let result = sample_table().select(["rust", "init", "pnpm"]);
        assert_eq!(result.names().collect::<Vec<_>>(), vec!["init", "rust", "pnpm"]);
    }

    #[test]
    fn select_nothing_keeps_everything() {
        let table = sample_table();
        assert_eq!(table.select(Vec::<String>::new()), table);
    }

    #[test]
    fn extend_replaces_in_place_and_appends() {
        let mut table = sample_table();
        table.extend(
            RecipeTable::new()
                .with("rust", Tool::new().setup("rustup update"))
                .with("zig", Tool::new().setup("echo zig")),
        );

        assert_eq!(
            table.names().collect::<Vec<_>>(),
            vec!["init", "rust", "go", "pnpm", "zig"]
        );
        assert_eq!(table.get("rust").unwrap().setup, vec!["rustup update".to_string()]);
    }

    #[test]
    fn deserialize_recipe_file() -> anyhow::Result<()> {
        let result: RecipeFile = indoc! {r#"
            [versions]
            go = "go1.24.0"

            [tool.zoxide]
            env = [{ PATH = "$HOME/.local/bin:$PATH" }]
            prepare = ["<$>curl_install"]
            setup = ["curl -sS https://zoxide.sh/install.sh | bash"]
            validation = ["command -v zoxide"]

            [tool.bat]
            copy = [{ source = "bat.conf", destination = "$HOME/.config/bat/" }]
        "#}
        .parse()?;

        let expect = RecipeFile {
            versions: Some(Versions {
                go: "go1.24.0".into(),
                ..Versions::default()
            }),
            tools: RecipeTable::new()
                .with(
                    "zoxide",
                    Tool::new()
                        .env("PATH", "$HOME/.local/bin:$PATH")
                        .prepare("<$>curl_install")
                        .setup("curl -sS https://zoxide.sh/install.sh | bash")
                        .validation("command -v zoxide"),
                )
                .with("bat", Tool::new().copy("bat.conf", "$HOME/.config/bat/")),
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn serialize_recipe_file_skips_empty_steps() {
        let result = RecipeFile {
            versions: None,
            tools: RecipeTable::new().with("fd", Tool::new().setup("cargo install fd-find")),
        }
        .to_string();

        assert!(result.contains("[tool.fd]"));
        assert!(result.contains(r#"setup = ["cargo install fd-find"]"#));
        assert!(!result.contains("versions"));
        assert!(!result.contains("prepare"));
    }

    #[test]
    fn resolve_fills_placeholders_in_every_step() -> anyhow::Result<()> {
        let params = Parameters::from([
            ("curl_install".to_string(), "sudo apt install -y curl".to_string()),
            ("go_arch".to_string(), "arm64".to_string()),
        ]);
        let tool = Tool::new()
            .env("GOARCH", "<$>go_arch")
            .prepare("<$>curl_install")
            .copy("go-<$>go_arch.env", "$HOME/")
            .setup("echo <$>{go_arch}");

        let result = tool.resolve(&params)?;
        assert_eq!(result.env[0]["GOARCH"], "arm64");
        assert_eq!(result.prepare, vec!["sudo apt install -y curl".to_string()]);
        assert_eq!(result.copy[0].source, "go-arm64.env");
        assert_eq!(result.setup, vec!["echo arm64".to_string()]);

        Ok(())
    }

    #[test]
    fn resolve_rejects_unknown_placeholder() {
        let table = RecipeTable::new().with("x", Tool::new().setup("<$>nope"));
        let result = table.resolve(&Parameters::new());
        assert!(matches!(
            result,
            Err(RecipeError::Template(TemplateError::Missing(name))) if name == "nope"
        ));
    }
}
