// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Dockerfile rendering.
//!
//! Every tool becomes a __stage__: a commented block of `ENV`, `RUN`, and
//! `COPY` instructions. Stages are spliced into a fixed header that creates a
//! non-root user with passwordless sudo, so every recipe command runs as that
//! user inside their home directory.

use crate::{
    recipe::{DevEnvironment, RecipeTable, Tool},
    render::{
        reindent, shell_quote,
        template::{Parameters, Template},
        Render, Result,
    },
};

use indexmap::IndexSet;
use indoc::indoc;
use std::fmt::Write;

/// Indentation of continuation lines inside `RUN` instructions.
const RUN_INDENT: usize = 4;

const BASE_TEMPLATE: &str = indoc! {r#"
    # NOTE: This Dockerfile is generated. Do not edit manually.
    FROM <$>base_image
    SHELL ["/bin/bash", "-euo", "pipefail", "-c"]
    ENV SHELL /bin/bash

    RUN <$>update && \
        <$>install_sudo

    ARG USERNAME=<$>username
    ARG USER_UID=1000
    ARG USER_GID=$USER_UID

    RUN groupadd --gid $USER_GID $USERNAME \
        && useradd --uid $USER_UID --gid $USER_GID -m $USERNAME \
        && echo $USERNAME ALL=\(root\) NOPASSWD:ALL > /etc/sudoers.d/$USERNAME \
        && chmod 0440 /etc/sudoers.d/$USERNAME

    USER $USERNAME

    WORKDIR <$>workdir

    ENV HOME=<$>workdir

    <$>tool_stages

    # SecretsUsedInArgOrEnv: Do not use ARG or ENV instructions for sensitive data
    ARG PASSWORD=admin
    RUN echo "${USERNAME}:${PASSWORD}" | sudo chpasswd
"#};

/// Render recipe table as Dockerfile.
#[derive(Debug, Clone)]
pub struct DockerfileRenderer {
    template: Template,
}

impl DockerfileRenderer {
    /// Construct new Dockerfile renderer for target environment.
    ///
    /// Fills in the header of the Dockerfile right away, leaving only the tool
    /// stages to be rendered.
    pub fn new(env: &DevEnvironment) -> Self {
        let distro = env.distro_params();
        let params: Parameters = [
            ("base_image", distro.base_image.as_str()),
            ("update", distro.bootstrap_update.as_str()),
            ("install_sudo", distro.bootstrap_sudo.as_str()),
            ("username", env.username()),
            ("workdir", "/home/$USERNAME"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

        Self {
            template: Template::new(Template::new(BASE_TEMPLATE).safe_substitute(&params)),
        }
    }

    fn render_stage(&self, name: &str, tool: &Tool, prepared: &mut IndexSet<String>) -> String {
        // INVARIANT: Writing into a String never fails.
        let mut stage = String::new();
        let _ = writeln!(stage, "# stage: {}", shell_quote(name));

        if !tool.env.is_empty() {
            let _ = writeln!(stage, "# setting Env for {name}");
            for (key, value) in tool.env.iter().flatten() {
                let _ = writeln!(stage, "ENV {key}={value}");
            }
            stage.push('\n');
        }

        // INVARIANT: First occurrence of prepare command wins across all stages.
        let fresh = tool
            .prepare
            .iter()
            .filter(|command| prepared.insert((*command).clone()))
            .collect::<Vec<_>>();
        if !fresh.is_empty() {
            let _ = writeln!(stage, "# preparation for {name}");
            for command in fresh {
                let _ = writeln!(stage, "RUN {command}");
            }
            stage.push('\n');
        }

        if !tool.copy.is_empty() {
            let _ = writeln!(stage, "# file copy for {name}");
            for spec in &tool.copy {
                let _ = writeln!(
                    stage,
                    "COPY --chown=$USERNAME:$USERNAME {} {}",
                    spec.source, spec.destination
                );
            }
        }

        if !tool.setup.is_empty() {
            let _ = writeln!(stage, "# setup for {name}");
            for command in &tool.setup {
                let _ = writeln!(stage, "RUN {}", reindent(command, RUN_INDENT));
            }
            stage.push('\n');
        }

        stage
    }
}

impl Render for DockerfileRenderer {
    fn render(&self, recipes: &RecipeTable) -> Result<String> {
        let mut prepared = IndexSet::new();
        let stages = recipes
            .iter()
            .map(|(name, tool)| self.render_stage(name, tool, &mut prepared))
            .collect::<Vec<_>>()
            .join("\n");

        let params = Parameters::from([("tool_stages".to_string(), stages)]);
        Ok(self.template.substitute(&params)?)
    }
}
