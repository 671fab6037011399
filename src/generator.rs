// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Artifact generation.
//!
//! Glue between target environment, tool selection, user recipe files, and
//! the renderers. A [`Generator`] always holds the final recipe table, so what
//! gets rendered is exactly what [`Generator::recipes`] shows.

use crate::{
    config::Profile,
    platform::{Arch, Distro},
    recipe::{DevEnvironment, RecipeError, RecipeFile, RecipeTable},
    render::{dockerfile::DockerfileRenderer, shell::SetupShRenderer, Render, RenderError},
};

use std::{fs, path::Path};
use tracing::{info, instrument};

/// Name used for profile artifacts when nothing better is known.
pub const DEFAULT_PROFILE_NAME: &str = "default";

/// Artifact generator.
#[derive(Debug, Clone)]
pub struct Generator {
    env: DevEnvironment,
    selection: Vec<String>,
    extra: RecipeTable,
    recipes: RecipeTable,
}

impl Generator {
    /// Construct new generator for whole built-in catalog of target
    /// environment.
    pub fn new(env: DevEnvironment) -> Self {
        let recipes = env.recipes();
        Self {
            env,
            selection: Vec::new(),
            extra: RecipeTable::new(),
            recipes,
        }
    }

    /// Construct new generator for profile.
    ///
    /// The docker section of the profile picks the container user and base
    /// image, and its tool listing narrows down the catalog. The profile name
    /// is passed on to the `dotfiles` tool, so dotfiles of the same profile
    /// get installed inside the container.
    pub fn from_profile(
        profile: &Profile,
        profile_name: Option<&str>,
        distro: Distro,
        arch: Arch,
    ) -> Self {
        let mut env = DevEnvironment::new(distro, arch);
        if let Some(docker) = &profile.docker {
            env = env.with_username(docker.container_user.as_str());
            if let Some(image) = &docker.base_image {
                env = env.with_base_image(image.as_str());
            }
        }

        if let Some(name) = profile_name {
            env = env.with_profile(name);
        }

        Self::new(env).with_selection(profile.tools())
    }

    /// Narrow generated artifacts down to a selection of tools.
    ///
    /// See [`RecipeTable::select`] for selection rules.
    pub fn with_selection(mut self, tools: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.selection = tools.into_iter().map(Into::into).collect();
        self.refresh();
        self
    }

    /// Replace command that runs `dotsync install` inside the container.
    ///
    /// See [`DevEnvironment::with_dotsync_command`].
    pub fn with_dotsync_command(mut self, command: impl Into<String>) -> Self {
        self.env = self.env.with_dotsync_command(command);
        self.refresh();
        self
    }

    /// Apply user recipe file.
    ///
    /// Version pin overrides regenerate the built-in catalog. Recipe file
    /// tools have their placeholders filled in for the target environment,
    /// then replace built-in tools of the same name or get appended after
    /// them.
    ///
    /// # Errors
    ///
    /// - Return [`GeneratorError::Recipe`] if a recipe file tool refers to an
    ///   unknown placeholder.
    pub fn with_recipe_file(mut self, recipe_file: RecipeFile) -> Result<Self> {
        if let Some(versions) = recipe_file.versions {
            self.env = self.env.with_versions(versions);
        }

        self.extra
            .extend(recipe_file.tools.resolve(&self.env.parameters())?);
        self.refresh();

        Ok(self)
    }

    fn refresh(&mut self) {
        let mut recipes = self.env.recipes();
        recipes.extend(self.extra.clone());
        self.recipes = recipes.select(&self.selection);
    }

    pub fn env(&self) -> &DevEnvironment {
        &self.env
    }

    pub fn recipes(&self) -> &RecipeTable {
        &self.recipes
    }

    /// Render Dockerfile.
    ///
    /// # Errors
    ///
    /// - Return [`GeneratorError::Render`] if rendering fails.
    pub fn dockerfile(&self) -> Result<String> {
        Ok(DockerfileRenderer::new(&self.env).render(&self.recipes)?)
    }

    /// Render standalone shell installer.
    ///
    /// # Errors
    ///
    /// - Return [`GeneratorError::Render`] if a tool name is not a valid
    ///   shell function name.
    pub fn setup_sh(&self) -> Result<String> {
        Ok(SetupShRenderer::new().render(&self.recipes)?)
    }

    /// Render Dockerfile and write it to target path.
    ///
    /// Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// - Return [`GeneratorError::Render`] if rendering fails.
    /// - Return [`GeneratorError::Write`] if file cannot be written.
    #[instrument(skip(self, path), level = "debug")]
    pub fn write_dockerfile(&self, path: impl AsRef<Path>) -> Result<String> {
        let dockerfile = self.dockerfile()?;
        write(path.as_ref(), &dockerfile)?;
        info!("written Dockerfile to {:?}", path.as_ref());

        Ok(dockerfile)
    }

    /// Render shell installer and write it to target path.
    ///
    /// Parent directories are created as needed, and the script is made
    /// executable on unix.
    ///
    /// # Errors
    ///
    /// - Return [`GeneratorError::Render`] if rendering fails.
    /// - Return [`GeneratorError::Write`] if file cannot be written.
    #[instrument(skip(self, path), level = "debug")]
    pub fn write_setup_sh(&self, path: impl AsRef<Path>) -> Result<String> {
        let script = self.setup_sh()?;
        let path = path.as_ref();
        write(path, &script)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o755))
                .map_err(|error| write_error(path, error))?;
        }

        info!("written setup script to {path:?}");

        Ok(script)
    }
}

/// Pick name of profile artifacts.
///
/// Prefers the short name inside the profile, then the name the profile was
/// selected by, then [`DEFAULT_PROFILE_NAME`].
pub fn profile_output_name<'a>(profile: &'a Profile, profile_name: Option<&'a str>) -> &'a str {
    profile
        .name
        .as_deref()
        .or(profile_name)
        .unwrap_or(DEFAULT_PROFILE_NAME)
}

fn write(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|error| write_error(parent, error))?;
    }

    fs::write(path, data).map_err(|error| write_error(path, error))
}

fn write_error(path: &Path, error: std::io::Error) -> GeneratorError {
    GeneratorError::Write {
        path: path.into(),
        source: error,
    }
}

/// Generator error types.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// Recipe file could not be applied.
    #[error(transparent)]
    Recipe(#[from] RecipeError),

    /// Artifact could not be rendered.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Artifact could not be written.
    #[error("failed to write {path:?}")]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Friendly result alias :3
type Result<T, E = GeneratorError> = std::result::Result<T, E>;
