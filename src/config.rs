// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout for profile files that envcraft uses to simplify the
//! process of serialization and deserialization. File I/O is left to the
//! caller to figure out.
//!
//! # Profiles
//!
//! A __profile__ describes one development environment: which tools go into
//! it, how its container should be built and run, and which dotfiles should be
//! linked into the home directory of its user. Profiles are grouped by name
//! into a single file, traditionally called `profiles.json`:
//!
//! ```json
//! {
//!   "dev-rpm-full": {
//!     "name": "full",
//!     "docker": {
//!       "base_image": "rockylinux:9",
//!       "container_user": "blue",
//!       "exposed_ports": [2222],
//!       "volumes": [{ "source": "~/work", "target": "/home/blue/work" }]
//!     },
//!     "dev_env": { "tools": ["python", "rust", "go"] },
//!     "dotfiles": [".bashrc", ".config/starship.toml"]
//!   }
//! }
//! ```
//!
//! The same layout can be written in TOML, with one table per profile.

use crate::recipe::catalog::DEFAULT_USERNAME;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{path::Path, str::FromStr};

/// Encoding of a profile file.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFormat {
    #[default]
    Json,
    Toml,
}

impl ProfileFormat {
    /// Determine encoding from file extension, defaulting to JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

/// Named listing of profiles.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ProfileSet {
    profiles: IndexMap<String, Profile>,
}

impl ProfileSet {
    /// Parse profile set in target encoding.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Json`] or [`ConfigError::Deserialize`] if data
    ///   does not follow profile layout.
    pub fn parse(data: &str, format: ProfileFormat) -> Result<Self> {
        match format {
            ProfileFormat::Json => serde_json::from_str(data).map_err(ConfigError::Json),
            ProfileFormat::Toml => toml::de::from_str(data).map_err(ConfigError::Deserialize),
        }
    }

    /// Get profile by name.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::NoProfile`] listing available profile names
    ///   if target profile does not exist.
    pub fn get(&self, name: impl AsRef<str>) -> Result<&Profile> {
        self.profiles
            .get(name.as_ref())
            .ok_or_else(|| ConfigError::NoProfile {
                name: name.as_ref().into(),
                available: self.names().collect::<Vec<_>>().join(", "),
            })
    }

    /// Insert profile under target name.
    pub fn insert(&mut self, name: impl Into<String>, profile: Profile) -> Option<Profile> {
        self.profiles.insert(name.into(), profile)
    }

    /// List profile names in file order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}

impl FromStr for ProfileSet {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        Self::parse(data, ProfileFormat::Json)
    }
}

/// Development environment profile.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Short name used for generated file names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Container build and run settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<DockerSettings>,

    /// Tool selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_env: Option<DevEnvSettings>,

    /// Dotfiles to link into home directory, relative to dotfiles source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dotfiles: Option<Vec<String>>,
}

impl Profile {
    /// Tools selected by profile, empty if profile selects nothing.
    pub fn tools(&self) -> &[String] {
        self.dev_env
            .as_ref()
            .map(|dev_env| dev_env.tools.as_slice())
            .unwrap_or_default()
    }
}

/// Container settings of a profile.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct DockerSettings {
    /// Base image replacing the distro family default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_image: Option<String>,

    /// User created inside container.
    #[serde(default = "default_container_user")]
    pub container_user: String,

    /// Ports published on the same host port.
    #[serde(default)]
    pub exposed_ports: Vec<u16>,

    /// Bind mounts.
    #[serde(default)]
    pub volumes: Vec<VolumeMount>,
}

impl Default for DockerSettings {
    fn default() -> Self {
        Self {
            base_image: None,
            container_user: default_container_user(),
            exposed_ports: Vec::new(),
            volumes: Vec::new(),
        }
    }
}

fn default_container_user() -> String {
    DEFAULT_USERNAME.into()
}

/// Bind mount of host path into container.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct VolumeMount {
    /// Host path, shell expanded before use.
    pub source: String,

    /// Path inside container.
    pub target: String,

    /// Mount mode, e.g., "rw" or "ro".
    #[serde(default = "default_volume_mode")]
    pub mode: String,
}

fn default_volume_mode() -> String {
    "rw".into()
}

/// Tool selection of a profile.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct DevEnvSettings {
    /// Tools to include, in rendering order.
    #[serde(default)]
    pub tools: Vec<String>,
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize TOML configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to deserialize JSON configuration.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Target profile does not exist.
    #[error("profile {name:?} not found, available profiles: {available}")]
    NoProfile { name: String, available: String },
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn full_profile() -> Profile {
        Profile {
            name: Some("full".into()),
            docker: Some(DockerSettings {
                base_image: Some("rockylinux:9".into()),
                container_user: "blue".into(),
                exposed_ports: vec![2222, 8080],
                volumes: vec![VolumeMount {
                    source: "~/work".into(),
                    target: "/home/blue/work".into(),
                    mode: "rw".into(),
                }],
            }),
            dev_env: Some(DevEnvSettings {
                tools: vec!["python".into(), "rust".into()],
            }),
            dotfiles: Some(vec![".bashrc".into(), ".config/starship.toml".into()]),
        }
    }

    #[test]
    fn deserialize_json_profiles() -> anyhow::Result<()> {
        let result: ProfileSet = indoc! {r#"
            {
              "dev-rpm-full": {
                "name": "full",
                "docker": {
                  "base_image": "rockylinux:9",
                  "exposed_ports": [2222, 8080],
                  "volumes": [{ "source": "~/work", "target": "/home/blue/work" }]
                },
                "dev_env": { "tools": ["python", "rust"] },
                "dotfiles": [".bashrc", ".config/starship.toml"]
              },
              "minimal": {}
            }
        "#}
        .parse()?;

        let mut expect = ProfileSet::default();
        expect.insert("dev-rpm-full", full_profile());
        expect.insert("minimal", Profile::default());

        assert_eq!(result, expect);
        assert_eq!(result.names().collect::<Vec<_>>(), vec!["dev-rpm-full", "minimal"]);

        Ok(())
    }

    #[test]
    fn deserialize_toml_profiles() -> anyhow::Result<()> {
        let data = indoc! {r#"
            [dev-rpm-full]
            name = "full"
            dotfiles = [".bashrc", ".config/starship.toml"]

            [dev-rpm-full.docker]
            base_image = "rockylinux:9"
            exposed_ports = [2222, 8080]
            volumes = [{ source = "~/work", target = "/home/blue/work", mode = "rw" }]

            [dev-rpm-full.dev_env]
            tools = ["python", "rust"]
        "#};
        let result = ProfileSet::parse(data, ProfileFormat::from_path("profiles.toml"))?;

        assert_eq!(result.get("dev-rpm-full")?, &full_profile());

        Ok(())
    }

    #[test]
    fn missing_profile_lists_available_ones() -> anyhow::Result<()> {
        let set: ProfileSet = r#"{ "a": {}, "b": {} }"#.parse()?;
        let error = set.get("c").unwrap_err();
        assert_eq!(
            error.to_string(),
            r#"profile "c" not found, available profiles: a, b"#
        );

        Ok(())
    }

    #[test]
    fn profile_tools_default_to_empty() {
        assert!(Profile::default().tools().is_empty());
        assert_eq!(full_profile().tools(), ["python".to_string(), "rust".to_string()]);
    }

    #[test]
    fn profile_format_from_extension() {
        assert_eq!(ProfileFormat::from_path("profiles.json"), ProfileFormat::Json);
        assert_eq!(ProfileFormat::from_path("dir/profiles.TOML"), ProfileFormat::Toml);
        assert_eq!(ProfileFormat::from_path("profiles"), ProfileFormat::Json);
    }
}
