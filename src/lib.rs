// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Development environment generator.
//!
//! Envcraft keeps one catalog of tool recipes, and turns it into either a
//! Dockerfile that bakes every tool into a container image, or a standalone
//! `setup.sh` that installs tools on an existing machine. Profiles select
//! which tools go into an environment, how its container runs, and which
//! dotfiles get linked into the home directory of its user.
//!
//! # Layout
//!
//! 1. [`platform`]: target architecture, distro family, and version pins.
//! 2. [`recipe`]: recipe tables, the built-in catalog, and recipe files.
//! 3. [`render`]: Dockerfile and shell installer projections.
//! 4. [`generator`]: glue between profiles, recipes, and renderers.
//! 5. [`config`]: profile file layout.
//! 6. [`container`]: docker CLI driver.
//! 7. [`dotsync`]: dotfile linking.
//! 8. [`path`]: path resolution utilities.

pub mod config;
pub mod container;
pub mod dotsync;
pub mod generator;
pub mod path;
pub mod platform;
pub mod recipe;
pub mod render;

pub use config::{Profile, ProfileFormat, ProfileSet};
pub use generator::Generator;
pub use platform::{Arch, Distro};
pub use recipe::{DevEnvironment, RecipeFile, RecipeTable, Tool};
