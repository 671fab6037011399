// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for external files that need to be
//! read or written, i.e., generated artifacts and user supplied paths.

use crate::platform::{Arch, Distro};

use std::path::{Path, PathBuf};

/// Determine absolute path to user's home directory.
///
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(NoWayHome)
}

/// Determine default directory for profile build artifacts.
///
/// Uses `$HOME/.devenv`. Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn devenv_dir() -> Result<PathBuf> {
    home_dir().map(|path| path.join(".devenv"))
}

/// Default file name of generated Dockerfile.
pub fn dockerfile_name(distro: Distro, arch: Arch) -> PathBuf {
    PathBuf::from(format!("Dockerfile.{distro}.{arch}"))
}

/// Default file name of generated shell installer.
pub fn setup_sh_name(distro: Distro, arch: Arch) -> PathBuf {
    PathBuf::from(format!("setup.{distro}.{arch}.sh"))
}

/// Default path of Dockerfile generated for a profile.
pub fn profile_dockerfile_path(
    devenv_dir: impl AsRef<Path>,
    profile: &str,
    distro: Distro,
    arch: Arch,
) -> PathBuf {
    devenv_dir
        .as_ref()
        .join(format!("Dockerfile.{profile}.{distro}.{arch}"))
}

/// Expand `~` and environment variables in user supplied path.
///
/// # Errors
///
/// - Return [`ExpandError`] if a referenced variable is not set.
pub fn expand(path: &str) -> std::result::Result<PathBuf, ExpandError> {
    Ok(PathBuf::from(shellexpand::full(path)?.into_owned()))
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Path contains a variable that cannot be expanded.
pub type ExpandError = shellexpand::LookupError<std::env::VarError>;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
