// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Dotfile linking.
//!
//! Link dotfiles from a source directory into the home directory of the
//! user, e.g., `~/.bashrc -> ~/.dotfiles/.bashrc`. Regular files and
//! directories that are in the way get moved into a timestamped backup
//! directory first, so nothing the user had is ever lost.

use std::{
    fs,
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

/// Outcome of installing a listing of dotfiles.
///
/// All paths are relative to the dotfile source directory.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct InstallReport {
    /// Dotfiles that were linked into home directory.
    pub linked: Vec<PathBuf>,

    /// Dotfiles whose existing target got moved into backup directory.
    pub backed_up: Vec<PathBuf>,

    /// Dotfiles without a source file.
    pub skipped: Vec<PathBuf>,

    /// Dotfiles that could not be linked.
    pub failed: Vec<PathBuf>,
}

/// Dotfile link manager.
#[derive(Debug, Clone)]
pub struct DotfilesManager {
    source_dir: PathBuf,
    home_dir: PathBuf,
    backup_dir: PathBuf,
}

impl DotfilesManager {
    /// Construct new dotfile manager.
    ///
    /// Backups go into `<home_dir>/.dotfiles-backup-<YYYYmmdd-HHMMSS>`, named
    /// after the local time of construction.
    ///
    /// # Errors
    ///
    /// - Return [`DotsyncError::NoSourceDir`] if source directory does not
    ///   exist.
    pub fn new(source_dir: impl AsRef<Path>, home_dir: impl Into<PathBuf>) -> Result<Self> {
        let source_dir = source_dir.as_ref();
        if !source_dir.is_dir() {
            return Err(DotsyncError::NoSourceDir(source_dir.into()));
        }

        // INVARIANT: Link targets must be absolute to stay valid from any directory.
        let source_dir = std::path::absolute(source_dir).map_err(|error| DotsyncError::Io {
            path: source_dir.into(),
            source: error,
        })?;

        let home_dir = home_dir.into();
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let backup_dir = home_dir.join(format!(".dotfiles-backup-{stamp}"));

        Ok(Self {
            source_dir,
            home_dir,
            backup_dir,
        })
    }

    /// Replace backup directory.
    pub fn with_backup_dir(mut self, backup_dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = backup_dir.into();
        self
    }

    pub fn source_dir(&self) -> &Path {
        self.source_dir.as_path()
    }

    pub fn home_dir(&self) -> &Path {
        self.home_dir.as_path()
    }

    pub fn backup_dir(&self) -> &Path {
        self.backup_dir.as_path()
    }

    /// Link listing of dotfiles into home directory.
    ///
    /// Every path is relative to the source directory, and gets linked at the
    /// same relative path in the home directory. Failing to link one dotfile
    /// does not stop the others from being linked.
    #[instrument(skip(self, files), level = "debug")]
    pub fn install(&self, files: impl IntoIterator<Item = impl AsRef<Path>>) -> InstallReport {
        let mut report = InstallReport::default();

        for file in files {
            let file = file.as_ref();
            let source = self.source_dir.join(file);

            if !is_relative_inside(file) {
                warn!("dotfile {file:?} must be a relative path inside the source directory");
                report.failed.push(file.into());
                continue;
            }

            if fs::symlink_metadata(&source).is_err() {
                warn!("source file does not exist: {source:?}");
                report.skipped.push(file.into());
                continue;
            }

            match self.link(file, &source) {
                Ok(backed_up) => {
                    if backed_up {
                        report.backed_up.push(file.into());
                    }
                    report.linked.push(file.into());
                }
                Err(error) => {
                    warn!("failed to link {file:?}: {error}");
                    report.failed.push(file.into());
                }
            }
        }

        report
    }

    /// Link single dotfile, returning whether an existing target was backed up.
    fn link(&self, file: &Path, source: &Path) -> Result<bool> {
        let target = self.home_dir.join(file);
        let mut backed_up = false;

        if let Some(parent) = target.parent() {
            create_dir_all(parent)?;
        }

        match fs::symlink_metadata(&target) {
            Ok(meta) if meta.file_type().is_symlink() => {
                fs::remove_file(&target).map_err(|error| io_error(&target, error))?;
            }
            Ok(_) => {
                let backup = self.backup_dir.join(file);
                if let Some(parent) = backup.parent() {
                    create_dir_all(parent)?;
                }
                info!("backing up existing {target:?} to {backup:?}");
                move_path(&target, &backup).map_err(|error| io_error(&target, error))?;
                backed_up = true;
            }
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => return Err(io_error(&target, error)),
        }

        symlink(source, &target).map_err(|error| io_error(&target, error))?;
        info!("created symlink: {target:?} -> {source:?}");

        Ok(backed_up)
    }
}

fn is_relative_inside(path: &Path) -> bool {
    path.components().next().is_some()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
}

/// Move file or directory, copying it over when rename cannot cross
/// filesystems, e.g., for a bind mounted volume under home.
fn move_path(from: &Path, to: &Path) -> std::io::Result<()> {
    match fs::rename(from, to) {
        Err(error) if error.kind() == ErrorKind::CrossesDevices => {
            debug!("{from:?} and {to:?} are on different filesystems, copying instead");
            copy_then_remove(from, to)
        }
        result => result,
    }
}

fn copy_then_remove(from: &Path, to: &Path) -> std::io::Result<()> {
    for entry in WalkDir::new(from) {
        let entry = entry?;

        // INVARIANT: Every walked entry lives under the root it was walked from.
        let relative = entry.path().strip_prefix(from).map_err(std::io::Error::other)?;
        let dest = if relative.as_os_str().is_empty() {
            to.to_path_buf()
        } else {
            to.join(relative)
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&dest)?;
        } else if file_type.is_symlink() {
            symlink(&fs::read_link(entry.path())?, &dest)?;
        } else {
            fs::copy(entry.path(), &dest)?;
        }
    }

    if fs::symlink_metadata(from)?.is_dir() {
        fs::remove_dir_all(from)
    } else {
        fs::remove_file(from)
    }
}

fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|error| io_error(path, error))
}

fn io_error(path: &Path, error: std::io::Error) -> DotsyncError {
    DotsyncError::Io {
        path: path.into(),
        source: error,
    }
}

#[cfg(unix)]
fn symlink(source: &Path, target: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, target)
}

#[cfg(windows)]
fn symlink(source: &Path, target: &Path) -> std::io::Result<()> {
    if source.is_dir() {
        std::os::windows::fs::symlink_dir(source, target)
    } else {
        std::os::windows::fs::symlink_file(source, target)
    }
}

/// Dotfile linking error types.
#[derive(Debug, thiserror::Error)]
pub enum DotsyncError {
    /// Dotfile source directory does not exist.
    #[error("dotfile source directory {0:?} does not exist")]
    NoSourceDir(PathBuf),

    /// Filesystem operation failed on path.
    #[error("failed to link at {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Friendly result alias :3
type Result<T, E = DotsyncError> = std::result::Result<T, E>;
