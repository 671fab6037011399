// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Container management.
//!
//! Thin layer over the docker CLI to run, list, delete, and log into the
//! containers built from generated Dockerfiles. Every container started by
//! envcraft is labeled, so listing and cleanup never touch containers that
//! envcraft does not own.

use crate::{config::DockerSettings, path};

use std::{
    ffi::{OsStr, OsString},
    path::PathBuf,
    process::Command,
};
use tracing::{debug, info, instrument, warn};

/// Label attached to every container started by envcraft.
pub const MANAGED_LABEL: &str = "envcraft=true";

/// Label key naming the container that a resource belongs to.
pub const CONTAINER_LABEL_KEY: &str = "envcraft.container";

/// Build argument listing for `docker run`.
///
/// Publishes every exposed port on the same host port, and bind mounts every
/// volume with its host path expanded and made absolute.
///
/// # Errors
///
/// - Return [`ContainerError::ShellExpansion`] if a volume source refers to
///   an unset variable.
/// - Return [`ContainerError::Syscall`] if a volume source cannot be made
///   absolute.
pub fn run_args(
    docker: &DockerSettings,
    image: impl AsRef<str>,
    name: Option<&str>,
) -> Result<Vec<OsString>> {
    let mut args: Vec<OsString> = vec!["run".into(), "-d".into(), "--label".into(), MANAGED_LABEL.into()];

    if let Some(name) = name {
        args.extend([
            "--name".into(),
            name.into(),
            "--label".into(),
            format!("{CONTAINER_LABEL_KEY}={name}").into(),
        ]);
    }

    for port in &docker.exposed_ports {
        args.extend(["-p".into(), format!("{port}:{port}").into()]);
    }

    for volume in &docker.volumes {
        let source = absolute(path::expand(&volume.source)?)?;
        args.extend([
            "-v".into(),
            format!("{}:{}:{}", source.display(), volume.target, volume.mode).into(),
        ]);
    }

    args.push(image.as_ref().into());

    Ok(args)
}

fn absolute(path: PathBuf) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}

/// Docker CLI driver.
#[derive(Debug, Clone)]
pub struct DockerCli {
    bin: OsString,
}

impl DockerCli {
    /// Construct new driver for docker binary found in `PATH`.
    pub fn new() -> Self {
        Self::with_binary("docker")
    }

    /// Construct new driver for target docker compatible binary.
    pub fn with_binary(bin: impl Into<OsString>) -> Self {
        Self { bin: bin.into() }
    }

    /// Start detached container for profile.
    ///
    /// Returns the ID of the new container.
    ///
    /// # Errors
    ///
    /// - Return [`ContainerError::Syscall`] if docker fails.
    #[instrument(skip(self, docker), level = "debug")]
    pub fn run(&self, docker: &DockerSettings, image: &str, name: Option<&str>) -> Result<String> {
        let args = run_args(docker, image, name)?;
        info!(
            "running: {} {}",
            self.bin.to_string_lossy(),
            args.iter()
                .map(|arg| arg.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let id = syscall_non_interactive(&self.bin, args)?;
        info!("container started successfully: {id}");

        Ok(id)
    }

    /// List containers started by envcraft.
    ///
    /// # Errors
    ///
    /// - Return [`ContainerError::Syscall`] if docker fails.
    pub fn list(&self) -> Result<String> {
        syscall_non_interactive(
            &self.bin,
            [
                "ps",
                "-a",
                "--filter",
                &format!("label={MANAGED_LABEL}"),
                "--format",
                "table {{.Names}}\t{{.Image}}\t{{.Status}}\t{{.Ports}}",
            ],
        )
    }

    /// Stop and remove container, optionally removing its labeled volumes.
    ///
    /// Failing to stop the container is not an error, since it may already be
    /// stopped. Failing to remove a single volume is reported and skipped.
    ///
    /// # Errors
    ///
    /// - Return [`ContainerError::Syscall`] if container cannot be removed,
    ///   or its volumes cannot be listed.
    #[instrument(skip(self), level = "debug")]
    pub fn delete(&self, name: &str, delete_volumes: bool) -> Result<()> {
        if let Err(error) = syscall_non_interactive(&self.bin, ["stop", name]) {
            debug!("stop {name:?}: {error}");
        }

        syscall_non_interactive(&self.bin, ["rm", name])?;
        info!("container {name:?} deleted successfully");

        if !delete_volumes {
            return Ok(());
        }

        let volumes = syscall_non_interactive(
            &self.bin,
            [
                "volume",
                "ls",
                "--filter",
                &format!("label={CONTAINER_LABEL_KEY}={name}"),
                "-q",
            ],
        )?;

        for volume in volumes.lines().filter(|line| !line.trim().is_empty()) {
            match syscall_non_interactive(&self.bin, ["volume", "rm", volume]) {
                Ok(_) => info!("volume {volume:?} deleted"),
                Err(error) => warn!("failed to delete volume {volume:?}: {error}"),
            }
        }

        Ok(())
    }

    /// Open interactive shell inside running container.
    ///
    /// # Errors
    ///
    /// - Return [`ContainerError::Syscall`] if shell cannot be opened, e.g.,
    ///   because the container is not running.
    pub fn login(&self, name: &str, shell: &str) -> Result<()> {
        syscall_interactive(&self.bin, ["exec", "-it", name, shell])
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

fn syscall_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<()> {
    let status = Command::new(cmd.as_ref()).args(args).spawn()?.wait()?;
    if !status.success() {
        return Err(ContainerError::Syscall(std::io::Error::other(format!(
            "command {:?} failed",
            cmd.as_ref()
        ))));
    }

    Ok(())
}

fn syscall_non_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<String> {
    let output = Command::new(cmd.as_ref()).args(args).output()?;
    let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
    let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();

    if !output.status.success() {
        return Err(ContainerError::Syscall(std::io::Error::other(format!(
            "command {:?} failed:\n{}",
            cmd.as_ref(),
            stderr.trim_end()
        ))));
    }

    // INVARIANT: Chomp trailing newlines.
    Ok(stdout.trim_end_matches(['\r', '\n']).to_string())
}

/// Container management error types.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// Volume source refers to unset variable.
    #[error(transparent)]
    ShellExpansion(#[from] path::ExpandError),

    /// External docker process failed.
    #[error(transparent)]
    Syscall(#[from] std::io::Error),
}

/// Friendly result alias :3
type Result<T, E = ContainerError> = std::result::Result<T, E>;
