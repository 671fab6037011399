// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Target platform parameters.
//!
//! Every generated artifact targets exactly one CPU architecture and one OS
//! package family. This module maps those two choices onto the concrete
//! strings that end up inside install commands: download names for release
//! tarballs, package-manager invocations, base images, and so on.
//!
//! # Version Pins
//!
//! Tools downloaded straight from upstream releases are pinned through
//! [`Versions`]. Pins can be overridden by a recipe file, but they always have
//! a sane default so a bare `envcraft generate` produces a working artifact.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};
use tracing::warn;

/// Target CPU architecture.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    #[default]
    X86_64,
    Aarch64,
}

impl Arch {
    /// Determine architecture of current host.
    ///
    /// Unsupported architectures fall back to [`Arch::X86_64`], since every
    /// recipe needs _some_ set of download names to work with.
    pub fn detect() -> Self {
        Self::from_machine(std::env::consts::ARCH)
    }

    /// Map a machine name to an architecture, falling back to x86_64.
    pub fn from_machine(machine: &str) -> Self {
        machine.parse().unwrap_or_else(|_| {
            warn!("unsupported architecture {machine:?}, falling back to x86_64");
            Self::X86_64
        })
    }

    /// Download names used by release tarballs for this architecture.
    pub fn params(self) -> ArchParams {
        match self {
            Self::X86_64 => ArchParams {
                go_arch: "amd64",
                kubectl_arch: "amd64",
                eza_target: "x86_64-unknown-linux-gnu",
                nvim_arch: "x86_64",
            },
            Self::Aarch64 => ArchParams {
                go_arch: "arm64",
                kubectl_arch: "arm64",
                eza_target: "aarch64-unknown-linux-gnu",
                nvim_arch: "arm64",
            },
        }
    }
}

impl FromStr for Arch {
    type Err = PlatformError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        match data.to_lowercase().as_str() {
            "x86_64" | "amd64" => Ok(Self::X86_64),
            "aarch64" | "arm64" => Ok(Self::Aarch64),
            _ => Err(PlatformError::UnknownArch(data.into())),
        }
    }
}

impl Display for Arch {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::X86_64 => fmt.write_str("x86_64"),
            Self::Aarch64 => fmt.write_str("aarch64"),
        }
    }
}

/// Architecture specific download names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchParams {
    pub go_arch: &'static str,
    pub kubectl_arch: &'static str,
    pub eza_target: &'static str,
    pub nvim_arch: &'static str,
}

/// OS package family.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Distro {
    /// Debian based distributions using apt.
    Deb,

    /// RHEL based distributions using dnf.
    #[default]
    Rpm,
}

impl Distro {
    /// Package manager commands and base image for this family.
    pub fn params(self) -> DistroParams {
        match self {
            Self::Deb => DistroParams {
                update_cmd: "sudo apt update && sudo apt upgrade -y".into(),
                base_packages: "sudo apt install -y vim curl git build-essential make".into(),
                base_image: "debian:bookworm".into(),
                curl_install: "sudo apt install -y curl".into(),
                tar_install: "sudo apt install -y tar".into(),
                tool_setup: vec![
                    "sudo apt install -y ranger fzf ripgrep wget ncdu unzip tokei tmux".into(),
                ],
                ssh_setup: "sudo apt install -y openssh-server".into(),
                optional_packages: "sudo apt install -y procps iproute2".into(),
                docker_install: DEB_DOCKER_INSTALL.into(),
                cleanup: vec![
                    "sudo apt-get clean".into(),
                    "sudo rm -rf /var/lib/apt/lists/*".into(),
                ],
                bootstrap_update: "apt update && apt upgrade -y".into(),
                bootstrap_sudo: "apt install -y sudo".into(),
            },
            Self::Rpm => DistroParams {
                update_cmd: "sudo dnf update -y".into(),
                base_packages: "sudo dnf install -y vim curl git make gcc --skip-broken".into(),
                base_image: "almalinux:9".into(),
                curl_install: "sudo dnf install -y curl --skip-broken".into(),
                tar_install: "sudo dnf install -y tar".into(),
                tool_setup: vec![
                    "sudo dnf install -y epel-release && sudo dnf update -y && \
                     sudo dnf install -y ranger fzf ripgrep ncdu unzip tokei tmux"
                        .into(),
                ],
                ssh_setup: "sudo dnf install -y openssh-server".into(),
                optional_packages: "sudo dnf install -y procps iproute".into(),
                docker_install: RPM_DOCKER_INSTALL.into(),
                cleanup: vec![RPM_CLEANUP.into()],
                bootstrap_update: "dnf update -y".into(),
                bootstrap_sudo: "dnf install -y sudo".into(),
            },
        }
    }
}

impl FromStr for Distro {
    type Err = PlatformError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        match data.to_lowercase().as_str() {
            "deb" => Ok(Self::Deb),
            "rpm" => Ok(Self::Rpm),
            _ => Err(PlatformError::UnknownDistro(data.into())),
        }
    }
}

impl Display for Distro {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Deb => fmt.write_str("deb"),
            Self::Rpm => fmt.write_str("rpm"),
        }
    }
}

/// Package manager commands for one distro family.
///
/// The `bootstrap_*` commands run as root before `sudo` exists, so they are
/// only ever used by the container header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistroParams {
    pub update_cmd: String,
    pub base_packages: String,
    pub base_image: String,
    pub curl_install: String,
    pub tar_install: String,
    pub tool_setup: Vec<String>,
    pub ssh_setup: String,
    pub optional_packages: String,
    pub docker_install: String,
    pub cleanup: Vec<String>,
    pub bootstrap_update: String,
    pub bootstrap_sudo: String,
}

const DEB_DOCKER_INSTALL: &str = r#"sudo install -m 0755 -d /etc/apt/keyrings && \
sudo curl -fsSL https://download.docker.com/linux/debian/gpg -o /etc/apt/keyrings/docker.asc && \
sudo chmod a+r /etc/apt/keyrings/docker.asc && \
echo \
  "deb [arch=$(dpkg --print-architecture) signed-by=/etc/apt/keyrings/docker.asc] https://download.docker.com/linux/debian \
  $(. /etc/os-release && echo "$VERSION_CODENAME") stable" | \
  sudo tee /etc/apt/sources.list.d/docker.list > /dev/null && \
sudo apt-get update -y && \
sudo apt-get install docker-ce-cli -y"#;

const RPM_DOCKER_INSTALL: &str = r#"sudo dnf -y install dnf-plugins-core && \
sudo dnf config-manager --add-repo https://download.docker.com/linux/rhel/docker-ce.repo && \
sudo dnf install -y docker-ce-cli"#;

const RPM_CLEANUP: &str = r#"sudo dnf clean all && \
sudo rm -rf /var/cache/dnf/* && \
sudo rm -rf /usr/share/doc && \
sudo rm -rf /root/.cache"#;

/// Version pins for tools installed from upstream releases.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Versions {
    pub go: String,
    pub uv: String,
    pub pnpm: String,
    pub kubectl: String,
    pub nvm: String,
    pub eza: String,
    pub neovim: String,
}

impl Default for Versions {
    fn default() -> Self {
        Self {
            go: "go1.23.9".into(),
            uv: "0.7.9".into(),
            pnpm: "9.15.9".into(),
            kubectl: "v1.33.1".into(),
            nvm: "v0.39.2".into(),
            eza: "v0.21.1".into(),
            neovim: "0.11.0".into(),
        }
    }
}

/// Platform error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum PlatformError {
    /// Architecture name is not supported.
    #[error("unsupported architecture {0:?}, expected one of: x86_64, aarch64")]
    UnknownArch(String),

    /// Distro family name is not supported.
    #[error("unsupported distro {0:?}, expected one of: rpm, deb")]
    UnknownDistro(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    #[test_case("x86_64", Arch::X86_64; "canonical x86")]
    #[test_case("AMD64", Arch::X86_64; "amd64 alias")]
    #[test_case("aarch64", Arch::Aarch64; "canonical arm")]
    #[test_case("arm64", Arch::Aarch64; "arm64 alias")]
    #[test]
    fn parse_arch(input: &str, expect: Arch) {
        pretty_assertions::assert_eq!(input.parse::<Arch>().unwrap(), expect);
    }

    #[test]
    fn unknown_machine_falls_back_to_x86_64() {
        assert!("riscv64".parse::<Arch>().is_err());
        assert_eq!(Arch::from_machine("riscv64"), Arch::X86_64);
    }

    #[test]
    fn arch_params_follow_release_naming() {
        let params = Arch::Aarch64.params();
        assert_eq!(params.go_arch, "arm64");
        assert_eq!(params.eza_target, "aarch64-unknown-linux-gnu");

        let params = Arch::X86_64.params();
        assert_eq!(params.kubectl_arch, "amd64");
        assert_eq!(params.nvim_arch, "x86_64");
    }

    #[test_case("deb", Distro::Deb; "debian")]
    #[test_case("RPM", Distro::Rpm; "rhel")]
    #[test]
    fn parse_distro(input: &str, expect: Distro) {
        pretty_assertions::assert_eq!(input.parse::<Distro>().unwrap(), expect);
        pretty_assertions::assert_eq!(expect.to_string(), input.to_lowercase());
    }

    #[test]
    fn distro_params_select_package_manager() {
        let deb = Distro::Deb.params();
        assert_eq!(deb.base_image, "debian:bookworm");
        assert_eq!(deb.cleanup.len(), 2);
        assert!(deb.docker_install.contains("apt-get install docker-ce-cli"));

        let rpm = Distro::Rpm.params();
        assert_eq!(rpm.base_image, "almalinux:9");
        assert_eq!(rpm.cleanup.len(), 1);
        assert!(rpm.tool_setup[0].starts_with("sudo dnf install -y epel-release"));
        assert!(rpm.tool_setup[0].contains("&& sudo dnf install -y ranger"));
    }

    #[test]
    fn partial_versions_keep_default_pins() -> anyhow::Result<()> {
        let versions: Versions = toml::de::from_str(r#"go = "go1.24.0""#)?;
        assert_eq!(versions.go, "go1.24.0");
        assert_eq!(versions.uv, Versions::default().uv);

        Ok(())
    }
}
