// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Built-in tool catalog.
//!
//! The catalog is the default recipe table that envcraft ships with. It is
//! generated, not stored, because nearly every tool needs some platform
//! parameter baked into its commands: the package manager of the distro
//! family, the download name of the target architecture, or a version pin.
//!
//! When a profile is set, the `dotfiles` tool links that profile's dotfiles
//! inside the container by running [`DEFAULT_DOTSYNC_COMMAND`] followed by
//! `dotsync install`. The command must exist in the copied dotfiles
//! directory, so override it with [`DevEnvironment::with_dotsync_command`]
//! when dotsync is provided some other way, e.g., an envcraft binary built
//! for the target architecture under `~/.dotfiles/bin/envcraft`.

use crate::{
    platform::{Arch, Distro, DistroParams, Versions},
    recipe::{RecipeTable, Tool, INIT_TOOL},
    render::template::Parameters,
};

/// Default user created inside generated environments.
pub const DEFAULT_USERNAME: &str = "blue";

/// Default command that provides `dotsync` inside generated environments.
pub const DEFAULT_DOTSYNC_COMMAND: &str = "uvx python3.11 ~/.dotfiles/envcraft.py";

/// Target environment description.
///
/// Holds every knob that influences the built-in catalog and the Dockerfile
/// header: target platform, user name, version pins, and so on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevEnvironment {
    distro: Distro,
    arch: Arch,
    username: String,
    profile: Option<String>,
    dotsync_command: String,
    versions: Versions,
    distro_params: DistroParams,
}

impl DevEnvironment {
    /// Construct new environment description for target platform.
    pub fn new(distro: Distro, arch: Arch) -> Self {
        Self {
            distro,
            arch,
            username: DEFAULT_USERNAME.into(),
            profile: None,
            dotsync_command: DEFAULT_DOTSYNC_COMMAND.into(),
            versions: Versions::default(),
            distro_params: distro.params(),
        }
    }

    /// Set user to create inside generated environment.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Set profile that dotfiles should be installed from.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Set command that runs `dotsync install` inside generated environment.
    pub fn with_dotsync_command(mut self, command: impl Into<String>) -> Self {
        self.dotsync_command = command.into();
        self
    }

    /// Replace version pins.
    pub fn with_versions(mut self, versions: Versions) -> Self {
        self.versions = versions;
        self
    }

    /// Replace base image of distro family.
    pub fn with_base_image(mut self, image: impl Into<String>) -> Self {
        self.distro_params.base_image = image.into();
        self
    }

    pub fn distro(&self) -> Distro {
        self.distro
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    pub fn dotsync_command(&self) -> &str {
        self.dotsync_command.as_str()
    }

    pub fn versions(&self) -> &Versions {
        &self.versions
    }

    pub fn distro_params(&self) -> &DistroParams {
        &self.distro_params
    }

    /// Parameters available to `<$>` placeholders of recipe files.
    ///
    /// Covers target platform names, architecture download names, version
    /// pins, and single-command package manager invocations.
    pub fn parameters(&self) -> Parameters {
        let arch = self.arch.params();
        let distro = &self.distro_params;
        let versions = &self.versions;

        [
            ("distro", self.distro.to_string()),
            ("arch", self.arch.to_string()),
            ("username", self.username.clone()),
            ("base_image", distro.base_image.clone()),
            ("go_arch", arch.go_arch.into()),
            ("kubectl_arch", arch.kubectl_arch.into()),
            ("eza_target", arch.eza_target.into()),
            ("nvim_arch", arch.nvim_arch.into()),
            ("go_version", versions.go.clone()),
            ("uv_version", versions.uv.clone()),
            ("pnpm_version", versions.pnpm.clone()),
            ("kubectl_version", versions.kubectl.clone()),
            ("nvm_version", versions.nvm.clone()),
            ("eza_version", versions.eza.clone()),
            ("neovim_version", versions.neovim.clone()),
            ("update_cmd", distro.update_cmd.clone()),
            ("base_packages", distro.base_packages.clone()),
            ("curl_install", distro.curl_install.clone()),
            ("tar_install", distro.tar_install.clone()),
            ("ssh_setup", distro.ssh_setup.clone()),
            ("optional_packages", distro.optional_packages.clone()),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
    }

    /// Generate built-in recipe table for this environment.
    pub fn recipes(&self) -> RecipeTable {
        let arch = self.arch.params();
        let distro = &self.distro_params;
        let v = &self.versions;

        let eza_url = format!(
            "https://github.com/eza-community/eza/releases/download/{}/eza_{}.tar.gz",
            v.eza, arch.eza_target
        );
        let kubectl_url = format!(
            "https://dl.k8s.io/release/{}/bin/linux/{}/kubectl",
            v.kubectl, arch.kubectl_arch
        );
        let nvim_tarball = format!("nvim-linux-{}.tar.gz", arch.nvim_arch);
        let go_tarball = format!("{}.linux-{}.tar.gz", v.go, arch.go_arch);

        RecipeTable::new()
            .with(INIT_TOOL, Tool::new().setup(&distro.base_packages))
            .with(
                "python",
                Tool::new().env("PATH", "$HOME/.local/bin:$PATH").setup(format!(
                    "curl -LsSf https://astral.sh/uv/{}/install.sh | sh && uv python install 3.11 3.13",
                    v.uv
                )),
            )
            .with("dotfiles", self.dotfiles_tool())
            .with(
                "starship",
                Tool::new()
                    .prepare(&distro.curl_install)
                    .setup("curl -sS https://starship.rs/install.sh | sh -s -- -y && mkdir -p $HOME/.config")
                    .validation("type -P starship >/dev/null 2>&1"),
            )
            .with(
                "node",
                Tool::new().prepare(&distro.curl_install).setup(format!(
                    "curl -o- https://raw.githubusercontent.com/nvm-sh/nvm/{}/install.sh | bash && \\
                    export NVM_DIR=$HOME/.nvm && \\
                    bash -c 'source $NVM_DIR/nvm.sh && nvm install 22'",
                    v.nvm
                )),
            )
            .with(
                "rust",
                Tool::new()
                    .setup("curl https://sh.rustup.rs -sSf | bash -s -- -y --no-modify-path")
                    .env("PATH", "$PATH:$HOME/.cargo/bin")
                    .validation("type -P rustc >/dev/null 2>&1")
                    .validation("type -P cargo >/dev/null 2>&1"),
            )
            .with(
                "tools",
                Tool::new()
                    .prepare(&distro.tar_install)
                    .setup_all(distro.tool_setup.iter())
                    .setup(format!(
                        "mkdir -p ~/.local/bin && curl -L '{eza_url}' | tar -xz -C /tmp && mv /tmp/eza ~/.local/bin/ && \\
                        uv tool install --python 3.11 ipython && \\
                        curl -LO '{kubectl_url}' && \\
                        sudo install -o root -g root -m 0755 kubectl /usr/local/bin/kubectl"
                    )),
            )
            .with(
                "ssh",
                Tool::new().prepare(&distro.ssh_setup).setup(
                    "sudo sed -i 's/^#*PermitRootLogin.*/PermitRootLogin yes/' /etc/ssh/sshd_config && \\
                    sudo sed -i 's/^#*PasswordAuthentication.*/PasswordAuthentication yes/' /etc/ssh/sshd_config && \\
                    sudo sed -i 's/^#*UsePAM.*/UsePAM yes/' /etc/ssh/sshd_config && \\
                    sudo ssh-keygen -A",
                ),
            )
            .with("optional", Tool::new().setup(&distro.optional_packages))
            .with(
                "neovim",
                Tool::new().prepare(&distro.curl_install).setup(format!(
                    "curl -LO https://github.com/neovim/neovim/releases/download/v{version}/{nvim_tarball} && \\
                        sudo rm -rf /opt/nvim && sudo tar -C /opt -xzf {nvim_tarball} && \\
                        sudo ln -sf /opt/nvim-linux-{nvim_arch}/bin/nvim /usr/local/bin/nvim && \\
                        rm {nvim_tarball}",
                    version = v.neovim,
                    nvim_arch = arch.nvim_arch,
                )),
            )
            .with(
                "go",
                Tool::new()
                    .prepare(&distro.curl_install)
                    .setup(format!(
                        "curl -LO https://go.dev/dl/{go_tarball} && \\
                        sudo rm -rf /usr/local/go && sudo tar -C /usr/local -xzf {go_tarball} && \\
                        rm {go_tarball} && \\
                        echo 'export PATH=$PATH:/usr/local/go/bin' >> $HOME/.bashrc && \\
                        source $HOME/.bashrc"
                    ))
                    .env("PATH", "$PATH:/usr/local/go/bin")
                    .validation("type -P go >/dev/null 2>&1"),
            )
            .with(
                "pnpm",
                Tool::new().setup(format!(
                    "curl -fsSL https://get.pnpm.io/install.sh | env PNPM_VERSION={} sh -",
                    v.pnpm
                )),
            )
            .with("docker", Tool::new().setup(&distro.docker_install))
            .with("cleanup", Tool::new().setup_all(distro.cleanup.iter()))
    }

    fn dotfiles_tool(&self) -> Tool {
        let tool = Tool::new()
            .prepare("mkdir -p .dotfiles")
            .copy(".", ".dotfiles/");

        match &self.profile {
            Some(profile) => tool.setup("ls ~/.dotfiles/").setup(format!(
                "{} dotsync install --source-dir=~/.dotfiles/ \
                 --profile-name={profile} --profile=~/.dotfiles/profiles.json",
                self.dotsync_command
            )),
            None => tool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn catalog_order() {
        let recipes = DevEnvironment::new(Distro::Rpm, Arch::X86_64).recipes();
        let expect = vec![
            "init", "python", "dotfiles", "starship", "node", "rust", "tools", "ssh", "optional",
            "neovim", "go", "pnpm", "docker", "cleanup",
        ];
        assert_eq!(recipes.names().collect::<Vec<_>>(), expect);
    }

    #[test]
    fn catalog_substitutes_arch_and_pins() {
        let recipes = DevEnvironment::new(Distro::Deb, Arch::Aarch64).recipes();

        let go = recipes.get("go").unwrap();
        assert_eq!(go.prepare, vec!["sudo apt install -y curl".to_string()]);
        assert!(go.setup[0].starts_with("curl -LO https://go.dev/dl/go1.23.9.linux-arm64.tar.gz && \\\n"));
        assert_eq!(go.env[0]["PATH"], "$PATH:/usr/local/go/bin");

        let tools = recipes.get("tools").unwrap();
        assert_eq!(tools.setup.len(), 2);
        assert!(tools.setup[1].contains("eza_aarch64-unknown-linux-gnu.tar.gz"));
        assert!(tools.setup[1].contains("/v1.33.1/bin/linux/arm64/kubectl"));

        let neovim = recipes.get("neovim").unwrap();
        assert!(neovim.setup[0].contains("/v0.11.0/nvim-linux-arm64.tar.gz"));
    }

    #[test]
    fn catalog_follows_distro_family() {
        let deb = DevEnvironment::new(Distro::Deb, Arch::X86_64).recipes();
        let rpm = DevEnvironment::new(Distro::Rpm, Arch::X86_64).recipes();

        assert_eq!(deb.get("cleanup").unwrap().setup.len(), 2);
        assert_eq!(rpm.get("cleanup").unwrap().setup.len(), 1);
        assert_eq!(
            rpm.get("init").unwrap().setup,
            vec!["sudo dnf install -y vim curl git make gcc --skip-broken".to_string()]
        );
    }

    #[test]
    fn catalog_validates_installed_binaries() {
        let recipes = DevEnvironment::new(Distro::Rpm, Arch::X86_64).recipes();

        assert_eq!(
            recipes.get("starship").unwrap().validation,
            vec!["type -P starship >/dev/null 2>&1".to_string()]
        );
        assert_eq!(
            recipes.get("rust").unwrap().validation,
            vec![
                "type -P rustc >/dev/null 2>&1".to_string(),
                "type -P cargo >/dev/null 2>&1".to_string(),
            ]
        );
        assert_eq!(
            recipes.get("go").unwrap().validation,
            vec!["type -P go >/dev/null 2>&1".to_string()]
        );
        assert!(recipes.get("python").unwrap().validation.is_empty());
    }

    #[test]
    fn dotfiles_setup_only_with_profile() {
        let plain = DevEnvironment::new(Distro::Rpm, Arch::X86_64).recipes();
        let dotfiles = plain.get("dotfiles").unwrap();
        assert!(dotfiles.setup.is_empty());
        assert_eq!(dotfiles.copy[0].destination, ".dotfiles/");

        let profiled = DevEnvironment::new(Distro::Rpm, Arch::X86_64)
            .with_profile("dev-rpm-full")
            .recipes();
        let dotfiles = profiled.get("dotfiles").unwrap();
        assert_eq!(dotfiles.setup.len(), 2);
        assert_eq!(
            dotfiles.setup[1],
            "uvx python3.11 ~/.dotfiles/envcraft.py dotsync install --source-dir=~/.dotfiles/ \
             --profile-name=dev-rpm-full --profile=~/.dotfiles/profiles.json"
        );
    }

    #[test]
    fn dotsync_command_override() {
        let recipes = DevEnvironment::new(Distro::Deb, Arch::Aarch64)
            .with_profile("bare")
            .with_dotsync_command("~/.dotfiles/bin/envcraft")
            .recipes();
        let dotfiles = recipes.get("dotfiles").unwrap();
        assert!(dotfiles.setup[1].starts_with("~/.dotfiles/bin/envcraft dotsync install "));
        assert!(!dotfiles.setup[1].contains("uvx"));
    }

    #[test]
    fn pin_overrides_reach_commands() {
        let versions = Versions {
            pnpm: "10.0.0".into(),
            ..Versions::default()
        };
        let recipes = DevEnvironment::new(Distro::Rpm, Arch::X86_64)
            .with_versions(versions)
            .recipes();
        assert!(recipes.get("pnpm").unwrap().setup[0].contains("PNPM_VERSION=10.0.0"));
    }

    #[test]
    fn parameters_cover_platform() {
        let params = DevEnvironment::new(Distro::Deb, Arch::Aarch64)
            .with_username("red")
            .with_base_image("ubuntu:24.04")
            .parameters();

        assert_eq!(params["distro"], "deb");
        assert_eq!(params["arch"], "aarch64");
        assert_eq!(params["username"], "red");
        assert_eq!(params["base_image"], "ubuntu:24.04");
        assert_eq!(params["go_arch"], "arm64");
        assert_eq!(params["go_version"], "go1.23.9");
        assert_eq!(params["curl_install"], "sudo apt install -y curl");
    }
}
