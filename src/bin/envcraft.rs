// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use envcraft::{
    container::DockerCli,
    dotsync::DotfilesManager,
    generator::profile_output_name,
    path::{devenv_dir, dockerfile_name, expand, home_dir, profile_dockerfile_path, setup_sh_name},
    recipe::catalog::DEFAULT_DOTSYNC_COMMAND,
    Arch, DevEnvironment, Distro, Generator, Profile, ProfileFormat, ProfileSet, RecipeFile,
};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::{fs, path::PathBuf, process::exit};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "envcraft [options] <envcraft-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        match self.command {
            Command::Generate(opts) => run_generate(opts),
            Command::Build(opts) => run_build(opts),
            Command::Run(opts) => run_run(opts),
            Command::Dotsync(cmd) => match cmd {
                DotsyncCommand::Install(opts) => run_dotsync_install(opts),
            },
            Command::Container(cmd) => match cmd {
                ContainerCommand::List => run_container_list(),
                ContainerCommand::Delete(opts) => run_container_delete(opts),
                ContainerCommand::Login(opts) => run_container_login(opts),
            },
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Generate Dockerfile and/or shell installer from whole tool catalog.
    #[command(override_usage = "envcraft generate [options]")]
    Generate(GenerateOptions),

    /// Generate Dockerfile for development environment profile.
    #[command(override_usage = "envcraft build [options]")]
    Build(BuildOptions),

    /// Run container of development environment profile.
    #[command(override_usage = "envcraft run [options] --image <image>")]
    Run(RunOptions),

    /// Sync dotfiles into home directory.
    #[command(subcommand)]
    Dotsync(DotsyncCommand),

    /// Manage containers started by envcraft.
    #[command(subcommand)]
    Container(ContainerCommand),
}

#[derive(Debug, Clone, Subcommand)]
enum DotsyncCommand {
    /// Link dotfiles of profile into home directory.
    #[command(override_usage = "envcraft dotsync install [options] --profile <path>")]
    Install(DotsyncInstallOptions),
}

#[derive(Debug, Clone, Subcommand)]
enum ContainerCommand {
    /// List containers started by envcraft.
    List,

    /// Stop and delete container.
    #[command(override_usage = "envcraft container delete [options] <name>")]
    Delete(DeleteOptions),

    /// Open shell inside running container.
    #[command(override_usage = "envcraft container login [options] <name>")]
    Login(LoginOptions),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum GenerateMode {
    Docker,
    Shell,
    #[default]
    Both,
}

#[derive(Args, Clone, Debug)]
struct PlatformOptions {
    /// Target architecture, detected from host if not given.
    #[arg(long, value_name = "x86_64|aarch64")]
    pub arch: Option<Arch>,

    /// Target distro family.
    #[arg(long, value_name = "rpm|deb", default_value_t = Distro::Rpm)]
    pub distro: Distro,

    /// Recipe file extending or overriding built-in tool catalog.
    #[arg(long, value_name = "path")]
    pub recipes: Option<String>,
}

impl PlatformOptions {
    fn arch(&self) -> Arch {
        self.arch.unwrap_or_else(Arch::detect)
    }

    fn recipe_file(&self) -> Result<Option<RecipeFile>> {
        let Some(path) = &self.recipes else {
            return Ok(None);
        };

        let path = expand(path)?;
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed to read recipe file {path:?}"))?;
        let recipe_file = data
            .parse()
            .with_context(|| format!("invalid recipe file {path:?}"))?;

        Ok(Some(recipe_file))
    }

    fn apply_recipe_file(&self, generator: Generator) -> Result<Generator> {
        match self.recipe_file()? {
            Some(recipe_file) => Ok(generator.with_recipe_file(recipe_file)?),
            None => Ok(generator),
        }
    }
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct GenerateOptions {
    /// What to generate.
    #[arg(long, value_enum, default_value_t = GenerateMode::Both)]
    pub mode: GenerateMode,

    /// Output Dockerfile path, `Dockerfile.<distro>.<arch>` if not given.
    #[arg(long, value_name = "path")]
    pub dockerfile: Option<PathBuf>,

    /// Output shell installer path, `setup.<distro>.<arch>.sh` if not given.
    #[arg(long, value_name = "path")]
    pub shell: Option<PathBuf>,

    /// User to create inside container.
    #[arg(long, value_name = "name")]
    pub username: Option<String>,

    /// Base image replacing distro family default.
    #[arg(long, value_name = "image")]
    pub base_image: Option<String>,

    #[command(flatten)]
    pub platform: PlatformOptions,
}

#[derive(Args, Clone, Debug)]
struct ProfileOptions {
    /// Path to profile file, JSON or TOML by extension.
    #[arg(long, value_name = "path", default_value = "profiles.json")]
    pub profile: String,

    /// Name of profile to use.
    #[arg(long, value_name = "name", default_value = "dev-rpm-full")]
    pub profile_name: String,
}

impl ProfileOptions {
    fn load(&self) -> Result<Profile> {
        load_profile(&self.profile, &self.profile_name)
    }
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct BuildOptions {
    /// Output Dockerfile path, `~/.devenv/Dockerfile.<profile>.<distro>.<arch>`
    /// if not given.
    #[arg(long, value_name = "path")]
    pub dockerfile: Option<PathBuf>,

    /// Command that runs `dotsync install` inside the container. It must be
    /// available from the copied dotfiles directory, `~/.dotfiles`.
    #[arg(long, value_name = "command", default_value = DEFAULT_DOTSYNC_COMMAND)]
    pub dotsync_command: String,

    #[command(flatten)]
    pub profile: ProfileOptions,

    #[command(flatten)]
    pub platform: PlatformOptions,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct RunOptions {
    /// Docker image to run.
    #[arg(long, required = true, value_name = "image")]
    pub image: String,

    /// Name of new container.
    #[arg(long, value_name = "name")]
    pub name: Option<String>,

    #[command(flatten)]
    pub profile: ProfileOptions,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct DotsyncInstallOptions {
    /// Directory holding dotfiles, current directory if not given.
    #[arg(long, value_name = "path")]
    pub source_dir: Option<String>,

    /// Path to profile file, JSON or TOML by extension.
    #[arg(long, required = true, value_name = "path")]
    pub profile: String,

    /// Name of profile to use.
    #[arg(long, value_name = "name", default_value = "dev-rpm-full")]
    pub profile_name: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct DeleteOptions {
    /// Name of container to delete.
    #[arg(required = true, value_name = "name")]
    pub name: String,

    /// Also delete volumes labeled for container.
    #[arg(long)]
    pub volumes: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct LoginOptions {
    /// Name of container to log into.
    #[arg(required = true, value_name = "name")]
    pub name: String,

    /// Shell to open.
    #[arg(long, value_name = "path", default_value = "/bin/bash")]
    pub shell: String,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_generate(opts: GenerateOptions) -> Result<()> {
    let distro = opts.platform.distro;
    let arch = opts.platform.arch();
    info!("using architecture: {arch}");
    info!("using distribution: {distro}");

    let mut env = DevEnvironment::new(distro, arch);
    if let Some(username) = opts.username {
        env = env.with_username(username);
    }
    if let Some(image) = opts.base_image {
        env = env.with_base_image(image);
    }

    let generator = opts.platform.apply_recipe_file(Generator::new(env))?;
    let dockerfile = opts
        .dockerfile
        .unwrap_or_else(|| dockerfile_name(distro, arch));
    let shell = opts.shell.unwrap_or_else(|| setup_sh_name(distro, arch));

    if opts.mode != GenerateMode::Shell {
        generator.write_dockerfile(&dockerfile)?;
    }

    if opts.mode != GenerateMode::Docker {
        generator.write_setup_sh(&shell)?;
    }

    Ok(())
}

fn run_build(opts: BuildOptions) -> Result<()> {
    let profile = opts.profile.load()?;
    let distro = opts.platform.distro;
    let arch = opts.platform.arch();

    let generator = Generator::from_profile(
        &profile,
        Some(opts.profile.profile_name.as_str()),
        distro,
        arch,
    )
    .with_dotsync_command(opts.dotsync_command);
    let generator = opts.platform.apply_recipe_file(generator)?;

    let dockerfile = match opts.dockerfile {
        Some(path) => path,
        None => profile_dockerfile_path(
            devenv_dir()?,
            profile_output_name(&profile, Some(opts.profile.profile_name.as_str())),
            distro,
            arch,
        ),
    };
    generator.write_dockerfile(dockerfile)?;

    Ok(())
}

fn run_run(opts: RunOptions) -> Result<()> {
    let profile = opts.profile.load()?;
    let docker = profile.docker.as_ref().ok_or_else(|| {
        anyhow!(
            "docker configuration not found in profile {:?}",
            opts.profile.profile_name
        )
    })?;

    let id = DockerCli::new().run(docker, &opts.image, opts.name.as_deref())?;
    info!("container {id} is running");

    Ok(())
}

fn run_dotsync_install(opts: DotsyncInstallOptions) -> Result<()> {
    let profile = load_profile(&opts.profile, &opts.profile_name)?;
    let dotfiles = profile.dotfiles.as_ref().ok_or_else(|| {
        anyhow!(
            "no dotfiles configuration found in profile {:?}",
            opts.profile_name
        )
    })?;

    let source_dir = match &opts.source_dir {
        Some(path) => expand(path)?,
        None => std::env::current_dir()?,
    };

    let manager = DotfilesManager::new(source_dir, home_dir()?)?;
    let report = manager.install(dotfiles);
    info!(
        "linked {} dotfiles, backed up {}, skipped {}",
        report.linked.len(),
        report.backed_up.len(),
        report.skipped.len()
    );

    if !report.failed.is_empty() {
        warn!("failed to link {} dotfiles", report.failed.len());
    }

    Ok(())
}

fn run_container_list() -> Result<()> {
    let listing = DockerCli::new().list()?;
    println!("EnvCraft Containers:\n{listing}");

    Ok(())
}

fn run_container_delete(opts: DeleteOptions) -> Result<()> {
    DockerCli::new()
        .delete(&opts.name, opts.volumes)
        .with_context(|| format!("failed to delete container {:?}", opts.name))?;

    Ok(())
}

fn run_container_login(opts: LoginOptions) -> Result<()> {
    DockerCli::new()
        .login(&opts.name, &opts.shell)
        .with_context(|| {
            format!(
                "failed to login to container {:?}, make sure it is running",
                opts.name
            )
        })?;

    Ok(())
}

fn load_profile(path: &str, name: &str) -> Result<Profile> {
    let path = expand(path)?;
    let data = fs::read_to_string(&path)
        .with_context(|| format!("profile file not found: {path:?}"))?;
    let profiles = ProfileSet::parse(&data, ProfileFormat::from_path(&path))
        .with_context(|| format!("invalid profile file {path:?}"))?;

    Ok(profiles.get(name)?.clone())
}
