// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::DotfilesFixture;

use envcraft::{
    container::run_args,
    dotsync::DotfilesManager,
    generator::profile_output_name,
    path::{devenv_dir, profile_dockerfile_path},
    Arch, Distro, Generator, ProfileFormat, ProfileSet,
};

use anyhow::Result;
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::fs;

fn load(fixture: &DotfilesFixture) -> Result<ProfileSet> {
    let path = fixture.path("profiles.json");
    let data = fs::read_to_string(&path)?;

    Ok(ProfileSet::parse(&data, ProfileFormat::from_path(&path))?)
}

#[sealed_test(env = [("HOME", "/tmp/envcraft-home")])]
fn build_profile_dockerfile_into_devenv_dir() -> Result<()> {
    let fixture = DotfilesFixture::new("dots")?;
    let profiles = load(&fixture)?;
    let profile = profiles.get("dev-rpm-full")?;

    let generator =
        Generator::from_profile(profile, Some("dev-rpm-full"), Distro::Rpm, Arch::Aarch64);
    let path = profile_dockerfile_path(
        devenv_dir()?,
        profile_output_name(profile, Some("dev-rpm-full")),
        Distro::Rpm,
        Arch::Aarch64,
    );
    generator.write_dockerfile(&path)?;

    assert_eq!(
        path,
        std::path::PathBuf::from("/tmp/envcraft-home/.devenv/Dockerfile.full.rpm.aarch64")
    );

    let dockerfile = fs::read_to_string(&path)?;
    let stages = dockerfile
        .lines()
        .filter_map(|line| line.strip_prefix("# stage: "))
        .collect::<Vec<_>>();
    assert_eq!(stages, vec!["init", "python", "dotfiles", "rust"]);
    assert!(dockerfile.contains("FROM rockylinux:9\n"));
    assert!(dockerfile.contains("ARG USERNAME=red\n"));
    assert!(dockerfile.contains("COPY --chown=$USERNAME:$USERNAME . .dotfiles/\n"));
    assert!(dockerfile.contains("--profile-name=dev-rpm-full"));
    assert!(!dockerfile.contains("<$>"));

    Ok(())
}

#[sealed_test]
fn generate_both_artifacts_from_recipe_file() -> Result<()> {
    let fixture = DotfilesFixture::new("dots")?;
    fixture.write(
        "recipes.toml",
        r#"
            [tool.zoxide]
            prepare = ["<$>curl_install"]
            setup = ["curl -sSfL https://zoxide.sh/install.sh | sh"]
            validation = ["command -v zoxide >/dev/null 2>&1"]
        "#,
    )?;

    let recipe_file = fs::read_to_string(fixture.path("recipes.toml"))?.parse()?;
    let generator = Generator::new(envcraft::DevEnvironment::new(Distro::Deb, Arch::X86_64))
        .with_selection(["node", "zoxide"])
        .with_recipe_file(recipe_file)?;

    let dockerfile = generator.write_dockerfile("Dockerfile.deb.x86_64")?;
    let script = generator.write_setup_sh("setup.deb.x86_64.sh")?;

    assert!(dockerfile.contains("# stage: zoxide\n"));
    assert_eq!(dockerfile.matches("RUN sudo apt install -y curl\n").count(), 1);
    assert!(script.starts_with("#!/bin/bash\n"));
    assert!(script.contains("TOOLS=(init node zoxide)\n"));
    assert!(script.contains("function zoxide {\n"));
    assert!(script.contains("    command -v zoxide >/dev/null 2>&1\n"));
    assert_eq!(fs::read_to_string("setup.deb.x86_64.sh")?, script);

    Ok(())
}

#[sealed_test]
fn sync_profile_dotfiles_into_home() -> Result<()> {
    let fixture = DotfilesFixture::new("dots")?;
    fixture.write(".bashrc", "export EDITOR=nvim")?;
    fixture.write(".config/starship.toml", "add_newline = false")?;
    fs::create_dir_all("home")?;
    fs::write("home/.bashrc", "old")?;

    let profiles = load(&fixture)?;
    let dotfiles = profiles
        .get("dev-rpm-full")?
        .dotfiles
        .clone()
        .unwrap_or_default();

    let manager = DotfilesManager::new(fixture.path(""), "home")?.with_backup_dir("backup");
    let report = manager.install(&dotfiles);

    assert_eq!(report.linked.len(), 2);
    assert_eq!(report.backed_up.len(), 1);
    assert_eq!(fs::read_to_string("home/.bashrc")?, "export EDITOR=nvim");
    assert_eq!(fs::read_to_string("home/.config/starship.toml")?, "add_newline = false");
    assert_eq!(fs::read_to_string("backup/.bashrc")?, "old");

    Ok(())
}

#[sealed_test(env = [("HOME", "/home/red")])]
fn run_container_with_profile_settings() -> Result<()> {
    let fixture = DotfilesFixture::new("dots")?;
    let profiles = load(&fixture)?;
    let docker = profiles
        .get("dev-rpm-full")?
        .docker
        .clone()
        .unwrap_or_default();

    let args = run_args(&docker, "devenv:full", Some("full"))?
        .into_iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect::<Vec<_>>();

    assert!(args.windows(2).any(|pair| pair == ["-p", "2222:2222"]));
    assert!(args
        .windows(2)
        .any(|pair| pair == ["-v", "/home/red/work:/home/red/work:rw"]));
    assert_eq!(args.last().map(String::as_str), Some("devenv:full"));

    Ok(())
}

#[test]
fn missing_profile_reports_available_names() -> Result<()> {
    let profiles: ProfileSet = crate::PROFILES.parse()?;
    let error = profiles.get("nope").unwrap_err().to_string();
    assert!(error.contains("dev-rpm-full, bare"), "{error}");

    Ok(())
}
