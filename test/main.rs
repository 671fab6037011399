// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

mod integration;

use anyhow::Result;
use indoc::indoc;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub(crate) const PROFILES: &str = indoc! {r#"
    {
      "dev-rpm-full": {
        "name": "full",
        "docker": {
          "base_image": "rockylinux:9",
          "container_user": "red",
          "exposed_ports": [2222],
          "volumes": [{ "source": "~/work", "target": "/home/red/work" }]
        },
        "dev_env": { "tools": ["python", "dotfiles", "rust"] },
        "dotfiles": [".bashrc", ".config/starship.toml"]
      },
      "bare": {}
    }
"#};

/// Directory layout of a dotfiles checkout with a profile file.
pub(crate) struct DotfilesFixture {
    root: PathBuf,
}

impl DotfilesFixture {
    pub(crate) fn new(root: impl AsRef<Path>) -> Result<Self> {
        let fixture = Self {
            root: root.as_ref().into(),
        };
        fs::create_dir_all(&fixture.root)?;
        fixture.write("profiles.json", PROFILES)?;

        Ok(fixture)
    }

    pub(crate) fn write(&self, path: impl AsRef<Path>, contents: impl AsRef<str>) -> Result<()> {
        let path = self.root.join(path);

        // INVARIANT: Parent directories must exist before writing.
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents.as_ref())?;

        Ok(())
    }

    pub(crate) fn path(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }
}
