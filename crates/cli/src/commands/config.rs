// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use crate::config::{config_path, state_dir, Config};
use crate::error::{Error, Result};

/// Prints the effective configuration, or writes the defaults with `--init`.
pub fn run(init: bool, force: bool) -> Result<()> {
    let dir = state_dir();
    if init {
        let path = init_config(&dir, force)?;
        println!("wrote {}", path.display());
    } else {
        print!("{}", render(&dir)?);
    }
    Ok(())
}

/// Writes a default `config.toml` into `dir`.
pub fn init_config(dir: &Path, force: bool) -> Result<std::path::PathBuf> {
    let path = config_path(dir);
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "{} already exists\n  hint: use --force to overwrite it",
            path.display()
        )));
    }
    Config::default().save(dir)
}

/// Effective configuration of `dir` as TOML, headed by the state directory.
pub fn render(dir: &Path) -> Result<String> {
    let config = Config::load(dir)?;
    Ok(format!(
        "# state directory: {}\n{}",
        dir.display(),
        config.to_toml()?
    ))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
