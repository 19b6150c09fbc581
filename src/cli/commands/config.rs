//! Config Command
//!
//! Manage SubLang configuration.
//!
//! Usage:
//!   sublang config show [-f json|yaml]
//!   sublang config path
//!   sublang config edit [-g]
//!   sublang config init [-g] [--force]

use crate::cli::ui::Output;
use crate::config::{ConfigFormat, ConfigLoader};
use crate::types::{Result, SublangError};

/// Show the merged effective configuration
pub fn show(format: &str) -> Result<()> {
    let format: ConfigFormat = format.parse().map_err(SublangError::Config)?;
    ConfigLoader::show_config(format)
}

pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

/// Edit configuration file with $EDITOR
pub fn edit(global: bool) -> Result<()> {
    ConfigLoader::edit_config(global)
}

pub fn init(global: bool, force: bool) -> Result<()> {
    let (scope, path) = if global {
        ("global", ConfigLoader::init_global(force)?)
    } else {
        ("project", ConfigLoader::init_project(force)?)
    };

    let output = Output::new();
    output.success(&format!("Initialized {} configuration", scope));
    println!("  Config: {}", path.display());
    if !force {
        output.info("Existing files are kept; pass --force to overwrite");
    }
    Ok(())
}
