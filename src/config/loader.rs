//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (`<config dir>/sublang/config.toml`)
//! 3. Project config (`.sublang/config.toml`)
//! 4. Legacy environment variables (`MODEL`, `TEMPERATURE`, `MAX_TOKENS`)
//! 5. Environment variables (`SUBLANG_*` prefix, `__` separates sections)

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use super::types::Config;
use crate::types::{Result, SublangError};

/// Unprefixed variables kept for compatibility, mapped into `[llm]`
const LEGACY_ENV_KEYS: &[&str] = &["MODEL", "TEMPERATURE", "MAX_TOKENS"];

/// Rendering of `config show`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl std::str::FromStr for ConfigFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "toml" => Ok(ConfigFormat::Text),
            "json" => Ok(ConfigFormat::Json),
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            _ => Err(format!(
                "Unknown format: {}. Valid values: text, json, yaml",
                s
            )),
        }
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → legacy env → prefixed env
    pub fn load() -> Result<Config> {
        let config: Config = Self::figment()
            .extract()
            .map_err(|e| SublangError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Merged figment without extraction, for callers that layer more on top
    pub fn figment() -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // MODEL=gpt-4o -> llm.model
        figment = figment.merge(
            Env::raw()
                .only(LEGACY_ENV_KEYS)
                .map(|key| format!("llm.{}", key.as_str().to_ascii_lowercase()).into()),
        );

        // SUBLANG_LLM__MAX_TOKENS -> llm.max_tokens
        figment.merge(Env::prefixed("SUBLANG_").split("__").lowercase(true))
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| SublangError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (e.g. ~/.config/sublang/)
    pub fn global_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "sublang").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    /// Get project settings directory
    pub fn project_dir() -> PathBuf {
        PathBuf::from(".sublang")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
    }

    /// Render a configuration in the requested format
    pub fn render(config: &Config, format: ConfigFormat) -> Result<String> {
        let rendered = match format {
            ConfigFormat::Text => toml::to_string_pretty(config)?,
            ConfigFormat::Json => serde_json::to_string_pretty(config)?,
            ConfigFormat::Yaml => serde_yaml::to_string(config)?,
        };
        Ok(rendered)
    }

    /// Show current effective configuration
    pub fn show_config(format: ConfigFormat) -> Result<()> {
        let mut config = Self::load()?;
        if config.llm.api_key.is_some() {
            config.llm.api_key = Some("[REDACTED]".to_string());
        }
        println!("{}", Self::render(&config, format)?);
        Ok(())
    }

    /// Edit config file with default editor
    pub fn edit_config(global: bool) -> Result<()> {
        let path = if global {
            Self::global_config_path().ok_or_else(|| {
                SublangError::Config("Cannot determine global config path".to_string())
            })?
        } else {
            Self::project_config_path()
        };

        if !path.exists() {
            println!("Config file does not exist: {}", path.display());
            println!(
                "Run: sublang config init {}",
                if global { "--global" } else { "" }
            );
            return Ok(());
        }

        let editor = env::var("EDITOR").unwrap_or_else(|_| {
            if cfg!(target_os = "macos") {
                "open".to_string()
            } else if cfg!(target_os = "windows") {
                "notepad".to_string()
            } else {
                "vi".to_string()
            }
        });

        let status = Command::new(&editor).arg(&path).status().map_err(|e| {
            SublangError::Config(format!("Failed to launch editor {}: {}", editor, e))
        })?;

        if !status.success() {
            return Err(SublangError::Config("Editor exited with error".to_string()));
        }

        println!("Config saved: {}", path.display());
        Ok(())
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize global configuration
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            SublangError::Config("Cannot determine global config directory".to_string())
        })?;
        let config_path = global_dir.join("config.toml");
        Self::write_template(&global_dir, &config_path, Self::default_global_config(), force)?;
        Ok(config_path)
    }

    /// Initialize project configuration
    pub fn init_project(force: bool) -> Result<PathBuf> {
        let project_dir = Self::project_dir();
        let config_path = Self::project_config_path();
        Self::write_template(&project_dir, &config_path, Self::default_project_config(), force)?;
        Ok(config_path)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn write_template(dir: &Path, path: &Path, content: &str, force: bool) -> Result<()> {
        fs::create_dir_all(dir)?;

        if !path.exists() || force {
            fs::write(path, content)?;
            info!("Created config: {}", path.display());
        } else {
            info!("Config exists: {}", path.display());
        }
        Ok(())
    }

    /// Default global config content (TOML)
    fn default_global_config() -> &'static str {
        r#"# SubLang Global Configuration
# User-wide defaults. Project settings in .sublang/config.toml override these.

version = "1.0"

[llm]
provider = "openai"
model = "gpt-4o-mini"
temperature = 0.7
timeout_secs = 120
max_retries = 3
# max_tokens = 2048
# api_base = "https://api.openai.com/v1"
# fallback_provider = "anthropic"
# fallback_model = "claude-3-5-haiku-latest"

[chat]
# "llm" asks the model to route each message, "keyword" matches locally
classifier = "llm"
history_window = 4
"#
    }

    /// Default project config content (TOML)
    fn default_project_config() -> &'static str {
        r#"# SubLang Project Configuration
# Project-specific settings that override global defaults.

version = "1.0"

[design]
# "staged" runs scenarios -> terms -> features -> constraints
# "single" answers with one DESIGN_SPECS call
mode = "staged"

[prompts]
# dir = ".sublang/prompts"
readme = "README.md"
"#
    }
}
