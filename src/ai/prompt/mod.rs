//! Prompt Templates
//!
//! Prompts are markdown files keyed by their upper-cased file stem
//! (`extend_scenarios.md` → `EXTEND_SCENARIOS`).
//!
//! ## Resolution
//!
//! 1. `*.md` files in the configured override directory
//! 2. Embedded defaults compiled from `prompts/`
//! 3. The `GENERAL` prompt, then the empty string
//!
//! The `GENERAL` prompt's `{readme_section}` placeholder is filled with the
//! project README at lookup time.

pub mod embedded;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::PromptsConfig;
use crate::constants::prompts::{COMBINE_SEPARATOR, FILE_EXTENSION, README_PLACEHOLDER};
use crate::types::{Result, SublangError};

/// Well-known prompt keys
pub mod keys {
    pub const CLASSIFY_INTENT: &str = "CLASSIFY_INTENT";
    pub const GENERAL: &str = "GENERAL";
    pub const OVERALL: &str = "OVERALL";
    pub const EXTEND_SCENARIOS: &str = "EXTEND_SCENARIOS";
    pub const EXTRACT_TERMS: &str = "EXTRACT_TERMS";
    pub const ADD_FEATURES: &str = "ADD_FEATURES";
    pub const ADD_CONSTRAINTS: &str = "ADD_CONSTRAINTS";
    pub const DESIGN_SPECS: &str = "DESIGN_SPECS";
}

/// Where a loaded prompt came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    Embedded,
    File(PathBuf),
}

impl std::fmt::Display for PromptSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PromptSource::Embedded => write!(f, "embedded"),
            PromptSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
struct LoadedPrompt {
    text: String,
    source: PromptSource,
}

/// Prompt registry with file overrides and README substitution
#[derive(Debug, Clone)]
pub struct PromptLoader {
    prompts: BTreeMap<String, LoadedPrompt>,
    dir: Option<PathBuf>,
    readme: PathBuf,
}

impl PromptLoader {
    pub fn new(config: &PromptsConfig) -> Result<Self> {
        Self::with_paths(config.dir.clone(), config.readme.clone())
    }

    pub fn with_paths(dir: Option<PathBuf>, readme: PathBuf) -> Result<Self> {
        let mut loader = Self {
            prompts: BTreeMap::new(),
            dir,
            readme,
        };
        loader.load()?;
        Ok(loader)
    }

    /// Embedded prompts only, no README
    pub fn embedded_only() -> Self {
        Self {
            prompts: Self::embedded_prompts(),
            dir: None,
            readme: PathBuf::new(),
        }
    }

    fn embedded_prompts() -> BTreeMap<String, LoadedPrompt> {
        embedded::ALL
            .iter()
            .map(|(key, text)| {
                (
                    key.to_string(),
                    LoadedPrompt {
                        text: text.trim().to_string(),
                        source: PromptSource::Embedded,
                    },
                )
            })
            .collect()
    }

    fn load(&mut self) -> Result<()> {
        let mut prompts = Self::embedded_prompts();

        if let Some(dir) = &self.dir {
            if !dir.is_dir() {
                return Err(SublangError::Config(format!(
                    "Prompts directory '{}' not found",
                    dir.display()
                )));
            }

            let mut overrides = 0;
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some(FILE_EXTENSION) {
                    continue;
                }
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };

                let text = fs::read_to_string(&path)?.trim().to_string();
                debug!("Loaded prompt {} from {}", stem.to_uppercase(), path.display());
                prompts.insert(
                    stem.to_uppercase(),
                    LoadedPrompt {
                        text,
                        source: PromptSource::File(path.clone()),
                    },
                );
                overrides += 1;
            }
            info!("Loaded {} prompt override(s) from {}", overrides, dir.display());
        }

        self.prompts = prompts;
        Ok(())
    }

    /// Re-read the override directory, replacing every loaded prompt
    pub fn reload(&mut self) -> Result<()> {
        self.load()
    }

    /// Prompt for `key`, falling back to `GENERAL` and then to the empty string
    pub fn get(&self, key: &str) -> String {
        let base = self
            .prompts
            .get(key)
            .or_else(|| self.prompts.get(keys::GENERAL))
            .map(|p| p.text.as_str())
            .unwrap_or_default();

        if key == keys::GENERAL && base.contains(README_PLACEHOLDER) {
            return base.replace(README_PLACEHOLDER, &self.readme_section());
        }

        base.to_string()
    }

    /// Loaded keys in sorted order
    pub fn keys(&self) -> Vec<&str> {
        self.prompts.keys().map(String::as_str).collect()
    }

    pub fn source(&self, key: &str) -> Option<&PromptSource> {
        self.prompts.get(key).map(|p| &p.source)
    }

    fn readme_section(&self) -> String {
        match load_readme(&self.readme) {
            Some(content) => format!(
                "\n## Project Information (Optional Reference)\n\
                 The following is information about this project. Use this as context when users \
                 ask about the project, but for general questions unrelated to this project, just \
                 respond normally.\n\n{}",
                content
            ),
            None => String::new(),
        }
    }
}

fn load_readme(path: &Path) -> Option<String> {
    if path.as_os_str().is_empty() || !path.exists() {
        return None;
    }
    match fs::read_to_string(path) {
        Ok(content) => {
            let trimmed = content.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Err(e) => {
            warn!("Could not load {}: {}", path.display(), e);
            None
        }
    }
}

/// Join the shared preamble and a stage prompt
pub fn combine_prompts(overall: &str, specific: &str) -> String {
    format!("{}{}{}", overall, COMBINE_SEPARATOR, specific)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_embedded_keys() {
        let loader = PromptLoader::embedded_only();
        let keys = loader.keys();
        assert_eq!(keys.len(), 8);
        assert!(keys.contains(&"EXTEND_SCENARIOS"));
        assert_eq!(loader.source("OVERALL"), Some(&PromptSource::Embedded));
    }

    #[test]
    fn test_unknown_key_falls_back_to_general() {
        let loader = PromptLoader::embedded_only();
        let general = loader.get(keys::GENERAL);
        assert_eq!(loader.get("NOT_A_PROMPT"), loader.prompts["GENERAL"].text);
        assert!(!general.contains(README_PLACEHOLDER));
    }

    #[test]
    fn test_empty_when_general_missing() {
        let mut loader = PromptLoader::embedded_only();
        loader.prompts.clear();
        assert_eq!(loader.get("ANYTHING"), "");
    }

    #[test]
    fn test_override_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("overall.md"), "  Custom overall  \n").unwrap();
        fs::write(dir.path().join("my_stage.md"), "Extra prompt").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let loader =
            PromptLoader::with_paths(Some(dir.path().to_path_buf()), PathBuf::from("missing.md"))
                .unwrap();

        assert_eq!(loader.get("OVERALL"), "Custom overall");
        assert_eq!(loader.get("MY_STAGE"), "Extra prompt");
        assert!(!loader.keys().contains(&"NOTES"));
        assert!(matches!(loader.source("OVERALL"), Some(PromptSource::File(_))));
        assert_eq!(loader.source("ADD_FEATURES"), Some(&PromptSource::Embedded));
    }

    #[test]
    fn test_missing_override_directory_is_error() {
        let result = PromptLoader::with_paths(
            Some(PathBuf::from("/definitely/not/here")),
            PathBuf::from("README.md"),
        );
        assert!(matches!(result, Err(SublangError::Config(_))));
    }

    #[test]
    fn test_readme_substitution() {
        let dir = TempDir::new().unwrap();
        let readme = dir.path().join("README.md");
        fs::write(&readme, "# Demo\nA demo project.\n").unwrap();
        fs::write(dir.path().join("general.md"), "Be helpful.{readme_section}").unwrap();

        let loader = PromptLoader::with_paths(Some(dir.path().to_path_buf()), readme).unwrap();
        let general = loader.get(keys::GENERAL);

        assert!(general.starts_with("Be helpful.\n## Project Information (Optional Reference)"));
        assert!(general.ends_with("# Demo\nA demo project."));
    }

    #[test]
    fn test_readme_missing_yields_empty_section() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("general.md"), "Be helpful.{readme_section}").unwrap();

        let loader = PromptLoader::with_paths(
            Some(dir.path().to_path_buf()),
            dir.path().join("README.md"),
        )
        .unwrap();
        assert_eq!(loader.get(keys::GENERAL), "Be helpful.");
    }

    #[test]
    fn test_reload_picks_up_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("overall.md");
        fs::write(&path, "v1").unwrap();

        let mut loader =
            PromptLoader::with_paths(Some(dir.path().to_path_buf()), PathBuf::new()).unwrap();
        assert_eq!(loader.get("OVERALL"), "v1");

        fs::write(&path, "v2").unwrap();
        loader.reload().unwrap();
        assert_eq!(loader.get("OVERALL"), "v2");
    }

    #[test]
    fn test_combine_prompts() {
        assert_eq!(combine_prompts("A", "B"), "A\n\n---\n\nB");
    }
}
