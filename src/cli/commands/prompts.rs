//! Prompts Command
//!
//! Inspect the prompt templates in effect.
//!
//! Usage:
//!   sublang prompts
//!   sublang prompts --show EXTEND_SCENARIOS

use console::style;

use crate::ai::prompt::PromptLoader;
use crate::cli::util::{CommandContext, LlmOverrides};
use crate::types::{Result, SublangError};

pub fn run(overrides: &LlmOverrides, show: Option<&str>) -> Result<()> {
    let ctx = CommandContext::load(overrides)?;
    let loader = PromptLoader::new(&ctx.config.prompts)?;

    match show {
        Some(key) => println!("{}", render_prompt(&loader, key)?),
        None => {
            println!("{}", style("Loaded prompts:").bold());
            for key in loader.keys() {
                let source = loader
                    .source(key)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                println!("  {:20} {}", key, style(source).dim());
            }
        }
    }
    Ok(())
}

/// Prompt text for a key given in any case
pub fn render_prompt(loader: &PromptLoader, key: &str) -> Result<String> {
    let key = key.to_uppercase();
    if loader.source(&key).is_none() {
        return Err(SublangError::Prompt(format!(
            "Unknown prompt '{}'. Available: {}",
            key,
            loader.keys().join(", ")
        )));
    }
    Ok(loader.get(&key))
}
