//! Ask Command
//!
//! Answer a single message without entering the shell.
//!
//! Usage:
//!   sublang ask "design a URL shortener" [--json]

use console::style;

use crate::cli::repl::intent_label;
use crate::cli::util::{CommandContext, LlmOverrides};
use crate::types::{History, Result};

pub async fn run(overrides: &LlmOverrides, message: &str, as_json: bool) -> Result<()> {
    let ctx = CommandContext::load(overrides)?;
    ctx.require_credentials()?;

    let assistant = ctx.assistant()?;
    let outcome = assistant.chat(message, &History::new()).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome.response);
        println!("{}", style(intent_label(outcome.intent)).dim());
    }
    Ok(())
}
