//! Chat Command
//!
//! Interactive design-assistant shell.
//!
//! Usage:
//!   sublang [chat]

use crate::cli::repl::ReplSession;
use crate::cli::util::{CommandContext, LlmOverrides};
use crate::types::Result;

pub async fn run(overrides: &LlmOverrides) -> Result<()> {
    let ctx = CommandContext::load(overrides)?;
    ctx.require_credentials()?;

    println!("Initializing SubLang Chatbot...");
    let assistant = ctx.assistant()?;

    let mut session = ReplSession::new(assistant);
    session.run().await
}
