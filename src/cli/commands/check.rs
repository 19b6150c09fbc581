//! Check Command
//!
//! Verify credentials and provider reachability before chatting.
//!
//! Usage:
//!   sublang check

use crate::ai::preflight::PreflightCheck;
use crate::ai::provider::build_provider;
use crate::ai::timeout::TimeoutConfig;
use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, LlmOverrides};
use crate::types::{Result, SublangError};

pub async fn run(overrides: &LlmOverrides) -> Result<()> {
    let ctx = CommandContext::load(overrides)?;
    let output = Output::new();
    output.header("SubLang pre-flight check");
    println!(
        "Provider: {}  Model: {}",
        ctx.config.llm.provider, ctx.config.llm.model
    );

    let mut result = PreflightCheck::check_credentials(&ctx.config.llm);
    if result.passed {
        let provider = build_provider(&ctx.config.llm)?;
        let timeouts = TimeoutConfig::from_llm(&ctx.config.llm);
        PreflightCheck::check_provider_health(provider.as_ref(), timeouts.health_check, &mut result)
            .await;
    }

    output.preflight(&result);

    if result.passed {
        output.success("Ready to chat");
        Ok(())
    } else {
        Err(SublangError::Config(format!(
            "{} check(s) failed",
            result.errors.len()
        )))
    }
}
