pub mod commands;
pub mod repl;
pub mod ui;
pub mod util;

pub use repl::{ReplSession, read_multiline};
pub use util::{CommandContext, LlmOverrides};
