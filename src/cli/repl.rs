//! Interactive chat session
//!
//! Input is multi-line: the user types or pastes freely and finishes with two
//! empty lines. Lines starting with `/` are shell commands, never sent to the
//! model.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;
use tracing::{debug, error};

use super::ui::Output;
use crate::chat::Assistant;
use crate::constants::chat::{EXIT_WORDS, INPUT_TERMINATOR_LINES};
use crate::types::{History, Intent, Result, Role};

/// Read one multi-line message.
///
/// Stops after [`INPUT_TERMINATOR_LINES`] consecutive empty lines at the end
/// of the input, which are dropped. Blank lines in the middle of pasted text
/// are kept. Returns `None` when the reader is exhausted before any line.
pub fn read_multiline<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut lines: Vec<String> = Vec::new();
    let mut saw_line = false;

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        saw_line = true;
        lines.push(line.trim_end_matches(['\n', '\r']).to_string());

        let n = lines.len();
        if n >= INPUT_TERMINATOR_LINES
            && lines[n - INPUT_TERMINATOR_LINES..]
                .iter()
                .all(|l| l.is_empty())
        {
            lines.truncate(n - INPUT_TERMINATOR_LINES);
            break;
        }
    }

    if !saw_line {
        return Ok(None);
    }
    Ok(Some(lines.join("\n").trim().to_string()))
}

pub fn is_exit_word(input: &str) -> bool {
    EXIT_WORDS.iter().any(|w| input.eq_ignore_ascii_case(w))
}

/// Slash commands understood by the shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Clear,
    History,
    Stats,
    Save(Option<PathBuf>),
    Reload,
    Unknown(String),
}

impl SlashCommand {
    /// Parse `input` if it is a slash command
    pub fn parse(input: &str) -> Option<Self> {
        if !input.starts_with('/') {
            return None;
        }
        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or_default();
        let arg = parts.next();

        Some(match cmd {
            "/help" | "/h" => Self::Help,
            "/clear" | "/c" => Self::Clear,
            "/history" => Self::History,
            "/stats" => Self::Stats,
            "/save" => Self::Save(arg.map(PathBuf::from)),
            "/reload" => Self::Reload,
            other => Self::Unknown(other.to_string()),
        })
    }
}

/// Transcript written by `/save`
#[derive(Debug, Serialize)]
pub struct Transcript<'a> {
    pub session_id: &'a str,
    pub model: &'a str,
    pub saved_at: DateTime<Utc>,
    pub history: &'a History,
}

pub fn save_transcript(path: &Path, transcript: &Transcript<'_>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(transcript)?)?;
    Ok(())
}

pub struct ReplSession {
    assistant: Assistant,
    history: History,
    output: Output,
}

impl ReplSession {
    pub fn new(assistant: Assistant) -> Self {
        Self {
            assistant,
            history: History::new(),
            output: Output::new(),
        }
    }

    /// Run the read/answer loop until an exit word or end of input
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        let stdin = io::stdin();
        let mut reader = stdin.lock();

        loop {
            print!("{} ", style("You:").green().bold());
            println!("{}", style("(Press Enter twice to finish)").dim());
            io::stdout().flush()?;

            let Some(input) = read_multiline(&mut reader)? else {
                println!();
                break;
            };

            if input.is_empty() {
                continue;
            }
            if is_exit_word(&input) {
                break;
            }

            if let Some(command) = SlashCommand::parse(&input) {
                self.handle_slash_command(command);
                continue;
            }

            self.process_user_input(&input).await;
        }

        println!("Goodbye!");
        Ok(())
    }

    async fn process_user_input(&mut self, input: &str) {
        println!("{}", style("Bot: (Working on it...)").cyan());
        io::stdout().flush().ok();

        match self.assistant.chat(input, &self.history).await {
            Ok(outcome) => {
                println!("{}", outcome.response);
                println!("{}\n", style(intent_label(outcome.intent)).dim());
                self.history = outcome.history;
            }
            Err(e) => {
                error!("Turn failed: {}", e);
                self.output.error(&format!("Error: {}", e));
            }
        }
    }

    fn handle_slash_command(&mut self, command: SlashCommand) {
        debug!("Slash command: {:?}", command);
        match command {
            SlashCommand::Help => self.print_help(),
            SlashCommand::Clear => {
                self.history.clear();
                println!("{}", style("Conversation cleared.").dim());
            }
            SlashCommand::History => self.print_history(),
            SlashCommand::Stats => {
                println!("{}", self.assistant.metrics().summary().display());
            }
            SlashCommand::Save(None) => {
                self.output.warning("Usage: /save <path>");
            }
            SlashCommand::Save(Some(path)) => {
                let transcript = Transcript {
                    session_id: self.assistant.session_id().as_str(),
                    model: self.assistant.model(),
                    saved_at: Utc::now(),
                    history: &self.history,
                };
                match save_transcript(&path, &transcript) {
                    Ok(()) => self
                        .output
                        .success(&format!("Transcript saved to {}", path.display())),
                    Err(e) => self.output.error(&format!("Could not save transcript: {}", e)),
                }
            }
            SlashCommand::Reload => match self.assistant.reload_prompts() {
                Ok(count) => self.output.success(&format!("Reloaded {} prompts", count)),
                Err(e) => self.output.error(&format!("Prompt reload failed: {}", e)),
            },
            SlashCommand::Unknown(cmd) => {
                println!("{} Unknown command: {}", style("?").yellow(), cmd);
                println!("Type {} for available commands", style("/help").yellow());
            }
        }
    }

    fn print_welcome(&self) {
        self.output.header("SubLang Chatbot");
        println!("Using model: {}", style(self.assistant.model()).cyan());
        println!(
            "Type {} to exit, {} for commands.",
            style("quit").yellow(),
            style("/help").yellow()
        );
        println!("Press Enter twice to finish input.\n");
    }

    fn print_help(&self) {
        println!();
        println!("{}", style("Available Commands:").cyan().bold());
        println!("  {:16} Show this help", style("/help").yellow());
        println!("  {:16} Clear conversation history", style("/clear").yellow());
        println!("  {:16} Show conversation history", style("/history").yellow());
        println!("  {:16} Show token usage and latency", style("/stats").yellow());
        println!("  {:16} Save the transcript as JSON", style("/save <path>").yellow());
        println!("  {:16} Reload prompt overrides", style("/reload").yellow());
        println!("  {:16} Exit", style("quit").yellow());
        println!();
    }

    fn print_history(&self) {
        if self.history.is_empty() {
            println!("{}", style("No conversation history.").dim());
            return;
        }

        println!();
        println!("{}", style("Conversation History:").cyan().bold());
        for (i, msg) in self.history.entries().iter().enumerate() {
            let role = match msg.role {
                Role::User => style("User").green(),
                Role::Assistant => style("Assistant").blue(),
                Role::System => style("System").dim(),
            };
            let preview: String = msg.content.chars().take(100).collect();
            let ellipsis = if msg.content.chars().count() > 100 { "..." } else { "" };
            println!("  [{}] {}: {}{}", i + 1, role, preview.replace('\n', " "), ellipsis);
        }
        println!();
    }
}

/// Intent label shown under each reply
pub fn intent_label(intent: Intent) -> String {
    format!("(Intent: {})", intent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn read(input: &str) -> Option<String> {
        read_multiline(&mut Cursor::new(input)).unwrap()
    }

    #[test]
    fn test_two_empty_lines_finish_input() {
        assert_eq!(read("hello\n\n\nnext\n").as_deref(), Some("hello"));
    }

    #[test]
    fn test_inner_blank_line_kept() {
        let mut reader = Cursor::new("line one\n\nline two\n\n\n");
        assert_eq!(
            read_multiline(&mut reader).unwrap().as_deref(),
            Some("line one\n\nline two")
        );
        assert_eq!(read_multiline(&mut reader).unwrap(), None);
    }

    #[test]
    fn test_eof_ends_input() {
        assert_eq!(read("partial\ntext").as_deref(), Some("partial\ntext"));
        assert_eq!(read(""), None);
    }

    #[test]
    fn test_input_is_trimmed() {
        assert_eq!(read("   padded  \r\n\r\n\r\n").as_deref(), Some("padded"));
        assert_eq!(read("\n\n").as_deref(), Some(""));
    }

    #[test]
    fn test_exit_words() {
        assert!(is_exit_word("quit"));
        assert!(is_exit_word("EXIT"));
        assert!(!is_exit_word("quit now"));
    }

    #[test]
    fn test_slash_commands() {
        assert_eq!(SlashCommand::parse("hello"), None);
        assert_eq!(SlashCommand::parse("/help"), Some(SlashCommand::Help));
        assert_eq!(
            SlashCommand::parse("/save out/t.json"),
            Some(SlashCommand::Save(Some(PathBuf::from("out/t.json"))))
        );
        assert_eq!(SlashCommand::parse("/save"), Some(SlashCommand::Save(None)));
        assert_eq!(
            SlashCommand::parse("/frobnicate"),
            Some(SlashCommand::Unknown("/frobnicate".to_string()))
        );
    }

    #[test]
    fn test_save_transcript() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("chat.json");
        let mut history = History::new();
        history.record_exchange("hi", "hello");

        let transcript = Transcript {
            session_id: "abc",
            model: "gpt-4o-mini",
            saved_at: Utc::now(),
            history: &history,
        };
        save_transcript(&path, &transcript).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["session_id"], "abc");
        assert_eq!(saved["history"][1]["role"], "assistant");
        assert!(saved["saved_at"].is_string());
    }

    #[test]
    fn test_intent_label() {
        assert_eq!(intent_label(Intent::DesignSpecs), "(Intent: DESIGN_SPECS)");
    }
}
