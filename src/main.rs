use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sublang::cli::LlmOverrides;
use sublang::cli::commands;

#[derive(Parser)]
#[command(name = "sublang")]
#[command(
    version,
    about = "Conversational assistant that turns rough ideas into design specifications"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(long, global = true, help = "Show debug logs")]
    verbose: bool,

    #[arg(long, short, global = true, help = "Only show errors")]
    quiet: bool,

    #[arg(long, global = true, help = "LLM provider (openai, anthropic, ollama)")]
    provider: Option<String>,

    #[arg(long, global = true, help = "Model to use")]
    model: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive chat shell (default)
    Chat,

    /// Answer a single message and exit
    Ask {
        #[arg(help = "Message to send")]
        message: String,
        #[arg(long, help = "Print the outcome as JSON")]
        json: bool,
    },

    /// List loaded prompt templates
    Prompts {
        #[arg(long, value_name = "KEY", help = "Print one prompt")]
        show: Option<String>,
    },

    /// Check credentials and provider connectivity
    Check,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json, yaml"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Edit configuration file with $EDITOR
    Edit {
        #[arg(long, short, help = "Edit global config")]
        global: bool,
    },
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mSubLang encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    // Logs go to stderr so replies on stdout stay clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let overrides = LlmOverrides {
        provider: cli.provider,
        model: cli.model,
    };

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let rt = Runtime::new()?;
            rt.block_on(commands::chat::run(&overrides))?;
        }
        Commands::Ask { message, json } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::ask::run(&overrides, &message, json))?;
        }
        Commands::Prompts { show } => {
            commands::prompts::run(&overrides, show.as_deref())?;
        }
        Commands::Check => {
            let rt = Runtime::new()?;
            rt.block_on(commands::check::run(&overrides))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => commands::config::show(&format)?,
            ConfigAction::Path => commands::config::path()?,
            ConfigAction::Edit { global } => commands::config::edit(global)?,
            ConfigAction::Init { global, force } => commands::config::init(global, force)?,
        },
    }

    Ok(())
}
