use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod analyze;
pub mod ask;
pub mod batch;
pub mod chat;
pub mod check;
pub mod compare;
pub mod file;
pub mod output;
pub mod stock;

use crate::core::{AppConfig, ModelAlias};
use analyze::AnalysisKind;

#[derive(Subcommand)]
enum Command {
    /// Ask a single question
    Ask {
        question: String,
        /// Print the answer as it is generated
        #[arg(long, action, default_value = "false")]
        stream: bool,
        /// Optional system prompt
        #[arg(long)]
        system: Option<String>,
    },
    /// Analyze a file
    File {
        path: PathBuf,
        /// Ask a specific question about the file
        #[arg(long)]
        question: Option<String>,
    },
    /// Review a source file
    Review {
        path: PathBuf,
        /// Analyze time and space complexity instead
        #[arg(long, action, default_value = "false")]
        complexity: bool,
    },
    /// Overview of a stock by its code
    Stock { code: String },
    /// Run a structured financial analysis from a JSON input file
    Analyze {
        #[arg(value_enum)]
        kind: AnalysisKind,
        #[arg(long)]
        input: PathBuf,
    },
    /// Ask every model the same question and compare
    Compare {
        question: String,
        #[arg(long, default_value = "500")]
        max_tokens: u32,
    },
    /// Ask each line of a file as a separate question
    Batch {
        path: PathBuf,
        #[arg(long, default_value = "200")]
        max_tokens: u32,
    },
    /// Verify the API key, base URL and model access
    Check {},
    /// Start an interactive chat session (the default)
    Chat {},
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Model to use, overrides RELAYCHAT_MODEL
    #[arg(short, long, value_enum, global = true)]
    model: Option<ModelAlias>,

    #[command(subcommand)]
    command: Option<Command>,
}

fn init_tracing() {
    // Logs go to stderr so they never interleave with streamed answers
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=warn", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    dotenv::dotenv().ok();
    init_tracing();

    let mut config = AppConfig::from_env()?;
    if let Some(alias) = args.model {
        config = config.with_model(alias.id());
    }
    tracing::debug!("Using model {} at {}", config.model, config.api_base_url);

    // Handle each sub command
    match args.command {
        Some(Command::Ask {
            question,
            stream,
            system,
        }) => {
            ask::run(&config, &question, stream, system.as_deref()).await?;
        }
        Some(Command::File { path, question }) => {
            file::analyze(&config, &path, question.as_deref()).await?;
        }
        Some(Command::Review { path, complexity }) => {
            file::review(&config, &path, complexity).await?;
        }
        Some(Command::Stock { code }) => {
            stock::run(&config, &code).await?;
        }
        Some(Command::Analyze { kind, input }) => {
            analyze::run(&config, kind, &input).await?;
        }
        Some(Command::Compare {
            question,
            max_tokens,
        }) => {
            compare::run(&config, &question, max_tokens).await?;
        }
        Some(Command::Batch { path, max_tokens }) => {
            batch::run(&config, &path, max_tokens).await?;
        }
        Some(Command::Check {}) => {
            check::run(&config).await?;
        }
        Some(Command::Chat {}) | None => {
            chat::run(&config).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask_with_model() {
        let cli =
            Cli::try_parse_from(["relaychat", "-m", "opus", "ask", "hi", "--stream"]).unwrap();
        assert_eq!(cli.model, Some(ModelAlias::Opus));
        match cli.command {
            Some(Command::Ask {
                question, stream, ..
            }) => {
                assert_eq!(question, "hi");
                assert!(stream);
            }
            _ => panic!("Expected Ask"),
        }
    }

    #[test]
    fn test_model_is_global() {
        let cli =
            Cli::try_parse_from(["relaychat", "stock", "600519", "--model", "haiku"]).unwrap();
        assert_eq!(cli.model, Some(ModelAlias::Haiku));
    }

    #[test]
    fn test_no_subcommand_is_chat() {
        let cli = Cli::try_parse_from(["relaychat"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.model.is_none());
    }

    #[test]
    fn test_rejects_unknown_model() {
        assert!(Cli::try_parse_from(["relaychat", "-m", "gpt4", "check"]).is_err());
    }

    #[test]
    fn test_parse_review_complexity() {
        let cli =
            Cli::try_parse_from(["relaychat", "review", "src/lib.rs", "--complexity"]).unwrap();
        match cli.command {
            Some(Command::Review { path, complexity }) => {
                assert_eq!(path, PathBuf::from("src/lib.rs"));
                assert!(complexity);
            }
            _ => panic!("Expected Review"),
        }
    }

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from([
            "relaychat",
            "analyze",
            "comprehensive",
            "--input",
            "data.json",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Analyze { kind, input }) => {
                assert_eq!(kind, AnalysisKind::Comprehensive);
                assert_eq!(input, PathBuf::from("data.json"));
            }
            _ => panic!("Expected Analyze"),
        }
    }
}
