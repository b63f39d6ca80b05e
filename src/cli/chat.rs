use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use super::output::rule;
use crate::chat::{ChatClient, Conversation};
use crate::core::{AppConfig, ModelAlias};

const HELP: &str = "Commands:
  /help           Show this help
  /clear          Clear the conversation (keeps the system prompt)
  /model [name]   Switch model (sonnet, opus or haiku)
  /save [path]    Save the conversation as JSON
  /load <path>    Load a saved conversation
  /stats          Show usage statistics
  /exit           Quit";

#[derive(Debug, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Clear,
    Model(Option<String>),
    Save(Option<PathBuf>),
    Load(Option<PathBuf>),
    Stats,
    Exit,
    Unknown(String),
}

impl ReplCommand {
    /// Returns `None` when the line is a message for the model rather
    /// than a command.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let rest = line.strip_prefix('/')?;
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
            None => (rest, None),
        };

        let command = match name.to_lowercase().as_str() {
            "help" => ReplCommand::Help,
            "clear" => ReplCommand::Clear,
            "model" => ReplCommand::Model(arg.map(String::from)),
            "save" => ReplCommand::Save(arg.map(PathBuf::from)),
            "load" => ReplCommand::Load(arg.map(PathBuf::from)),
            "stats" => ReplCommand::Stats,
            "exit" | "quit" => ReplCommand::Exit,
            _ => ReplCommand::Unknown(name.to_string()),
        };
        Some(command)
    }
}

/// File name used by `/save` when no path is given. A turn is one
/// question and its answer.
pub fn default_transcript_name(dir_name: &str, non_system_len: usize) -> String {
    format!("conversation_{}_{}.json", dir_name, non_system_len / 2)
}

fn current_dir_name() -> String {
    env::current_dir()
        .ok()
        .and_then(|dir| dir.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "session".to_string())
}

fn choose_model(rl: &mut DefaultEditor, current: &str) -> Result<Option<ModelAlias>> {
    println!("Current model: {}", current);
    for (i, alias) in ModelAlias::ALL.iter().enumerate() {
        println!("  {}. {:<7} {} - {}", i + 1, alias, alias.id(), alias.description());
    }
    let choice = match rl.readline("Choose a model (1-3): ") {
        Ok(choice) => choice,
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(ModelAlias::parse(&choice))
}

fn save(conversation: &Conversation, config: &AppConfig, path: Option<PathBuf>) -> Result<PathBuf> {
    if conversation.history().non_system_len() == 0 {
        anyhow::bail!("No conversation history to save");
    }
    let path = match path {
        Some(path) => path,
        None => {
            fs::create_dir_all(&config.conversations_dir)?;
            config.conversations_dir.join(default_transcript_name(
                &current_dir_name(),
                conversation.history().non_system_len(),
            ))
        }
    };
    conversation.save(&path)?;
    Ok(path)
}

fn print_stats(conversation: &Conversation) {
    let stats = conversation.client().stats();
    println!("Model: {}", conversation.client().model());
    println!("Messages in history: {}", conversation.history().len());
    println!("Requests: {}", stats.total_requests);
    println!("Total tokens: {}", stats.total_tokens);
    println!(
        "Average tokens per request: {:.1}",
        stats.average_tokens_per_request()
    );
}

fn load(conversation: &mut Conversation, path: &Path) {
    match conversation.load(path) {
        Ok(()) => println!(
            "Loaded {} messages from {}",
            conversation.history().len(),
            path.display()
        ),
        Err(e) => println!("Failed to load conversation: {}", e),
    }
}

pub async fn run(config: &AppConfig) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let client = ChatClient::from_config(config);
    let mut conversation = Conversation::new(
        client,
        config.system_message.as_deref(),
        config.max_history,
    );

    println!("{}", rule());
    println!("relaychat ({})", config.model);
    println!("Type /help for commands, /exit or Ctrl-D to quit");
    println!("{}", rule());

    loop {
        let line = match rl.readline(">>> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        rl.add_history_entry(line)?;

        match ReplCommand::parse(line) {
            Some(ReplCommand::Help) => println!("{}", HELP),
            Some(ReplCommand::Clear) => {
                conversation.clear();
                println!("Conversation cleared");
            }
            Some(ReplCommand::Model(name)) => {
                let alias = match name {
                    Some(name) => ModelAlias::parse(&name),
                    None => choose_model(&mut rl, conversation.client().model())?,
                };
                match alias {
                    Some(alias) => {
                        conversation.client_mut().set_model(alias.id());
                        println!("Switched to {}", alias.id());
                    }
                    None => println!("Unknown model, expected one of: sonnet, opus, haiku"),
                }
            }
            Some(ReplCommand::Save(path)) => match save(&conversation, config, path) {
                Ok(path) => println!("Saved conversation to {}", path.display()),
                Err(e) => println!("Failed to save conversation: {}", e),
            },
            Some(ReplCommand::Load(Some(path))) => load(&mut conversation, &path),
            Some(ReplCommand::Load(None)) => println!("Usage: /load <path>"),
            Some(ReplCommand::Stats) => print_stats(&conversation),
            Some(ReplCommand::Exit) => break,
            Some(ReplCommand::Unknown(name)) => {
                println!("Unknown command /{}, type /help for a list", name)
            }
            None => {
                let result = conversation
                    .send_stream(line, |fragment| {
                        print!("{}", fragment);
                        io::stdout().flush().ok();
                    })
                    .await;
                println!();
                if let Err(e) = result {
                    tracing::debug!("Turn failed: {:?}", e);
                    println!("Error: {}", e);
                }
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}
