use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use super::error::{ChatError, Result};
use super::models::DEFAULT_MODEL;

pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_HISTORY: usize = 20;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_key: String,
    pub api_base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_history: usize,
    pub system_message: Option<String>,
    pub conversations_dir: PathBuf,
}

impl AppConfig {
    /// Config with the required credentials and defaults for everything
    /// else. Useful for tests and for callers that don't want anything
    /// read from the environment.
    pub fn new(api_key: &str, api_base_url: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            api_base_url: api_base_url.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            max_history: DEFAULT_MAX_HISTORY,
            system_message: None,
            conversations_dir: PathBuf::from("conversations"),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup. Missing credentials are
    /// reported here so nothing reaches the network without them.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let (api_key, api_base_url) = match (get("OPENAI_API_KEY"), get("OPENAI_BASE_URL")) {
            (Some(key), Some(url)) => (key, url),
            _ => {
                return Err(ChatError::Config(
                    "Missing API key or base URL. Set OPENAI_API_KEY and OPENAI_BASE_URL"
                        .to_string(),
                ));
            }
        };

        let mut config = Self::new(&api_key, &api_base_url);
        if let Some(model) = get("RELAYCHAT_MODEL") {
            config.model = model;
        }
        if let Some(v) = get("RELAYCHAT_MAX_TOKENS") {
            config.max_tokens = parse_var("RELAYCHAT_MAX_TOKENS", &v)?;
        }
        if let Some(v) = get("RELAYCHAT_TEMPERATURE") {
            let temperature: f32 = parse_var("RELAYCHAT_TEMPERATURE", &v)?;
            if !(0.0..=1.0).contains(&temperature) {
                return Err(ChatError::Config(format!(
                    "RELAYCHAT_TEMPERATURE must be between 0 and 1, got {}",
                    temperature
                )));
            }
            config.temperature = temperature;
        }
        if let Some(v) = get("RELAYCHAT_MAX_HISTORY") {
            config.max_history = parse_var("RELAYCHAT_MAX_HISTORY", &v)?;
        }
        config.system_message = get("RELAYCHAT_SYSTEM_MESSAGE");
        if let Some(dir) = get("RELAYCHAT_CONVERSATIONS_DIR") {
            config.conversations_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// The API key with most of it hidden, for printing.
    pub fn masked_api_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() <= 30 {
            let head: String = chars.iter().take(4).collect();
            return format!("{}...", head);
        }
        let head: String = chars[..20].iter().collect();
        let tail: String = chars[chars.len() - 10..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ChatError::Config(format!("Invalid value for {}: {}", key, value)))
}
