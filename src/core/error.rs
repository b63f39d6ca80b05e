use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Unknown or unsupported model: {0}")]
    UnknownModel(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("No message received. Resp:\n\n {0}")]
    EmptyResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),

    #[error("Invalid transcript: {0}")]
    Transcript(String),
}

impl ChatError {
    /// Classify a non-2xx response from a chat completion endpoint.
    /// OpenAI compatible servers put the useful part in
    /// `{"error": {"message": ..., "code": ...}}` but proxies don't
    /// always follow that so fall back to the raw body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let error = parsed.as_ref().map(|v| &v["error"]);
        let message = error
            .and_then(|e| e["message"].as_str().or_else(|| e.as_str()))
            .map(str::to_string)
            .unwrap_or_else(|| body.trim().to_string());
        let code = error
            .and_then(|e| e["code"].as_str())
            .unwrap_or_default();

        // A bare 404 is as likely a base URL missing `/v1` as a bad model
        match status {
            _ if code == "model_not_found" => ChatError::UnknownModel(message),
            401 | 403 => ChatError::Auth(message),
            429 => ChatError::RateLimited(message),
            _ => ChatError::Api { status, message },
        }
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
