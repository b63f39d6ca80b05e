//! Model aliases accepted on the command line and in the REPL.

use std::fmt;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelAlias {
    Sonnet,
    Opus,
    Haiku,
}

impl ModelAlias {
    pub const ALL: [ModelAlias; 3] = [ModelAlias::Sonnet, ModelAlias::Opus, ModelAlias::Haiku];

    /// The model identifier sent to the API.
    pub fn id(&self) -> &'static str {
        match self {
            ModelAlias::Sonnet => "claude-sonnet-4-5",
            ModelAlias::Opus => "claude-opus-4-5",
            ModelAlias::Haiku => "claude-haiku-4-5",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ModelAlias::Sonnet => "balanced (recommended)",
            ModelAlias::Opus => "most capable",
            ModelAlias::Haiku => "fastest",
        }
    }

    /// Resolve an alias, a menu number (1-3) or a full model id.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        ModelAlias::ALL.into_iter().enumerate().find_map(|(i, alias)| {
            let matches = s == (i + 1).to_string() || s == alias.to_string() || s == alias.id();
            matches.then_some(alias)
        })
    }
}

impl fmt::Display for ModelAlias {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ModelAlias::Sonnet => "sonnet",
            ModelAlias::Opus => "opus",
            ModelAlias::Haiku => "haiku",
        };
        f.pad(name)
    }
}
