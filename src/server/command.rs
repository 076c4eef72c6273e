//! Query-string commands understood by the single dispatch endpoint.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `?wake`: fetch the review feed.
    Wake,
    /// `?search=<name>`: resolve a game name to candidate app ids.
    Search(String),
    /// `?steam=<app id>`: storefront price and score.
    Steam(String),
    /// `?kraken=<name>`: live streams for a game.
    Kraken(String),
    /// `?correct&old=<title>&new=<title>`: persist a title correction.
    Correct { old: String, new: String },
    /// `?titles`: dump the correction store.
    Titles,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("no recognized command in query")]
    NoCommand,
    #[error("missing or empty parameter `{0}`")]
    MissingParam(&'static str),
}

impl Command {
    /// Pick the first recognized command in query order. Unrecognized keys
    /// are ignored, including ones that appear before the command.
    pub fn parse(pairs: &[(String, String)]) -> Result<Self, CommandError> {
        for (key, value) in pairs {
            let cmd = match key.as_str() {
                "wake" => Command::Wake,
                "titles" => Command::Titles,
                "search" => Command::Search(required("search", Some(value))?),
                "steam" => Command::Steam(required("steam", Some(value))?),
                "kraken" => Command::Kraken(required("kraken", Some(value))?),
                "correct" => Command::Correct {
                    old: required("old", param(pairs, "old"))?,
                    new: required("new", param(pairs, "new"))?,
                },
                _ => continue,
            };
            return Ok(cmd);
        }
        Err(CommandError::NoCommand)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Wake => "wake",
            Command::Search(_) => "search",
            Command::Steam(_) => "steam",
            Command::Kraken(_) => "kraken",
            Command::Correct { .. } => "correct",
            Command::Titles => "titles",
        }
    }
}

fn param<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a String> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

fn required(name: &'static str, value: Option<&String>) -> Result<String, CommandError> {
    match value.map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(CommandError::MissingParam(name)),
    }
}
