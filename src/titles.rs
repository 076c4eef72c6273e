//! Title corrections: user-confirmed mappings from a sanitized feed title to
//! the title that actually finds the game upstream.
//!
//! `TitleBook` is the in-memory set (used by both server and client);
//! `TitleStore` ties a book to the JSON file the server persists it in.

use crate::error::StitchError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleCorrection {
    #[serde(rename = "old")]
    pub old_title: String,
    #[serde(rename = "newTitle")]
    pub new_title: String,
}

impl TitleCorrection {
    pub fn new(old_title: impl Into<String>, new_title: impl Into<String>) -> Self {
        Self {
            old_title: old_title.into(),
            new_title: new_title.into(),
        }
    }
}

/// Append-only corrections plus an index of old title -> newest entry.
#[derive(Debug, Clone, Default)]
pub struct TitleBook {
    entries: Vec<TitleCorrection>,
    newest: HashMap<String, usize>,
}

impl TitleBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<TitleCorrection>) -> Self {
        let mut book = Self::new();
        for entry in entries {
            book.insert(entry);
        }
        book
    }

    /// Append a correction. A later entry for the same old title shadows
    /// earlier ones on lookup; earlier ones stay in the list.
    pub fn insert(&mut self, correction: TitleCorrection) {
        self.newest
            .insert(correction.old_title.clone(), self.entries.len());
        self.entries.push(correction);
    }

    pub fn lookup(&self, old_title: &str) -> Option<&str> {
        self.newest
            .get(old_title)
            .map(|&idx| self.entries[idx].new_title.as_str())
    }

    /// The corrected title, or the input unchanged when no correction exists.
    pub fn resolve<'a>(&'a self, title: &'a str) -> &'a str {
        self.lookup(title).unwrap_or(title)
    }

    pub fn entries(&self) -> &[TitleCorrection] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// File-backed book. The whole file is rewritten on every save.
#[derive(Debug)]
pub struct TitleStore {
    path: PathBuf,
    book: TitleBook,
}

impl TitleStore {
    /// Read the store. A missing file is an empty store; an unreadable or
    /// malformed file is an error.
    pub fn load(path: &Path) -> Result<Self, StitchError> {
        let book = match std::fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => TitleBook::new(),
            Ok(content) => {
                let entries: Vec<TitleCorrection> = serde_json::from_str(&content)
                    .map_err(|e| StitchError::persistence(path, e))?;
                TitleBook::from_entries(entries)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "title store not found, starting empty");
                TitleBook::new()
            }
            Err(e) => return Err(StitchError::persistence(path, e)),
        };
        Ok(Self {
            path: path.to_path_buf(),
            book,
        })
    }

    pub fn book(&self) -> &TitleBook {
        &self.book
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a correction in memory, then rewrite the file. The in-memory
    /// copy keeps the correction even when the write fails.
    pub async fn record(&mut self, correction: TitleCorrection) -> Result<(), StitchError> {
        self.book.insert(correction);
        self.save().await
    }

    pub async fn save(&self) -> Result<(), StitchError> {
        let json = serde_json::to_string(self.book.entries())
            .map_err(|e| StitchError::persistence(&self.path, e))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StitchError::persistence(&self.path, e))?;
        }
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| StitchError::persistence(&self.path, e))
    }
}
