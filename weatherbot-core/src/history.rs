use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use tracing::info;

/// One question and the answer it got.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub response: String,
}

/// Append-only JSON-lines log of interactions.
#[derive(Debug, Clone)]
pub struct InteractionLog {
    path: PathBuf,
}

impl InteractionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Record an interaction, creating the file and its directory on first use.
    pub fn record(&self, query: &str, response: &str, timestamp: DateTime<Utc>) -> Result<()> {
        info!(%timestamp, query, response_chars = response.len(), "user interaction");

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create history directory: {}", parent.display())
            })?;
        }

        let entry = Interaction {
            timestamp,
            query: query.to_string(),
            response: response.to_string(),
        };
        let line = serde_json::to_string(&entry).context("Failed to serialize interaction")?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open history file: {}", self.path.display()))?;
        writeln!(file, "{line}")
            .with_context(|| format!("Failed to write history file: {}", self.path.display()))?;

        Ok(())
    }

    /// The last `limit` interactions, oldest first. Unreadable lines are skipped.
    pub fn recent(&self, limit: usize) -> Result<Vec<Interaction>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read history file: {}", self.path.display()))?;

        let entries: Vec<Interaction> = contents
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect();

        let skip = entries.len().saturating_sub(limit);
        Ok(entries.into_iter().skip(skip).collect())
    }
}
