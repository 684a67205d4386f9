// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! State that outlives a single command.
//!
//! Two small files in the user's home directory carry state between
//! invocations:
//!
//! - `~/.observation_id` holds the observation that `update` targets when no
//!   id is given.
//! - `~/.tasks_history` holds interactive shell input, newest last, capped at
//!   [`HISTORY_LIMIT`] lines.

use crate::path::{history_file, observation_id_file, NoWayHome};

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Maximum number of shell history lines kept.
pub const HISTORY_LIMIT: usize = 1000;

/// Per-user session state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    /// Board thread tasks go to in the interactive shell.
    pub thread: String,
    observation_file: PathBuf,
    history_file: PathBuf,
    history: Vec<String>,
}

impl Session {
    pub fn new(observation_file: impl Into<PathBuf>, history_file: impl Into<PathBuf>) -> Self {
        Self {
            thread: "Inbox".into(),
            observation_file: observation_file.into(),
            history_file: history_file.into(),
            history: Vec::new(),
        }
    }

    /// Construct session backed by files in the user's home directory.
    ///
    /// # Errors
    ///
    /// - Return [`SessionError::NoWayHome`] if home directory cannot be
    ///   determined.
    pub fn from_home() -> Result<Self> {
        Ok(Self::new(observation_id_file()?, history_file()?))
    }

    /// Observation id saved by a previous command.
    ///
    /// A missing file or one without a number in it means nothing is saved.
    ///
    /// # Errors
    ///
    /// - Return [`SessionError::Read`] if file exists but cannot be read.
    pub fn saved_observation_id(&self) -> Result<Option<u64>> {
        let Some(text) = read_optional(&self.observation_file)? else {
            return Ok(None);
        };

        let id = text.trim().parse().ok();
        if id.is_none() {
            debug!("ignoring unparsable {:?}", self.observation_file.display());
        }
        Ok(id)
    }

    /// Remember observation id for later updates.
    ///
    /// # Errors
    ///
    /// - Return [`SessionError::Write`] if file cannot be written.
    pub fn save_observation_id(&self, id: u64) -> Result<()> {
        write(&self.observation_file, &id.to_string())
    }

    /// Load shell history from disk, replacing what is held in memory.
    ///
    /// # Errors
    ///
    /// - Return [`SessionError::Read`] if file exists but cannot be read.
    pub fn load_history(&mut self) -> Result<()> {
        self.history = read_optional(&self.history_file)?
            .map(|text| text.lines().map(str::to_string).collect())
            .unwrap_or_default();
        self.trim_history();
        Ok(())
    }

    /// Record shell input. Blank lines and immediate repeats are skipped.
    pub fn push_history(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || self.history.last().is_some_and(|last| last == line) {
            return;
        }

        self.history.push(line.to_string());
        self.trim_history();
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Write shell history to disk.
    ///
    /// # Errors
    ///
    /// - Return [`SessionError::Write`] if file cannot be written.
    pub fn save_history(&self) -> Result<()> {
        let mut text = self.history.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        write(&self.history_file, &text)
    }

    fn trim_history(&mut self) {
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(SessionError::Read {
            source: err,
            path: path.to_path_buf(),
        }),
    }
}

fn write(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).map_err(|err| SessionError::Write {
        source: err,
        path: path.to_path_buf(),
    })
}

/// Session error types.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Failed to read session file.
    #[error("failed to read session file {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to write session file.
    #[error("failed to write session file {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error(transparent)]
    NoWayHome(#[from] NoWayHome),
}

/// Friendly result alias :3
type Result<T, E = SessionError> = std::result::Result<T, E>;
