// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for the files tcollect keeps on the
//! user's machine: configuration files, the dead-letter queue, and the small
//! session files that survive between invocations.

use std::path::PathBuf;

/// Determine absolute path to user's home directory.
///
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(NoWayHome)
}

/// Determine default absolute path to the dead-letter queue directory.
///
/// Uses `~/.tasks/queue`, which every submitting command shares. Does not
/// check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn default_queue_dir() -> Result<PathBuf> {
    home_dir().map(|path| path.join(".tasks").join("queue"))
}

/// Path to file holding the last saved observation id.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn observation_id_file() -> Result<PathBuf> {
    home_dir().map(|path| path.join(".observation_id"))
}

/// Path to interactive shell history file.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn history_file() -> Result<PathBuf> {
    home_dir().map(|path| path.join(".tasks_history"))
}

/// Configuration search path, lowest precedence first.
///
/// System-wide file, then the user's file, then a file in the current
/// working directory used during development of the service itself.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn config_search_path() -> Result<Vec<PathBuf>> {
    Ok(vec![
        PathBuf::from("/etc/tasks-collector.toml"),
        home_dir()?.join(".tasks-collector.toml"),
        PathBuf::from("tasks-collector.toml"),
    ])
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
