// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Tcollect reads its settings from a stack of TOML files. Each file is a
//! [`ConfigLayer`] where every key is optional, so a layer only needs to
//! mention what it overrides. Layers are merged lowest precedence first, and
//! the merged stack is resolved into a [`TasksConfig`] that the rest of the
//! crate works with.
//!
//! # General Layout
//!
//! ```toml
//! [tasks]
//! url = "https://tasks.example.org"
//! user = "me"
//! password = "secret"
//! ignore_habits = ["reading"]
//!
//! [display]
//! observation_list_count = 10
//! observation_list_characters = 70
//!
//! [queue]
//! directory = "~/.tasks/queue"
//! delete_on = "success"
//! ```

use crate::{path::default_queue_dir, queue::DeletePolicy};

use serde::{Deserialize, Serialize};
use std::{
    fs::read_to_string,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, instrument};

const DEFAULT_OBSERVATION_LIST_COUNT: usize = 10;
const DEFAULT_OBSERVATION_LIST_CHARACTERS: usize = 70;

/// Single configuration file.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfigLayer {
    /// Connection settings for the Tasks Collector service.
    pub tasks: TasksSection,

    /// Listing display settings.
    pub display: DisplaySection,

    /// Dead-letter queue settings.
    pub queue: QueueSection,
}

impl ConfigLayer {
    /// Merge `other` on top of this layer.
    ///
    /// Keys set in `other` win, keys it leaves out keep their current value.
    pub fn merge(self, other: ConfigLayer) -> Self {
        Self {
            tasks: TasksSection {
                url: other.tasks.url.or(self.tasks.url),
                user: other.tasks.user.or(self.tasks.user),
                password: other.tasks.password.or(self.tasks.password),
                ignore_habits: other.tasks.ignore_habits.or(self.tasks.ignore_habits),
            },
            display: DisplaySection {
                observation_list_count: other
                    .display
                    .observation_list_count
                    .or(self.display.observation_list_count),
                observation_list_characters: other
                    .display
                    .observation_list_characters
                    .or(self.display.observation_list_characters),
            },
            queue: QueueSection {
                directory: other.queue.directory.or(self.queue.directory),
                delete_on: other.queue.delete_on.or(self.queue.delete_on),
            },
        }
    }
}

impl FromStr for ConfigLayer {
    type Err = toml::de::Error;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        toml::de::from_str(data)
    }
}

/// Connection settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TasksSection {
    /// Base URL of the service, without trailing slash.
    pub url: Option<String>,

    /// Basic auth user name.
    pub user: Option<String>,

    /// Basic auth password. Prompted for when absent.
    pub password: Option<String>,

    /// Habit tag names hidden from habit listings.
    pub ignore_habits: Option<Vec<String>>,
}

/// Display settings for listings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplaySection {
    pub observation_list_count: Option<usize>,
    pub observation_list_characters: Option<usize>,
}

/// Dead-letter queue settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueSection {
    /// Queue directory, shell expanded.
    pub directory: Option<String>,

    /// When a flushed letter may be removed from the queue.
    pub delete_on: Option<DeletePolicy>,
}

/// Fully resolved configuration.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TasksConfig {
    pub url: String,
    pub user: String,
    pub password: Option<String>,
    pub ignore_habits: Vec<String>,
    pub observation_list_count: usize,
    pub observation_list_characters: usize,
    pub queue_dir: PathBuf,
    pub delete_on: DeletePolicy,
}

impl TasksConfig {
    /// Load and merge every existing file in `paths`.
    ///
    /// Files that do not exist are skipped, just like a missing layer.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::ReadFile`] if an existing file cannot be read.
    /// - Return [`ConfigError::Deserialize`] if a file is not valid TOML.
    /// - Return [`ConfigError::MissingKey`] if the merged stack lacks a
    ///   required key.
    #[instrument(skip(paths), level = "debug")]
    pub fn load(paths: impl IntoIterator<Item = impl AsRef<Path>>) -> Result<Self> {
        let mut merged = ConfigLayer::default();
        for path in paths {
            let path = path.as_ref();
            let data = match read_to_string(path) {
                Ok(data) => data,
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => {
                    return Err(ConfigError::ReadFile {
                        source: err,
                        path: path.to_path_buf(),
                    })
                }
            };

            debug!("read configuration layer {:?}", path.display());
            let layer = data
                .parse::<ConfigLayer>()
                .map_err(|err| ConfigError::Deserialize {
                    source: err,
                    path: path.to_path_buf(),
                })?;
            merged = merged.merge(layer);
        }

        Self::try_from_layer(merged)
    }

    /// Resolve merged layer into final configuration.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::MissingKey`] if `tasks.url` or `tasks.user`
    ///   is absent.
    /// - Return [`ConfigError::ShellExpansion`] if queue directory cannot
    ///   be expanded.
    pub fn try_from_layer(layer: ConfigLayer) -> Result<Self> {
        let url = layer.tasks.url.ok_or(ConfigError::MissingKey("url"))?;
        let user = layer.tasks.user.ok_or(ConfigError::MissingKey("user"))?;

        // INVARIANT: Endpoints are joined as "{url}/path/", so no trailing slash.
        let url = url.trim_end_matches('/').to_string();

        let queue_dir = match layer.queue.directory {
            Some(directory) => PathBuf::from(shellexpand::full(&directory)?.into_owned()),
            None => default_queue_dir()?,
        };

        Ok(Self {
            url,
            user,
            password: layer.tasks.password,
            ignore_habits: layer
                .tasks
                .ignore_habits
                .unwrap_or_default()
                .into_iter()
                .map(|habit| habit.trim().to_string())
                .filter(|habit| !habit.is_empty())
                .collect(),
            observation_list_count: layer
                .display
                .observation_list_count
                .unwrap_or(DEFAULT_OBSERVATION_LIST_COUNT),
            observation_list_characters: layer
                .display
                .observation_list_characters
                .unwrap_or(DEFAULT_OBSERVATION_LIST_CHARACTERS),
            queue_dir,
            delete_on: layer.queue.delete_on.unwrap_or_default(),
        })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read existing configuration file.
    #[error("failed to read configuration file {:?}", path.display())]
    ReadFile {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error("failed to parse configuration file {:?}", path.display())]
    Deserialize {
        #[source]
        source: toml::de::Error,
        path: PathBuf,
    },

    /// Required key missing from every layer.
    #[error(
        "missing tasks.{0}: create ~/.tasks-collector.toml with a [tasks] section \
         containing url/user/password"
    )]
    MissingKey(&'static str),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Default paths need a home directory.
    #[error(transparent)]
    NoWayHome(#[from] crate::path::NoWayHome),
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
