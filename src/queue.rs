// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Offline dead-letter queue.
//!
//! Submissions that cannot reach the service are written to a queue
//! directory as __dead letters__, and sent again before the next submission
//! goes out.
//!
//! # Letter Files
//!
//! Each letter is a JSON file holding the payload and its delivery metadata:
//!
//! ```json
//! {"payload": {"comment": "..."}, "meta": {"url": "https://tasks.org/journal/"}}
//! ```
//!
//! Files are named `<YYYY-MM-DD_HHMMSS>_<kind>.json`. Two letters written in
//! the same second get `-1`, `-2`, and so on appended to the stem. Delivery
//! order is oldest first, ordered by stem without the suffix, then by suffix
//! number, so `…_journal.json` always goes before `…_journal-1.json`.
//!
//! Only regular `*.json` files directly inside the queue directory are
//! letters. Anything else is left alone.
//!
//! # Deletion Policy
//!
//! By default a letter is only removed once the service confirms it with a
//! 2xx response. A rejected letter stays queued and stops the pass, so later
//! letters never overtake it. The [`DeletePolicy::OnSend`] policy removes a
//! letter as soon as any response came back.

use crate::{
    client::{ApiResponse, Transport, TransportError},
    record::RecordKind,
};

use chrono::{Local, NaiveDateTime};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::{
    fs::{self, File, OpenOptions},
    io::{BufReader, BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, instrument, warn};

/// When a delivered letter is removed from the queue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeletePolicy {
    /// Remove only after a 2xx response.
    #[default]
    #[serde(rename = "success")]
    OnSuccess,

    /// Remove after any response.
    #[serde(rename = "send")]
    OnSend,
}

/// Delivery metadata stored with a letter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterMeta {
    /// Absolute endpoint URL the payload is posted to.
    pub url: String,

    #[serde(flatten)]
    pub extra: Map<String, Json>,
}

impl LetterMeta {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            extra: Map::new(),
        }
    }
}

/// On-disk letter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub payload: Json,
    pub meta: LetterMeta,
}

/// Letter waiting in the queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingLetter {
    pub name: String,
    pub path: PathBuf,
    pub kind: Option<RecordKind>,
}

/// Summary of a flush pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Letters removed from the queue, in delivery order.
    pub delivered: Vec<String>,
}

/// Queue of undelivered submissions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeadLetterQueue {
    dir: PathBuf,
    policy: DeletePolicy,
}

impl DeadLetterQueue {
    pub fn new(dir: impl Into<PathBuf>, policy: DeletePolicy) -> Self {
        Self {
            dir: dir.into(),
            policy,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write new letter stamped with the current local time.
    ///
    /// Returns the chosen file name.
    ///
    /// # Errors
    ///
    /// - Return [`QueueError::CreateDir`] if queue directory cannot be made.
    /// - Return [`QueueError::Write`] if letter cannot be written.
    pub fn enqueue(&self, payload: &Json, meta: LetterMeta, kind: RecordKind) -> Result<String> {
        self.enqueue_at(payload, meta, kind, Local::now().naive_local())
    }

    /// Write new letter stamped with `stamp`.
    ///
    /// # Errors
    ///
    /// - Return [`QueueError::CreateDir`] if queue directory cannot be made.
    /// - Return [`QueueError::Write`] if letter cannot be written.
    #[instrument(skip(self, payload, meta), level = "debug")]
    pub fn enqueue_at(
        &self,
        payload: &Json,
        meta: LetterMeta,
        kind: RecordKind,
        stamp: NaiveDateTime,
    ) -> Result<String> {
        fs::create_dir_all(&self.dir).map_err(|err| QueueError::CreateDir {
            source: err,
            path: self.dir.clone(),
        })?;

        let base = format!("{}_{}", stamp.format("%Y-%m-%d_%H%M%S"), kind);
        let (name, file) = self.create_unique(&base)?;
        let path = self.dir.join(&name);

        let letter = DeadLetter {
            payload: payload.clone(),
            meta,
        };
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &letter)
            .map_err(std::io::Error::from)
            .and_then(|_| writer.flush())
            .map_err(|err| QueueError::Write {
                source: err,
                path: path.clone(),
            })?;

        debug!("queued letter {:?}", path.display());
        Ok(name)
    }

    // INVARIANT: "create_new" fails on an existing name, so no two writers share a file.
    fn create_unique(&self, base: &str) -> Result<(String, File)> {
        let mut suffix = 0_u32;
        loop {
            let name = match suffix {
                0 => format!("{base}.json"),
                n => format!("{base}-{n}.json"),
            };
            let path = self.dir.join(&name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((name, file)),
                Err(err) if err.kind() == ErrorKind::AlreadyExists => suffix += 1,
                Err(err) => return Err(QueueError::Write { source: err, path }),
            }
        }
    }

    /// Letters waiting for delivery, oldest first.
    ///
    /// A missing queue directory is an empty queue.
    ///
    /// # Errors
    ///
    /// - Return [`QueueError::Read`] if queue directory cannot be listed.
    pub fn pending(&self) -> Result<Vec<PendingLetter>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(QueueError::Read {
                    source: err,
                    path: self.dir.clone(),
                })
            }
        };

        let mut letters = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| QueueError::Read {
                source: err,
                path: self.dir.clone(),
            })?;
            let path = entry.path();
            if !path.is_file() || path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }

            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            letters.push(PendingLetter {
                name: name.to_string(),
                kind: kind_of(name),
                path: path.clone(),
            });
        }

        letters.sort_by(|a, b| order_key(&a.name).cmp(&order_key(&b.name)));
        Ok(letters)
    }

    /// Deliver every pending letter, oldest first.
    ///
    /// Stops at the first letter that cannot be read, parsed, or sent. Letters
    /// removed before that point stay removed.
    ///
    /// # Errors
    ///
    /// - Return [`QueueError::Read`] or [`QueueError::Parse`] if a letter is
    ///   unreadable.
    /// - Return [`QueueError::Transport`] if a letter could not be sent.
    /// - Return [`QueueError::Rejected`] if service refused a letter under
    ///   [`DeletePolicy::OnSuccess`].
    /// - Return [`QueueError::Remove`] if a delivered letter cannot be removed.
    #[instrument(skip(self, transport, progress), level = "debug")]
    pub fn flush(&self, transport: &impl Transport, progress: &ProgressBar) -> Result<FlushReport> {
        let pending = self.pending()?;
        let mut report = FlushReport::default();
        if pending.is_empty() {
            return Ok(report);
        }

        let style = ProgressStyle::with_template(
            "{elapsed_precise:.green}  {msg:<50}  [{wide_bar:.yellow/blue}] {pos}/{len}",
        )?
        .progress_chars("#>-");
        progress.set_style(style);
        progress.set_length(pending.len() as u64);
        for letter in pending {
            progress.set_message(format!("Sending {}", letter.name));
            let content = read_letter(&letter.path)?;
            let response = transport
                .post_json(&content.meta.url, &content.payload)
                .map_err(|err| QueueError::Transport {
                    source: err,
                    name: letter.name.clone(),
                })?;

            if !response.is_success() {
                match self.policy {
                    DeletePolicy::OnSuccess => {
                        return Err(QueueError::Rejected {
                            name: letter.name,
                            response,
                        })
                    }
                    DeletePolicy::OnSend => {
                        warn!("dropping {} rejected with HTTP {}", letter.name, response.status)
                    }
                }
            }

            fs::remove_file(&letter.path).map_err(|err| QueueError::Remove {
                source: err,
                path: letter.path.clone(),
            })?;
            progress.inc(1);
            report.delivered.push(letter.name);
        }
        progress.finish_and_clear();

        Ok(report)
    }
}

fn read_letter(path: &Path) -> Result<DeadLetter> {
    let file = File::open(path).map_err(|err| QueueError::Read {
        source: err,
        path: path.to_path_buf(),
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|err| QueueError::Parse {
        source: err,
        path: path.to_path_buf(),
    })
}

// Split "<stamp>_<kind>[-N].json" into ("<stamp>_<kind>", N).
fn order_key(name: &str) -> (&str, u32) {
    let stem = name.strip_suffix(".json").unwrap_or(name);
    stem.rsplit_once('-')
        .and_then(|(base, suffix)| {
            let number = suffix
                .bytes()
                .all(|byte| byte.is_ascii_digit())
                .then(|| suffix.parse::<u32>().ok())
                .flatten()?;
            Some((base, number))
        })
        .unwrap_or((stem, 0))
}

fn kind_of(name: &str) -> Option<RecordKind> {
    let (base, _) = order_key(name);
    let (_, kind) = base.rsplit_once('_')?;
    kind.parse().ok()
}

/// Queue error types.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// Failed to create queue directory.
    #[error("failed to create queue directory {:?}", path.display())]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to write letter.
    #[error("failed to write dead letter {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to read queue directory or letter.
    #[error("failed to read {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Letter is not valid JSON of expected shape.
    #[error("malformed dead letter {:?}", path.display())]
    Parse {
        #[source]
        source: serde_json::Error,
        path: PathBuf,
    },

    /// Letter could not be sent.
    #[error("failed to send dead letter {name}")]
    Transport {
        #[source]
        source: TransportError,
        name: String,
    },

    /// Service refused letter, so it stays queued.
    #[error("dead letter {name} rejected with HTTP {}", response.status)]
    Rejected { name: String, response: ApiResponse },

    #[error(transparent)]
    IndicatifStyleTemplate(#[from] indicatif::style::TemplateError),

    /// Failed to remove delivered letter.
    #[error("failed to remove delivered dead letter {:?}", path.display())]
    Remove {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
type Result<T, E = QueueError> = std::result::Result<T, E>;
