// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External editor sessions.

use std::{
    env,
    ffi::OsString,
    fs,
    io::Write,
    path::{Path, PathBuf},
    process::Command,
};
use tracing::{debug, instrument};

/// Editor used when `$EDITOR` is unset or blank.
pub const DEFAULT_EDITOR: &str = "vim";

/// Opens a file for the user to edit.
pub trait Editor {
    /// Edit file at `path` with the cursor placed on `line`.
    ///
    /// Returns `Ok(true)` if the editor exited successfully.
    ///
    /// # Errors
    ///
    /// - Return [`EditorError::Spawn`] if editor cannot be started.
    fn edit(&self, path: &Path, line: usize) -> Result<bool>;
}

/// Editor program run as a child process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalEditor {
    program: String,
    args: Vec<String>,
}

impl ExternalEditor {
    /// Construct editor from command line, split on whitespace.
    ///
    /// A blank command line falls back to [`DEFAULT_EDITOR`].
    pub fn new(command: &str) -> Self {
        let mut words = command.split_whitespace().map(str::to_string);
        match words.next() {
            Some(program) => Self {
                program,
                args: words.collect(),
            },
            None => Self {
                program: DEFAULT_EDITOR.into(),
                args: Vec::new(),
            },
        }
    }

    /// Construct editor from `$EDITOR`.
    pub fn from_env() -> Self {
        Self::new(&env::var("EDITOR").unwrap_or_default())
    }

    /// Full argument vector for editing `path` at `line`.
    pub fn command_line(&self, path: &Path, line: usize) -> Vec<OsString> {
        let mut argv = vec![OsString::from(&self.program)];
        argv.extend(self.args.iter().map(OsString::from));
        argv.push(OsString::from(format!("+{line}")));
        argv.push(path.as_os_str().to_os_string());
        argv
    }
}

impl Editor for ExternalEditor {
    #[instrument(skip(self), level = "debug")]
    fn edit(&self, path: &Path, line: usize) -> Result<bool> {
        debug!("running {:?}", self.command_line(path, line));
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(format!("+{line}"))
            .arg(path)
            .status()
            .map_err(|err| EditorError::Spawn {
                source: err,
                program: self.program.clone(),
            })?;
        debug!("{} exited with {status}", self.program);

        Ok(status.success())
    }
}

/// Document written to a temporary Markdown file.
///
/// The file is kept on disk until [`Draft::discard`] is called, so a failed
/// submission leaves the user's text behind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Draft {
    path: PathBuf,
}

impl Draft {
    /// Write `text` to a new draft inside `dir`.
    ///
    /// # Errors
    ///
    /// - Return [`EditorError::Draft`] if file cannot be created or written.
    pub fn create_in(dir: impl AsRef<Path>, text: &str) -> Result<Self> {
        let dir = dir.as_ref();
        let draft_error = |err| EditorError::Draft {
            source: err,
            path: dir.to_path_buf(),
        };

        let mut file = tempfile::Builder::new()
            .prefix("tcollect-")
            .suffix(".md")
            .tempfile_in(dir)
            .map_err(draft_error)?;
        file.write_all(text.as_bytes()).map_err(draft_error)?;
        let (_, path) = file.keep().map_err(|err| draft_error(err.error))?;

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current draft text.
    ///
    /// # Errors
    ///
    /// - Return [`EditorError::Draft`] if file cannot be read.
    pub fn read(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|err| EditorError::Draft {
            source: err,
            path: self.path.clone(),
        })
    }

    /// Remove draft from disk.
    ///
    /// # Errors
    ///
    /// - Return [`EditorError::Draft`] if file cannot be removed.
    pub fn discard(self) -> Result<()> {
        fs::remove_file(&self.path).map_err(|err| EditorError::Draft {
            source: err,
            path: self.path.clone(),
        })
    }
}

/// Editor error types.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// Failed to start editor.
    #[error("failed to run editor {program:?}")]
    Spawn {
        #[source]
        source: std::io::Error,
        program: String,
    },

    /// Failed to manage draft file.
    #[error("failed to access draft {:?}", path.display())]
    Draft {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
type Result<T, E = EditorError> = std::result::Result<T, E>;
