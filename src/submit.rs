// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Edit and submit round trip.
//!
//! Every submitting command runs the same steps:
//!
//! 1. Render the record into a draft file and open it in the editor.
//! 2. Parse the edited draft. A blank required field ends the round trip
//!    without sending anything.
//! 3. Flush the dead-letter queue so older submissions go out first. Failing
//!    to flush is reported but does not stop the new submission.
//! 4. POST the new record. If the service cannot be reached, the record is
//!    queued instead.
//! 5. Echo what the service stored, or report why it refused.
//!
//! User facing messages go to an injected writer, diagnostics go through
//! `tracing`.

use crate::{
    client::{Api, ApiResponse, Transport, TransportError},
    document::{cursor_position, DocumentError},
    editor::{Draft, Editor, EditorError},
    queue::{DeadLetterQueue, LetterMeta, QueueError},
    record::{Document, Record, Submission},
};

use indicatif::ProgressBar;
use serde_json::Value as Json;
use std::{
    env,
    io::Write,
    path::PathBuf,
};
use tracing::{info, instrument, warn};

/// How a round trip ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Service accepted record and echoed it back.
    Submitted(Json),

    /// Required field was left blank.
    Unchanged,

    /// Editor exited unsuccessfully. Draft is kept at given path.
    EditorFailed(PathBuf),

    /// Service was unreachable, record was queued under given name.
    Queued(String),

    /// Service refused record.
    Rejected(ApiResponse),
}

impl Outcome {
    /// Process exit code for this outcome.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Submitted(_) | Self::Unchanged | Self::Rejected(_) => 0,
            Self::EditorFailed(_) => 1,
            Self::Queued(_) => 2,
        }
    }
}

/// Result of the editing half of a round trip.
#[derive(Debug)]
pub enum Edit<D> {
    /// Record updated from edited draft. Draft is still on disk.
    Changed { record: D, draft: Draft },
    Unchanged,
    EditorFailed(PathBuf),
}

/// Runs round trips against one service and queue.
#[derive(Debug)]
pub struct Submitter<'a, T, E> {
    api: &'a Api<T>,
    queue: &'a DeadLetterQueue,
    editor: &'a E,
    draft_dir: PathBuf,
    show_progress: bool,
}

impl<'a, T: Transport, E: Editor> Submitter<'a, T, E> {
    pub fn new(api: &'a Api<T>, queue: &'a DeadLetterQueue, editor: &'a E) -> Self {
        Self {
            api,
            queue,
            editor,
            draft_dir: env::temp_dir(),
            show_progress: true,
        }
    }

    /// Write drafts into `dir` instead of the system temporary directory.
    pub fn with_draft_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.draft_dir = dir.into();
        self
    }

    /// Hide queue flush progress.
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Edit record and submit it.
    ///
    /// # Errors
    ///
    /// - Return [`SubmitError`] if a local step fails, e.g., the draft cannot
    ///   be written or the editor cannot be started.
    pub fn submit<R: Record>(&self, record: R, out: &mut impl Write) -> Result<Outcome> {
        match self.edit(record, out)? {
            Edit::Changed { record, draft } => self.send(record, draft, out),
            Edit::Unchanged => Ok(Outcome::Unchanged),
            Edit::EditorFailed(path) => Ok(Outcome::EditorFailed(path)),
        }
    }

    /// Let the user edit a record.
    ///
    /// # Errors
    ///
    /// - Return [`SubmitError::Document`] if record cannot be rendered.
    /// - Return [`SubmitError::Editor`] if draft cannot be managed, or the
    ///   editor cannot be started.
    #[instrument(skip_all, fields(kind = %D::KIND), level = "debug")]
    pub fn edit<D: Document>(&self, mut record: D, out: &mut impl Write) -> Result<Edit<D>> {
        let text = record.render()?;
        let draft = Draft::create_in(&self.draft_dir, &text)?;
        let line = cursor_position(&text, D::ANCHOR);

        if !self.editor.edit(draft.path(), line)? {
            warn!("editor failed, keeping draft {:?}", draft.path().display());
            return Ok(Edit::EditorFailed(draft.path().to_path_buf()));
        }

        let fields = D::schema().parse(&draft.read()?)?;
        if !fields.has_changes() {
            writeln!(out, "No changes were made to the {} field.", D::required_label())?;
            draft.discard()?;
            return Ok(Edit::Unchanged);
        }

        record.apply(&fields);
        Ok(Edit::Changed { record, draft })
    }

    /// Deliver queued letters, reporting but swallowing failure.
    ///
    /// # Errors
    ///
    /// - Return [`SubmitError::Output`] if messages cannot be written.
    pub fn flush_queue(&self, out: &mut impl Write) -> Result<()> {
        let progress = match self.show_progress {
            true => ProgressBar::new(0),
            false => ProgressBar::hidden(),
        };

        match self.queue.flush(self.api.transport(), &progress) {
            Ok(report) if !report.delivered.is_empty() => {
                info!("delivered {} queued letters", report.delivered.len());
            }
            Ok(_) => {}
            Err(err) => {
                progress.abandon();
                if let QueueError::Rejected { response, .. } = &err {
                    writeln!(out, "{}", response.describe())?;
                }
                writeln!(out, "{err}")?;
                writeln!(out, "Error: Failed to send queue")?;
            }
        }

        Ok(())
    }

    /// Send edited record.
    ///
    /// # Errors
    ///
    /// - Return [`SubmitError::Transport`] if request fails for any reason
    ///   other than the service being unreachable. The draft is kept.
    /// - Return [`SubmitError::Queue`] if record cannot be queued.
    #[instrument(skip_all, fields(kind = %R::KIND), level = "debug")]
    pub fn send<R: Record>(&self, record: R, draft: Draft, out: &mut impl Write) -> Result<Outcome> {
        self.flush_queue(out)?;

        let submission: Submission = record.into();
        let payload = Json::Object(submission.payload()?);
        let url = self.api.url(submission.endpoint());

        let response = match self.api.transport().post_json(&url, &payload) {
            Ok(response) => response,
            Err(err) if err.is_connect() => {
                warn!("{err}");
                let name = self
                    .queue
                    .enqueue(&payload, LetterMeta::new(url), submission.kind())?;
                draft.discard()?;
                writeln!(out, "Error: Connection failed.")?;
                writeln!(out, "Your update was saved at {name}.")?;
                writeln!(out, "It will be sent next time you run this program.")?;
                return Ok(Outcome::Queued(name));
            }
            Err(err) => {
                writeln!(out, "The temporary file was saved at {}", draft.path().display())?;
                return Err(err.into());
            }
        };

        if !response.is_success() {
            writeln!(out, "{}", response.describe())?;
            writeln!(out, "The temporary file was saved at {}", draft.path().display())?;
            return Ok(Outcome::Rejected(response));
        }

        let echo = response.json().unwrap_or_else(|err| {
            warn!("service echo is not JSON: {err}");
            Json::Null
        });
        writeln!(out, "{}", R::render_echo(&echo)?)?;
        writeln!(out, "{}", R::render_link(self.api.base_url(), &echo)?)?;
        draft.discard()?;

        Ok(Outcome::Submitted(echo))
    }
}

/// Submission error types.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Failed to serialize payload.
    #[error("failed to serialize payload")]
    Payload(#[from] serde_json::Error),

    /// Failed to write user facing message.
    #[error("failed to write output")]
    Output(#[from] std::io::Error),
}

/// Friendly result alias :3
type Result<T, E = SubmitError> = std::result::Result<T, E>;
