// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Submission records.
//!
//! Each command edits one kind of record. A record knows three things about
//! itself: the field table used to parse its document, the template used to
//! render it, and (if it is sent anywhere) the endpoint that receives it.
//!
//! # Record Kinds
//!
//! | Kind          | Document sections                    | Endpoint            |
//! |---------------|--------------------------------------|---------------------|
//! | `journal`     | Comment                              | `/journal/`         |
//! | `observation` | Situation, Interpretation, Approach  | `/observation-api/` |
//! | `update`      | Comment                              | `/updates/`         |
//! | `reflection`  | Reflection, Better, Best             | none, see below     |
//!
//! Reflections are never sent on their own. They are folded into a journal
//! entry that goes through the journal round trip.

pub mod journal;
pub mod observation;
pub mod reflection;
pub mod update;

pub use journal::JournalEntry;
pub use observation::Observation;
pub use reflection::{Reflection, ReflectionPeriod};
pub use update::ObservationUpdate;

use crate::{
    document::{render, sanitize::sanitize_payload, DocumentError, Fields, Schema},
    template::{render_template, Value},
};

use serde::Serialize;
use serde_json::{Map, Value as Json};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

/// Closed set of record kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Journal,
    Observation,
    Update,
    Reflection,
}

impl RecordKind {
    /// Name used in queue file names.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Journal => "journal",
            Self::Observation => "observation",
            Self::Update => "update",
            Self::Reflection => "reflection",
        }
    }
}

impl Display for RecordKind {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = UnknownKind;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "journal" => Ok(Self::Journal),
            "observation" => Ok(Self::Observation),
            "update" => Ok(Self::Update),
            "reflection" => Ok(Self::Reflection),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

/// Record ready to be sent, one variant per submitting command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    Journal(JournalEntry),
    Observation(Observation),
    Update(ObservationUpdate),
}

impl Submission {
    /// Kind of wrapped record.
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::Journal(_) => RecordKind::Journal,
            Self::Observation(_) => RecordKind::Observation,
            Self::Update(_) => RecordKind::Update,
        }
    }

    /// Endpoint path below base URL.
    pub const fn endpoint(&self) -> &'static str {
        match self {
            Self::Journal(_) => JournalEntry::ENDPOINT,
            Self::Observation(_) => Observation::ENDPOINT,
            Self::Update(_) => ObservationUpdate::ENDPOINT,
        }
    }

    /// Sanitized JSON body of wrapped record.
    ///
    /// # Errors
    ///
    /// - Return [`serde_json::Error`] if record cannot be serialized.
    pub fn payload(&self) -> Result<Map<String, Json>, serde_json::Error> {
        match self {
            Self::Journal(record) => record.payload(),
            Self::Observation(record) => record.payload(),
            Self::Update(record) => record.payload(),
        }
    }
}

impl From<JournalEntry> for Submission {
    fn from(record: JournalEntry) -> Self {
        Self::Journal(record)
    }
}

impl From<Observation> for Submission {
    fn from(record: Observation) -> Self {
        Self::Observation(record)
    }
}

impl From<ObservationUpdate> for Submission {
    fn from(record: ObservationUpdate) -> Self {
        Self::Update(record)
    }
}

/// Unknown record kind name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown record kind {0:?}")]
pub struct UnknownKind(pub String);

/// Editable document backed by a field table.
pub trait Document: Sized {
    /// Kind of record.
    const KIND: RecordKind;

    /// Template rendered for editing.
    const TEMPLATE: &'static str;

    /// Line the editor cursor is placed relative to.
    const ANCHOR: &'static str;

    /// Field table used to parse edited text.
    fn schema() -> &'static Schema;

    /// Template context for this record.
    fn context(&self) -> Value;

    /// Overwrite record with fields parsed from an edited document.
    fn apply(&mut self, fields: &Fields);

    /// Render editable document.
    ///
    /// # Errors
    ///
    /// - Return [`DocumentError::Template`] if template is malformed.
    fn render(&self) -> Result<String, DocumentError> {
        render(Self::TEMPLATE, &self.context())
    }

    /// Label of required field, used in "no changes" notices.
    fn required_label() -> &'static str {
        Self::schema()
            .required_field()
            .map(|spec| spec.label())
            .unwrap_or("required")
    }
}

/// Document that is submitted to the service.
pub trait Record: Document + Serialize + Into<Submission> {
    /// Endpoint path below base URL, with trailing slash.
    const ENDPOINT: &'static str;

    /// Link printed after successful submission. Rendered with `url` and
    /// `echo` (the server response) in context.
    const LINK: &'static str;

    /// Sanitized JSON body for the service.
    ///
    /// # Errors
    ///
    /// - Return [`serde_json::Error`] if record cannot be serialized.
    fn payload(&self) -> Result<Map<String, Json>, serde_json::Error> {
        let mut payload = match serde_json::to_value(self)? {
            Json::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".into(), other);
                map
            }
        };
        sanitize_payload(&mut payload, Self::schema());
        Ok(payload)
    }

    /// Render server echo with the editing template.
    ///
    /// # Errors
    ///
    /// - Return [`DocumentError::Template`] if template is malformed.
    fn render_echo(echo: &Json) -> Result<String, DocumentError> {
        render(Self::TEMPLATE, &Value::from(echo.clone()))
    }

    /// Render "see more" link for server echo.
    ///
    /// # Errors
    ///
    /// - Return [`DocumentError::Template`] if template is malformed.
    fn render_link(base_url: &str, echo: &Json) -> Result<String, DocumentError> {
        let context = Value::map([
            ("url", Value::from(base_url)),
            ("echo", Value::from(echo.clone())),
        ]);
        Ok(render_template(Self::LINK, &context)?.trim().to_string())
    }
}
