// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Command-line clients for the Tasks Collector journaling service.
//!
//! Tcollect lets a user write journal entries, observations, updates to
//! observations, and reflections in their editor, then posts them to a Tasks
//! Collector instance. Each record is rendered into a Markdown-like draft,
//! edited, parsed back into fields, and sent as JSON.
//!
//! # Offline Use
//!
//! Submissions that cannot reach the service are written to a dead-letter
//! queue on disk. Every later submission flushes that queue first, so records
//! reach the service in the order they were written.
//!
//! # Layout
//!
//! - [`record`] defines the records and their draft templates.
//! - [`document`] parses edited drafts back into fields.
//! - [`submit`] runs the edit and submit round trip.
//! - [`queue`] holds the dead-letter queue.
//! - [`client`] talks to the service.
//! - [`commands`] and [`shell`] are what the binary exposes.

pub mod client;
pub mod commands;
pub mod config;
pub mod digest;
pub mod document;
pub mod editor;
pub mod path;
pub mod queue;
pub mod record;
pub mod session;
pub mod shell;
pub mod submit;
pub mod template;
