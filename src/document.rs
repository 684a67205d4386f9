// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Editable Markdown documents.
//!
//! Every submitting command follows the same round trip: render a record into
//! a Markdown __document__, let the user edit it, then parse the edited text
//! back into fields.
//!
//! # Document Layout
//!
//! A document uses two kinds of markers:
//!
//! - __Metadata lines__ of the form `> Key: value`. The value is taken as is
//!   (trimmed), and never spans more than one line.
//! - __Section headers__ of the form `# Title` or `## Title`. Every line after
//!   a header, up to the next header, belongs to that section.
//!
//! Which keys and titles are recognized is fixed by a [`Schema`], a closed
//! table of [`FieldSpec`] entries. A line starting with `#` whose title is not
//! in the schema closes the current section, and everything after it is
//! dropped until a recognized header shows up again.
//!
//! # No-change Detection
//!
//! Each schema marks at least one field as required. If that field comes back
//! empty, whitespace only, or just `?`, the user is taken to have abandoned
//! the edit. See [`not_empty`].

pub mod parser;
pub mod sanitize;

use crate::template::{render_template, TemplateError, Value};

pub use parser::DocumentParser;

/// Offset added to anchor line so the editor opens on the first content line.
const CURSOR_OFFSET: usize = 3;

/// Where a field is found within a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldSource {
    /// Metadata line `> Key: value`.
    Meta(&'static str),

    /// Section introduced by `# Title`. The title is matched as a prefix of
    /// the header text, so `# Situation (What happened?)` is the `Situation`
    /// section.
    Section(&'static str),
}

/// How a field value is cleaned before it goes on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Transform {
    /// Trim surrounding whitespace and send `\r\n` line endings.
    #[default]
    Text,

    /// Comma separated list with blank entries dropped.
    List,
}

/// Single entry in a field table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    /// Wire name of the field.
    pub name: &'static str,

    /// Marker that carries the field.
    pub source: FieldSource,

    /// Whether an empty value means "no changes were made".
    pub required: bool,

    /// Cleaning applied by [`sanitize::sanitize_payload`].
    pub transform: Transform,
}

impl FieldSpec {
    /// Field carried by metadata line.
    pub const fn meta(name: &'static str, key: &'static str) -> Self {
        Self {
            name,
            source: FieldSource::Meta(key),
            required: false,
            transform: Transform::Text,
        }
    }

    /// Field carried by section.
    pub const fn section(name: &'static str, title: &'static str) -> Self {
        Self {
            name,
            source: FieldSource::Section(title),
            required: false,
            transform: Transform::Text,
        }
    }

    /// Mark field as required.
    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    /// Treat field as comma separated list.
    pub const fn list(self) -> Self {
        Self {
            transform: Transform::List,
            ..self
        }
    }

    /// Human readable label, i.e., the metadata key or section title.
    pub const fn label(&self) -> &'static str {
        match self.source {
            FieldSource::Meta(key) => key,
            FieldSource::Section(title) => title,
        }
    }
}

/// Closed field table for one kind of document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schema {
    /// Recognized fields, in document order.
    pub fields: &'static [FieldSpec],

    /// Drop unchecked checklist lines like `- [ ]` from section bodies.
    pub skip_empty_points: bool,
}

impl Schema {
    /// Find field by wire name.
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    /// First required field.
    pub fn required_field(&self) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|spec| spec.required)
    }

    /// Parse document text into fields.
    ///
    /// # Errors
    ///
    /// - Return [`DocumentError::Pattern`] if marker patterns cannot be built
    ///   from the field table.
    pub fn parse(&'static self, text: &str) -> Result<Fields> {
        Ok(DocumentParser::new(self)?.parse(text))
    }
}

/// Value of a parsed field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

/// Parsed fields in schema order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fields {
    schema: &'static Schema,
    values: Vec<Option<FieldValue>>,
}

impl Fields {
    /// Construct empty field set for schema.
    pub fn new(schema: &'static Schema) -> Self {
        Self {
            schema,
            values: vec![None; schema.fields.len()],
        }
    }

    /// Schema these fields belong to.
    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    /// Value of field, if it was ever set.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.index_of(name)
            .and_then(|index| self.values[index].as_ref())
    }

    /// Set field value by wire name.
    ///
    /// Names outside the schema are ignored.
    pub fn set(&mut self, name: &str, value: FieldValue) {
        if let Some(index) = self.index_of(name) {
            self.values[index] = Some(value);
        }
    }

    pub(crate) fn set_at(&mut self, index: usize, value: FieldValue) {
        self.values[index] = Some(value);
    }

    /// Text value of field.
    ///
    /// List values are joined back together with `", "`.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            FieldValue::Text(text) => Some(text.clone()),
            FieldValue::List(items) => Some(items.join(", ")),
        }
    }

    /// List value of field.
    ///
    /// Text values are split like a metadata list would be.
    pub fn list(&self, name: &str) -> Option<Vec<String>> {
        match self.get(name)? {
            FieldValue::Text(text) => Some(split_list(text)),
            FieldValue::List(items) => Some(items.clone()),
        }
    }

    /// Whether the required field holds meaningful text.
    ///
    /// A schema without a required field always counts as changed.
    pub fn has_changes(&self) -> bool {
        match self.schema.required_field() {
            Some(spec) => self.text(spec.name).is_some_and(|text| not_empty(&text)),
            None => true,
        }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.schema.fields.iter().position(|spec| spec.name == name)
    }
}

/// Split comma separated list, dropping blank entries.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether text carries meaningful content.
///
/// Whitespace and a lone `?` placeholder do not count.
pub fn not_empty(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed != "?"
}

/// Render document template against context.
///
/// Leading whitespace is dropped, and the document always ends with exactly
/// one newline.
///
/// # Errors
///
/// - Return [`DocumentError::Template`] if template is malformed.
pub fn render(template: &str, context: &Value) -> Result<String> {
    let rendered = render_template(template, context)?;
    let mut document = rendered.trim_start().trim_end().to_string();
    document.push('\n');
    Ok(document)
}

/// Line to open the editor at.
///
/// Returns the 1-based line number of the first line containing `anchor`,
/// plus a fixed offset so the cursor lands on the content below the header.
/// Falls back to the offset alone when `anchor` is missing.
pub fn cursor_position(text: &str, anchor: &str) -> usize {
    text.lines()
        .position(|line| line.contains(anchor))
        .map(|index| index + 1 + CURSOR_OFFSET)
        .unwrap_or(CURSOR_OFFSET)
}

/// Document error types.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Marker pattern failed to compile.
    #[error("failed to build document marker pattern")]
    Pattern(#[from] regex::Error),

    /// Template failed to render.
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Friendly result alias :3
type Result<T, E = DocumentError> = std::result::Result<T, E>;
