// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Line oriented document parser.
//!
//! The parser walks a document once, keeping track of the section it is in
//! and the raw lines collected for it so far. It only ever sits in one of two
//! states: outside any section, or inside a named section.
//!
//! | Line kind           | Effect                                            |
//! |---------------------|---------------------------------------------------|
//! | metadata line       | field set directly, state unchanged               |
//! | recognized header   | pending section flushed, new section opened       |
//! | unrecognized header | pending section flushed, state back to no section |
//! | anything else       | kept if a section is open, ignored otherwise      |
//!
//! The pending section is flushed once more at the end of the document.

use crate::document::{split_list, FieldSource, FieldValue, Fields, Schema, Transform};

use regex::Regex;
use tracing::debug;

/// Compiled marker patterns for a schema.
#[derive(Clone, Debug)]
pub struct DocumentParser {
    schema: &'static Schema,
    meta: Option<Regex>,
    header: Option<Regex>,
    empty_point: Regex,
}

impl DocumentParser {
    /// Compile marker patterns from schema field table.
    ///
    /// # Errors
    ///
    /// - Return [`regex::Error`] if a pattern fails to compile.
    pub fn new(schema: &'static Schema) -> Result<Self, regex::Error> {
        let keys = alternation(schema, |source| match source {
            FieldSource::Meta(key) => Some(key),
            FieldSource::Section(_) => None,
        });
        let titles = alternation(schema, |source| match source {
            FieldSource::Section(title) => Some(title),
            FieldSource::Meta(_) => None,
        });

        let meta = keys
            .map(|keys| Regex::new(&format!(r"^> ({keys}): (.*)$")))
            .transpose()?;
        let header = titles
            .map(|titles| Regex::new(&format!(r"^##? ({titles})")))
            .transpose()?;
        let empty_point = Regex::new(r"^\s*-\s*\[\s+\]\s*")?;

        Ok(Self {
            schema,
            meta,
            header,
            empty_point,
        })
    }

    /// Parse document into fields.
    pub fn parse(&self, text: &str) -> Fields {
        let mut fields = Fields::new(self.schema);
        let mut current: Option<usize> = None;
        let mut stack = String::new();

        for line in text.split_inclusive('\n') {
            let bare = line.trim_end_matches(['\n', '\r']);

            if let Some((index, value)) = self.match_meta(bare) {
                fields.set_at(index, value);
                continue;
            }

            if let Some(index) = self.match_header(bare) {
                if let Some(open) = current {
                    self.flush(&mut fields, open, &stack);
                }
                current = Some(index);
                stack.clear();
                continue;
            }

            if bare.trim_start().starts_with('#') {
                // INVARIANT: Unknown header closes the section, text after it is dropped.
                if let Some(open) = current.take() {
                    debug!("unrecognized header {bare:?} closes section");
                    self.flush(&mut fields, open, &stack);
                }
                stack.clear();
                continue;
            }

            if current.is_none() {
                continue;
            }

            if self.schema.skip_empty_points && self.empty_point.is_match(bare) {
                continue;
            }

            stack.push_str(line);
        }

        if let Some(open) = current {
            self.flush(&mut fields, open, &stack);
        }

        fields
    }

    fn match_meta(&self, line: &str) -> Option<(usize, FieldValue)> {
        let captures = self.meta.as_ref()?.captures(line)?;
        let key = captures.get(1)?.as_str();
        let value = captures.get(2)?.as_str().trim();
        let index = self
            .schema
            .fields
            .iter()
            .position(|spec| matches!(spec.source, FieldSource::Meta(name) if name == key))?;

        Some((index, to_value(self.schema.fields[index].transform, value)))
    }

    fn match_header(&self, line: &str) -> Option<usize> {
        let captures = self.header.as_ref()?.captures(line)?;
        let title = captures.get(1)?.as_str();
        self.schema
            .fields
            .iter()
            .position(|spec| matches!(spec.source, FieldSource::Section(name) if name == title))
    }

    fn flush(&self, fields: &mut Fields, index: usize, stack: &str) {
        let transform = self.schema.fields[index].transform;
        fields.set_at(index, to_value(transform, stack.trim()));
    }
}

fn to_value(transform: Transform, text: &str) -> FieldValue {
    match transform {
        Transform::List => FieldValue::List(split_list(text)),
        Transform::Text => FieldValue::Text(text.to_string()),
    }
}

// INVARIANT: Longer alternatives first, so "Comment" never shadows "Comments".
fn alternation(
    schema: &Schema,
    select: impl Fn(FieldSource) -> Option<&'static str>,
) -> Option<String> {
    let mut names = schema
        .fields
        .iter()
        .filter_map(|spec| select(spec.source))
        .collect::<Vec<_>>();
    if names.is_empty() {
        return None;
    }

    names.sort_by_key(|name| std::cmp::Reverse(name.len()));
    Some(
        names
            .into_iter()
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("|"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FieldSpec;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    static OBSERVATION: Schema = Schema {
        fields: &[
            FieldSpec::meta("pub_date", "Date"),
            FieldSpec::meta("thread", "Thread"),
            FieldSpec::meta("tags", "Tags").list(),
            FieldSpec::section("situation", "Situation").required(),
            FieldSpec::section("interpretation", "Interpretation"),
            FieldSpec::section("approach", "Approach"),
        ],
        skip_empty_points: false,
    };

    static REFLECTION: Schema = Schema {
        fields: &[
            FieldSpec::section("good", "Reflection").required(),
            FieldSpec::section("better", "Better"),
            FieldSpec::section("best", "Best"),
        ],
        skip_empty_points: true,
    };

    fn text(value: &str) -> Option<FieldValue> {
        Some(FieldValue::Text(value.into()))
    }

    #[test]
    fn parse_metadata_and_sections() -> anyhow::Result<()> {
        let document = indoc! {"
            > Date: 2024-05-01
            > Thread: big-picture
            > Tags: a, b, c

            # Situation (What happened?)

            Missed the train.
            Walked instead.

            # Interpretation (How you saw it, what you felt?)

            # Approach (How should you approach it in the future?)

            Leave earlier.
        "};
        let fields = OBSERVATION.parse(document)?;

        assert_eq!(fields.get("pub_date").cloned(), text("2024-05-01"));
        assert_eq!(fields.get("thread").cloned(), text("big-picture"));
        assert_eq!(
            fields.get("tags").cloned(),
            Some(FieldValue::List(vec!["a".into(), "b".into(), "c".into()]))
        );
        assert_eq!(
            fields.get("situation").cloned(),
            text("Missed the train.\nWalked instead.")
        );
        assert_eq!(fields.get("interpretation").cloned(), text(""));
        assert_eq!(fields.get("approach").cloned(), text("Leave earlier."));

        Ok(())
    }

    #[test]
    fn untouched_sections_stay_unset() -> anyhow::Result<()> {
        let fields = OBSERVATION.parse("> Thread: Daily\n")?;
        assert_eq!(fields.get("situation"), None);
        assert!(!fields.has_changes());

        Ok(())
    }

    #[test]
    fn metadata_inside_section_is_not_body() -> anyhow::Result<()> {
        let document = indoc! {"
            # Situation
            first
            > Thread: moved
            second
        "};
        let fields = OBSERVATION.parse(document)?;
        assert_eq!(fields.get("thread").cloned(), text("moved"));
        assert_eq!(fields.get("situation").cloned(), text("first\nsecond"));

        Ok(())
    }

    #[test]
    fn unknown_header_closes_section() -> anyhow::Result<()> {
        let document = indoc! {"
            ## Reflection
            - [x] shipped the thing
            - [ ]
            # Notes from the day
            dropped because no section is open
            ## Better
            - sleep more
            ### Best
            dropped as well
        "};
        let fields = REFLECTION.parse(document)?;
        assert_eq!(fields.get("good").cloned(), text("- [x] shipped the thing"));
        assert_eq!(fields.get("better").cloned(), text("- sleep more"));
        assert_eq!(fields.get("best"), None);

        Ok(())
    }

    #[test]
    fn lines_before_any_section_are_ignored() -> anyhow::Result<()> {
        let document = indoc! {"
            - quick note
              continued

            # Situation

            it happened
        "};
        let fields = OBSERVATION.parse(document)?;
        assert_eq!(fields.get("situation").cloned(), text("it happened"));

        Ok(())
    }

    #[test]
    fn crlf_documents() -> anyhow::Result<()> {
        let fields = OBSERVATION.parse("> Thread: Daily\r\n# Situation\r\nline one\r\nline two\r\n")?;
        assert_eq!(fields.get("thread").cloned(), text("Daily"));
        assert_eq!(
            fields.get("situation").cloned(),
            text("line one\r\nline two")
        );

        Ok(())
    }
}
