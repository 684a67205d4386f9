// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Journal entries.

use crate::{
    document::{FieldSpec, Fields, Schema},
    record::{Document, Record, RecordKind},
    template::Value,
};

use serde::{Deserialize, Serialize};

static SCHEMA: Schema = Schema {
    fields: &[
        FieldSpec::meta("thread", "Thread"),
        FieldSpec::meta("published", "Published"),
        FieldSpec::meta("tags", "Tags").list(),
        FieldSpec::section("comment", "Comment").required(),
    ],
    skip_empty_points: false,
};

/// Journal entry.
///
/// Quick notes and today's plan are shown while editing as a reminder, but
/// they sit outside any recognized section and are never submitted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub comment: Option<String>,
    pub thread: String,
    pub published: String,
    pub tags: Vec<String>,

    /// Entry was written through a reflection.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub reflection: bool,

    #[serde(skip)]
    pub notes: String,

    #[serde(skip)]
    pub plan: Option<String>,
}

impl JournalEntry {
    /// Construct empty entry for thread.
    pub fn new(thread: impl Into<String>, published: impl Into<String>) -> Self {
        Self {
            thread: thread.into(),
            published: published.into(),
            ..Self::default()
        }
    }
}

impl Document for JournalEntry {
    const KIND: RecordKind = RecordKind::Journal;
    const ANCHOR: &'static str = "# Comment";
    const TEMPLATE: &'static str = "\
> Thread: {{ thread }}
> Published: {{ published }}
> Tags: {{ tags }}
{% if notes %}
{{ notes }}
{% endif %}
{% if plan %}

# Daily Plan
{{ plan }}
{% endif %}

# Comment

{{ comment }}
";

    fn schema() -> &'static Schema {
        &SCHEMA
    }

    fn context(&self) -> Value {
        Value::map([
            ("thread", Value::from(self.thread.as_str())),
            ("published", Value::from(self.published.as_str())),
            ("tags", Value::from(self.tags.clone())),
            ("notes", Value::from(self.notes.as_str())),
            ("plan", Value::from(self.plan.clone())),
            ("comment", Value::from(self.comment.clone())),
        ])
    }

    fn apply(&mut self, fields: &Fields) {
        self.comment = fields.text("comment");
        if let Some(thread) = fields.text("thread") {
            self.thread = thread;
        }
        if let Some(published) = fields.text("published") {
            self.published = published;
        }
        if let Some(tags) = fields.list("tags") {
            self.tags = tags;
        }
    }
}

impl Record for JournalEntry {
    const ENDPOINT: &'static str = "journal/";
    const LINK: &'static str = "See more:\n- {{ url }}/";
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn entry() -> JournalEntry {
        JournalEntry {
            comment: Some("Ran 5k.\nFelt good.".into()),
            thread: "Daily".into(),
            published: "2024-05-01 21:15:00".into(),
            tags: vec!["running".into(), "health".into()],
            ..JournalEntry::default()
        }
    }

    #[test]
    fn render_entry() -> anyhow::Result<()> {
        let mut entry = entry();
        entry.notes = "- call mom".into();
        entry.plan = Some("Focus:\n- ship".into());

        let expect = indoc! {"
            > Thread: Daily
            > Published: 2024-05-01 21:15:00
            > Tags: running, health
            - call mom

            # Daily Plan
            Focus:
            - ship

            # Comment

            Ran 5k.
            Felt good.
        "};
        assert_eq!(entry.render()?, expect);

        Ok(())
    }

    #[test]
    fn round_trip_keeps_fields() -> anyhow::Result<()> {
        let mut original = entry();
        original.notes = "- stray note".into();
        original.plan = Some("Want:\n- rest".into());
        let document = original.render()?;

        let mut parsed = JournalEntry::new("Other", "never");
        parsed.apply(&JournalEntry::schema().parse(&document)?);

        assert_eq!(parsed.comment, original.comment);
        assert_eq!(parsed.thread, original.thread);
        assert_eq!(parsed.published, original.published);
        assert_eq!(parsed.tags, original.tags);

        Ok(())
    }

    #[test]
    fn tags_metadata_is_list() -> anyhow::Result<()> {
        let fields = JournalEntry::schema().parse("> Tags: a, b, c\n# Comment\nx\n")?;
        let mut entry = JournalEntry::default();
        entry.apply(&fields);
        assert_eq!(entry.tags, vec!["a", "b", "c"]);

        Ok(())
    }

    #[test]
    fn payload_is_sanitized() -> anyhow::Result<()> {
        let mut entry = entry();
        entry.comment = Some("  line one\nline two \n".into());
        entry.tags = vec![" a ".into(), "".into()];
        let payload = serde_json::Value::Object(entry.payload()?);

        let expect = json!({
            "comment": "line one\r\nline two",
            "thread": "Daily",
            "published": "2024-05-01 21:15:00",
            "tags": ["a"],
        });
        assert_eq!(payload, expect);

        Ok(())
    }

    #[test]
    fn reflection_flag_is_sent_when_set() -> anyhow::Result<()> {
        let mut entry = entry();
        entry.reflection = true;
        assert_eq!(entry.payload()?.get("reflection"), Some(&json!(true)));

        Ok(())
    }

    #[test]
    fn echo_and_link() -> anyhow::Result<()> {
        let echo = json!({
            "id": 7,
            "comment": "Ran 5k.",
            "thread": "Daily",
            "published": "2024-05-01T21:15:00Z",
            "tags": ["running"],
        });
        let expect = indoc! {"
            > Thread: Daily
            > Published: 2024-05-01T21:15:00Z
            > Tags: running

            # Comment

            Ran 5k.
        "};
        assert_eq!(JournalEntry::render_echo(&echo)?, expect);
        assert_eq!(
            JournalEntry::render_link("https://tasks.org", &echo)?,
            "See more:\n- https://tasks.org/"
        );

        Ok(())
    }
}
