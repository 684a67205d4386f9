// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{
    document::{FieldSpec, Fields, Schema},
    record::{Document, Record, RecordKind},
    template::Value,
};

use serde::{Deserialize, Serialize};

static SCHEMA: Schema = Schema {
    fields: &[
        FieldSpec::meta("pub_date", "Date"),
        FieldSpec::meta("thread", "Thread"),
        FieldSpec::meta("type", "Type"),
        FieldSpec::section("situation", "Situation").required(),
        FieldSpec::section("interpretation", "Interpretation"),
        FieldSpec::section("approach", "Approach"),
    ],
    skip_empty_points: false,
};

/// Observation of something that happened, how it felt, and what to do
/// about it next time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub pub_date: String,
    pub thread: String,

    #[serde(rename = "type")]
    pub kind: String,

    pub situation: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpretation: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub approach: Option<String>,
}

impl Observation {
    pub fn new(
        pub_date: impl Into<String>,
        thread: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            pub_date: pub_date.into(),
            thread: thread.into(),
            kind: kind.into(),
            ..Self::default()
        }
    }
}

impl Document for Observation {
    const KIND: RecordKind = RecordKind::Observation;
    const ANCHOR: &'static str = "# Situation";
    const TEMPLATE: &'static str = "\
> Date: {{ pub_date }}
> Thread: {{ thread }}
> Type: {{ type }}

# Situation (What happened?)

{{ situation }}

# Interpretation (How you saw it, what you felt?)

{{ interpretation }}

# Approach (How should you approach it in the future?)

{{ approach }}
";

    fn schema() -> &'static Schema {
        &SCHEMA
    }

    fn context(&self) -> Value {
        Value::map([
            ("pub_date", Value::from(self.pub_date.as_str())),
            ("thread", Value::from(self.thread.as_str())),
            ("type", Value::from(self.kind.as_str())),
            ("situation", Value::from(self.situation.clone())),
            ("interpretation", Value::from(self.interpretation.clone())),
            ("approach", Value::from(self.approach.clone())),
        ])
    }

    fn apply(&mut self, fields: &Fields) {
        if let Some(pub_date) = fields.text("pub_date") {
            self.pub_date = pub_date;
        }
        if let Some(thread) = fields.text("thread") {
            self.thread = thread;
        }
        if let Some(kind) = fields.text("type") {
            self.kind = kind;
        }
        self.situation = fields.text("situation");
        self.interpretation = fields.text("interpretation");
        self.approach = fields.text("approach");
    }
}

impl Record for Observation {
    const ENDPOINT: &'static str = "observation-api/";
    const LINK: &'static str = "See more:\n- {{ url }}/observations/{{ echo.id }}/";
}
