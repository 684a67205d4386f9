// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{
    document::{FieldSpec, Fields, Schema},
    record::{Document, Record, RecordKind},
    template::Value,
};

use serde::{Deserialize, Serialize};

static SCHEMA: Schema = Schema {
    fields: &[FieldSpec::section("comment", "Comment").required()],
    skip_empty_points: false,
};

/// Follow-up comment on an existing observation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationUpdate {
    pub comment: Option<String>,
    pub observation: u64,

    /// Shown in the comment header only. The service stamps its own time.
    #[serde(skip)]
    pub published: String,
}

impl ObservationUpdate {
    pub fn new(observation: u64, published: impl Into<String>) -> Self {
        Self {
            observation,
            published: published.into(),
            ..Self::default()
        }
    }
}

impl Document for ObservationUpdate {
    const KIND: RecordKind = RecordKind::Update;
    const ANCHOR: &'static str = "# Comment";
    const TEMPLATE: &'static str = "\
# Comment ({{ published }})

{{ comment }}
";

    fn schema() -> &'static Schema {
        &SCHEMA
    }

    fn context(&self) -> Value {
        Value::map([
            ("published", Value::from(self.published.as_str())),
            ("comment", Value::from(self.comment.clone())),
        ])
    }

    fn apply(&mut self, fields: &Fields) {
        self.comment = fields.text("comment");
    }
}

impl Record for ObservationUpdate {
    const ENDPOINT: &'static str = "updates/";
    const LINK: &'static str = "See more:\n- {{ url }}/observations/{{ echo.observation }}/";
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn render_and_parse() -> anyhow::Result<()> {
        let mut update = ObservationUpdate::new(9, "2024-05-01 10:00");
        assert_eq!(update.render()?, "# Comment (2024-05-01 10:00)\n");

        let fields = ObservationUpdate::schema().parse("# Comment (whenever)\n\nBetter now.\n")?;
        update.apply(&fields);
        assert_eq!(update.comment.as_deref(), Some("Better now."));

        Ok(())
    }

    #[test]
    fn payload_carries_observation_id_only() -> anyhow::Result<()> {
        let mut update = ObservationUpdate::new(9, "2024-05-01 10:00");
        update.comment = Some("ok".into());
        let payload = serde_json::Value::Object(update.payload()?);
        assert_eq!(payload, json!({"comment": "ok", "observation": 9}));

        Ok(())
    }

    #[test]
    fn link_uses_echoed_observation() -> anyhow::Result<()> {
        let echo = json!({"id": 1, "observation": 9, "comment": "ok"});
        assert_eq!(
            ObservationUpdate::render_link("https://tasks.org", &echo)?,
            "See more:\n- https://tasks.org/observations/9/"
        );

        Ok(())
    }
}
