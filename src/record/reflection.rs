// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Reflections over a day, week, or month.
//!
//! A reflection is written as three checklists: what went well, what could
//! be better, and what would be best. Blank checklist points left over from
//! the template are dropped while parsing. The result is never sent as is,
//! instead it becomes the comment of a journal entry flagged as a reflection.
//!
//! A draft may carry a [`ReflectionDigest`] of the period below the
//! checklists. Its headings close the last checklist, so nothing in it is
//! ever sent.

use crate::{
    digest::ReflectionDigest,
    document::{FieldSpec, Fields, Schema},
    record::{Document, JournalEntry, RecordKind},
    template::Value,
};

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime};

static SCHEMA: Schema = Schema {
    fields: &[
        FieldSpec::section("good", "Reflection").required(),
        FieldSpec::section("better", "Better"),
        FieldSpec::section("best", "Best"),
    ],
    skip_empty_points: true,
};

/// Reflection checklists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reflection {
    /// Human readable span being reflected on, e.g., `2024-05-01`.
    pub period: String,
    pub good: Option<String>,
    pub better: Option<String>,
    pub best: Option<String>,

    /// Digest shown below the checklists, never parsed back.
    pub summary: Option<String>,
}

impl Reflection {
    pub fn new(period: impl Into<String>) -> Self {
        Self {
            period: period.into(),
            ..Self::default()
        }
    }

    /// Prefill checklists and summary from digest of the period.
    pub fn with_digest(self, digest: ReflectionDigest) -> Self {
        let filled = |text: String| (!text.is_empty()).then_some(text);
        Self {
            good: filled(digest.good),
            better: filled(digest.better),
            best: filled(digest.best),
            summary: filled(digest.summary),
            ..self
        }
    }

    /// Fold checklists into a journal entry.
    ///
    /// Sections are joined with one blank line between them, and any run of
    /// blank lines left by empty sections collapses into a single one.
    pub fn into_journal(
        self,
        thread: impl Into<String>,
        published: impl Into<String>,
    ) -> JournalEntry {
        let joined = [self.good, self.better, self.best]
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect::<Vec<_>>()
            .join("\n\n");

        JournalEntry {
            comment: Some(collapse_blank_lines(joined.trim())),
            reflection: true,
            ..JournalEntry::new(thread, published)
        }
    }
}

impl Document for Reflection {
    const KIND: RecordKind = RecordKind::Reflection;
    const ANCHOR: &'static str = "# Reflection";
    const TEMPLATE: &'static str = "\
# Reflection{% if period %} ({{ period }}){% endif %}

{% if good %}
{{ good }}
{% else %}
- [ ]
{% endif %}

## Better

{% if better %}
{{ better }}
{% else %}
- [ ]
{% endif %}

## Best

{% if best %}
{{ best }}
{% else %}
- [ ]
{% endif %}
{% if summary %}

{{ summary }}
{% endif %}
";

    fn schema() -> &'static Schema {
        &SCHEMA
    }

    fn context(&self) -> Value {
        Value::map([
            ("period", Value::from(self.period.as_str())),
            ("good", Value::from(self.good.clone())),
            ("better", Value::from(self.better.clone())),
            ("best", Value::from(self.best.clone())),
            ("summary", Value::from(self.summary.clone())),
        ])
    }

    fn apply(&mut self, fields: &Fields) {
        self.good = fields.text("good");
        self.better = fields.text("better");
        self.best = fields.text("best");
    }
}

/// Span of time a reflection covers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReflectionPeriod {
    #[default]
    Day,
    Yesterday,

    /// Monday through Sunday.
    Week,
    Month,
}

impl ReflectionPeriod {
    /// First and last day of the period containing `day`.
    pub fn range(&self, day: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            Self::Day => (day, day),
            Self::Yesterday => {
                let yesterday = day.pred_opt().unwrap_or(day);
                (yesterday, yesterday)
            }
            Self::Week => {
                let offset = Days::new(u64::from(day.weekday().num_days_from_monday()));
                let start = day.checked_sub_days(offset).unwrap_or(day);
                let end = start.checked_add_days(Days::new(6)).unwrap_or(day);
                (start, end)
            }
            Self::Month => {
                let start = day.with_day(1).unwrap_or(day);
                let end = start
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .unwrap_or(day);
                (start, end)
            }
        }
    }

    /// Label shown in the reflection header.
    pub fn label(&self, day: NaiveDate) -> String {
        match self.range(day) {
            (start, end) if start == end => start.format("%Y-%m-%d").to_string(),
            (start, end) => format!("{} to {}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d")),
        }
    }

    /// Publication time of the resulting journal entry.
    ///
    /// Weeks and months are stamped at the very end of their last day. A day
    /// is stamped with the time picked explicitly, otherwise `now` is used.
    pub fn published(&self, date: Option<NaiveDateTime>, now: NaiveDateTime) -> NaiveDateTime {
        let day = date.map_or(now.date(), |date| date.date());
        match self {
            Self::Day => date.unwrap_or(now),
            Self::Yesterday => now.checked_sub_days(Days::new(1)).unwrap_or(now),
            Self::Week | Self::Month => {
                let (_, end) = self.range(day);
                end.and_hms_opt(23, 59, 59)
                    .unwrap_or_else(|| end.and_time(NaiveTime::MIN))
            }
        }
    }

    /// Thread whose daily events are digested.
    ///
    /// Months are digested from weekly reflections rather than every day.
    pub const fn fetch_thread(&self) -> &'static str {
        match self {
            Self::Month => "Weekly",
            _ => "Daily",
        }
    }

    /// Journal thread the reflection is saved to.
    pub const fn save_thread(&self) -> &'static str {
        match self {
            Self::Day | Self::Yesterday => "Daily",
            Self::Week => "Weekly",
            Self::Month => "big-picture",
        }
    }
}

fn collapse_blank_lines(text: &str) -> String {
    let mut lines = Vec::new();
    let mut blank_run = false;
    for line in text.lines() {
        if line.trim().is_empty() {
            if !blank_run {
                lines.push("");
            }
            blank_run = true;
        } else {
            lines.push(line);
            blank_run = false;
        }
    }

    lines.join("\n")
}
