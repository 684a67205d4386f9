// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Read models fetched from the service and their plain text forms.
//!
//! Besides the small listings shown while journaling, this module turns the
//! service's daily event feed into the digest placed under a reflection
//! draft, see [`ReflectionDigest`].

use crate::template::{render_template, TemplateError, Value};

use chrono::{DateTime, NaiveDateTime, Timelike};
use regex::Regex;
use serde::Deserialize;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    sync::LazyLock,
};

/// Paginated listing.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: Option<u64>,
    pub results: Vec<T>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct QuickNote {
    pub note: String,
}

/// Quick notes as a bullet list.
///
/// Each note becomes a `- ` bullet. Notes spanning several lines have their
/// continuation lines indented by two spaces so they stay under the bullet.
pub fn format_quick_notes(notes: &[QuickNote]) -> String {
    notes
        .iter()
        .map(|note| format!("- {}", note.note.replace('\n', "\n  ")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Daily plan.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Plan {
    pub id: u64,
    pub pub_date: String,
    #[serde(default)]
    pub focus: String,
    #[serde(default)]
    pub want: String,
}

impl Plan {
    /// Neither focus nor want was filled in.
    pub fn is_empty(&self) -> bool {
        !not_empty(&self.focus) && !not_empty(&self.want)
    }
}

impl Display for Plan {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let sections = [("Focus", &self.focus), ("Want", &self.want)]
            .into_iter()
            .filter_map(|(title, text)| {
                let items = itemize(text);
                (!items.is_empty()).then(|| format!("{title}:\n{items}"))
            })
            .collect::<Vec<_>>();
        fmt.write_str(&sections.join("\n"))
    }
}

// Turn each non-blank line into a `- ` bullet, keeping existing bullets as is.
fn itemize(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let line = line.strip_prefix('-').map(str::trim_start).unwrap_or(line);
            format!("- {line}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Habit {
    pub tagname: String,
}

/// Habits as `#tag` list, minus the ones in `ignore`.
pub fn format_habits(habits: &[Habit], ignore: &[String]) -> String {
    habits
        .iter()
        .filter(|habit| !ignore.iter().any(|ignored| ignored == &habit.tagname))
        .map(|habit| format!("#{}", habit.tagname))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Observation as shown in listings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ObservationSummary {
    pub id: u64,
    #[serde(default)]
    pub situation: String,
}

impl ObservationSummary {
    /// Single `#id: situation` line, whitespace collapsed and situation
    /// truncated to `chars` characters.
    pub fn line(&self, chars: usize) -> String {
        let situation = self
            .situation
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let situation = situation.chars().take(chars).collect::<String>();
        format!("#{}: {}", self.id, situation)
    }
}

/// Reflection already written for a day.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PastReflection {
    #[serde(default)]
    pub good: String,
    #[serde(default)]
    pub better: String,
    #[serde(default)]
    pub best: String,
}

impl PastReflection {
    pub fn is_empty(&self) -> bool {
        [&self.good, &self.better, &self.best]
            .into_iter()
            .all(|text| !not_empty(text))
    }
}

/// One day of the daily event feed.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct DailyEvents {
    pub date: String,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub plan: Option<Plan>,
    #[serde(default)]
    pub reflection: Option<PastReflection>,
}

impl DailyEvents {
    /// Nothing happened, nothing was planned, nothing was reflected on.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.plan.as_ref().map_or(true, Plan::is_empty) && self.lacks_reflection()
    }

    /// No reflection with content was written for this day.
    pub fn lacks_reflection(&self) -> bool {
        self.reflection.as_ref().map_or(true, PastReflection::is_empty)
    }
}

/// Entry of the daily event feed, tagged by `resourcetype`.
///
/// Kinds this client does not know about deserialize to [`Event::Other`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "resourcetype")]
pub enum Event {
    JournalAdded(JournalEvent),
    HabitTracked(HabitEvent),
    ObservationMade(ObservationEvent),
    ObservationUpdated(ObservationEvent),
    ObservationRecontextualized(ObservationEvent),
    ObservationReinterpreted(ObservationEvent),
    ObservationReflectedUpon(ObservationEvent),
    ObservationClosed(ObservationEvent),
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct JournalEvent {
    pub published: String,
    #[serde(default)]
    pub comment: String,
}

impl JournalEvent {
    /// Heading for this entry.
    ///
    /// Entries stamped at 23:59:59 were written about the day as a whole.
    /// Entries stamped at midnight carry no real time, so the first time of
    /// day mentioned in the comment is used instead, if any.
    pub fn heading(&self) -> String {
        let Some(published) = parse_published(&self.published) else {
            return self.published.clone();
        };

        match (published.hour(), published.minute(), published.second()) {
            (23, 59, 59) => "At the end of the day...".into(),
            (0, 0, 0) => SOMETIME
                .as_ref()
                .and_then(|re| re.find(&self.comment))
                .map(|found| found.as_str().to_string())
                .unwrap_or_else(|| "Sometime that day...".into()),
            _ => published.format("(%a) %H:%M").to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct HabitEvent {
    pub published: String,
    #[serde(default)]
    pub note: String,
    pub occured: bool,
    pub habit: Habit,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ObservationEvent {
    pub published: String,
    pub event_stream_id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub situation: Option<String>,
    #[serde(default)]
    pub situation_at_creation: Option<String>,
}

impl ObservationEvent {
    fn situation(&self) -> &str {
        self.situation
            .as_deref()
            .or(self.situation_at_creation.as_deref())
            .unwrap_or_default()
    }
}

static SOMETIME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\d{1,2}:\d{2}(?::\d{2})?").ok());

static CHECKBOX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*-\s*(?:\[[x^~ ]\])?\s*").ok());

const DIGEST_TEMPLATE: &str = "\
{% if plans.focus or plans.want %}
# Plans

{% endif %}
{% if plans.focus %}
{{ plans.focus }}

{% endif %}
{% if plans.want %}
## Want

{{ plans.want }}

{% endif %}
{% if habits %}
# Habits

{{ habits }}

{% endif %}
{% if observations.count %}
# Work on observations ({{ observations.count }})

{{ observations.lines }}

{% endif %}
{% if journals %}
# Journals

{{ journals }}
{% endif %}
";

/// What a span of days looked like, laid out for reflecting on it.
///
/// Past reflections and plans come back as unticked `- [ ] ` points, which
/// the reflection parser drops unless the user ticks or rewrites them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReflectionDigest {
    pub good: String,
    pub better: String,
    pub best: String,

    /// Plans, habits, observation work, and journals.
    pub summary: String,
}

impl ReflectionDigest {
    /// Digest `days`, skipping the ones with nothing in them.
    ///
    /// # Errors
    ///
    /// - Return [`TemplateError`] if digest template fails to parse.
    pub fn new(days: &[DailyEvents], skip_journals: bool) -> Result<Self, TemplateError> {
        let days = days.iter().filter(|day| !day.is_empty()).collect::<Vec<_>>();
        let reflections = days.iter().filter_map(|day| day.reflection.as_ref()).collect::<Vec<_>>();
        let plans = days.iter().filter_map(|day| day.plan.as_ref()).collect::<Vec<_>>();
        let events = days.iter().flat_map(|day| day.events.iter()).collect::<Vec<_>>();

        let journals = match skip_journals {
            true => String::new(),
            false => events
                .iter()
                .filter_map(|event| match event {
                    Event::JournalAdded(journal) => {
                        Some(format!("### {}\n\n{}", journal.heading(), journal.comment.trim()))
                    }
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
        };
        let habits = events
            .iter()
            .filter_map(|event| match event {
                Event::HabitTracked(habit) => Some(habit),
                _ => None,
            })
            .collect::<Vec<_>>();
        let observations = events
            .iter()
            .filter_map(|event| observation_event(event))
            .collect::<Vec<_>>();

        let context = Value::map([
            (
                "plans",
                Value::map([
                    ("focus", Value::from(checklists(plans.iter().map(|plan| plan.focus.as_str())))),
                    ("want", Value::from(checklists(plans.iter().map(|plan| plan.want.as_str())))),
                ]),
            ),
            ("habits", Value::from(habit_summary(&habits))),
            (
                "observations",
                Value::map([
                    ("count", Value::from(observations.len() as u64)),
                    ("lines", Value::from(observation_summary(&observations))),
                ]),
            ),
            ("journals", Value::from(journals)),
        ]);

        Ok(Self {
            good: checklists(reflections.iter().map(|reflection| reflection.good.as_str())),
            better: checklists(reflections.iter().map(|reflection| reflection.better.as_str())),
            best: checklists(reflections.iter().map(|reflection| reflection.best.as_str())),
            summary: render_template(DIGEST_TEMPLATE, &context)?.trim().to_string(),
        })
    }
}

fn observation_event(event: &Event) -> Option<(&ObservationEvent, ObservationChange)> {
    let found = match event {
        Event::ObservationMade(observation) => (observation, ObservationChange::Added),
        Event::ObservationClosed(observation) => (observation, ObservationChange::Closed),
        Event::ObservationUpdated(observation)
        | Event::ObservationRecontextualized(observation)
        | Event::ObservationReinterpreted(observation)
        | Event::ObservationReflectedUpon(observation) => (observation, ObservationChange::Touched),
        _ => return None,
    };
    Some(found)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ObservationChange {
    Added,
    Closed,
    Touched,
}

// One line per observation, in order of first appearance:
// `- [situation](url) (closed|added|N updates)`.
fn observation_summary(events: &[(&ObservationEvent, ObservationChange)]) -> String {
    let mut streams: Vec<(&ObservationEvent, Vec<ObservationChange>)> = Vec::new();
    for &(event, change) in events {
        match streams.iter_mut().find(|(seen, _)| seen.event_stream_id == event.event_stream_id) {
            Some((_, changes)) => changes.push(change),
            None => streams.push((event, vec![change])),
        }
    }

    streams
        .into_iter()
        .map(|(event, changes)| {
            let stats = if changes.contains(&ObservationChange::Closed) {
                " (closed)".to_string()
            } else if changes.contains(&ObservationChange::Added) {
                " (added)".to_string()
            } else if changes.len() > 1 {
                format!(" ({} updates)", changes.len())
            } else {
                String::new()
            };
            format!("- [{}]({}){stats}", first_line(event.situation()), event.url)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// `- #tag: N times on Mon, Tue` per habit, with notes nested below.
fn habit_summary(events: &[&HabitEvent]) -> String {
    let mut groups: Vec<(&str, usize, Vec<String>, Vec<&str>)> = Vec::new();
    for event in events {
        let index = match groups.iter().position(|(tag, ..)| *tag == event.habit.tagname) {
            Some(index) => index,
            None => {
                groups.push((event.habit.tagname.as_str(), 0, Vec::new(), Vec::new()));
                groups.len() - 1
            }
        };
        let (_, count, days, notes) = &mut groups[index];
        if event.occured {
            *count += 1;
        }
        if let Some(day) = parse_published(&event.published).map(|at| at.format("%a").to_string()) {
            if !days.contains(&day) {
                days.push(day);
            }
        }
        if !event.note.trim().is_empty() {
            notes.push(event.note.trim());
        }
    }

    groups
        .into_iter()
        .flat_map(|(tag, count, days, notes)| {
            let head = format!("- #{tag}: {count} times on {}", days.join(", "));
            std::iter::once(head).chain(notes.into_iter().map(|note| format!("  - {note}")))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// Every non-blank line as an unticked point, days separated by a blank line.
fn checklists<'a>(texts: impl Iterator<Item = &'a str>) -> String {
    texts
        .filter(|text| not_empty(text))
        .map(|text| {
            text.lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| {
                    let bare = match CHECKBOX.as_ref() {
                        Some(re) => re.replace(line, ""),
                        None => line.into(),
                    };
                    format!("- [ ] {bare}")
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

// First line of multi-line text, marked as cut with an ellipsis.
fn first_line(text: &str) -> String {
    match text.split_once('\n') {
        Some((first, _)) => format!("{}…", first.trim_end().trim_end_matches(['.', '…'])),
        None => text.to_string(),
    }
}

// Placeholder `?` counts as unfilled.
fn not_empty(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && text != "?"
}

fn parse_published(text: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(text)
        .map(|at| at.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
        .ok()
}
