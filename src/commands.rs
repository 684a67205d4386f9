// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Subcommands.
//!
//! Option types derive [`clap`] traits so both the binary and the interactive
//! shell parse input the same way. [`App`] owns everything a command needs:
//! configuration, service handle, queue, editor, and session. Each command
//! returns the process exit code it wants.

use crate::{
    client::{Api, ClientError, Transport, TransportError},
    config::TasksConfig,
    digest::{format_habits, format_quick_notes, DailyEvents, ReflectionDigest},
    document::{split_list, DocumentError},
    editor::Editor,
    queue::{DeadLetterQueue, QueueError},
    record::{JournalEntry, Observation, ObservationUpdate, Reflection, ReflectionPeriod, Submission},
    session::{Session, SessionError},
    shell::{self, InquirePrompt},
    submit::{Edit, Outcome, SubmitError, Submitter},
    template::TemplateError,
};

use chrono::{Days, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use clap::{Args, Subcommand};
use indicatif::ProgressBar;
use serde_json::Value as Json;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{info, instrument, warn};

/// Format of journal publication times.
pub const PUBLISHED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Write journal entry.
    Journal(JournalOptions),

    /// Write observation, or list recent ones.
    Observation(ObservationOptions),

    /// Comment on existing observation.
    Update(UpdateOptions),

    /// Reflect on a day, week, or month.
    Reflect(ReflectOptions),

    /// Print tracked habits.
    Habits(HabitsOptions),

    /// Add task to board.
    Task(TaskOptions),

    /// Start interactive task shell.
    Shell(ShellOptions),

    /// Inspect or flush offline queue.
    #[command(subcommand)]
    Queue(QueueCommand),
}

#[derive(Args, Clone, Debug, Default)]
pub struct JournalOptions {
    /// Publication date of entry.
    #[arg(short, long, value_name = "date", conflicts_with = "yesterday")]
    pub date: Option<String>,

    /// Publish entry late yesterday evening.
    #[arg(short = 'Y', long)]
    pub yesterday: bool,

    /// Comma separated tags.
    #[arg(short = 'T', long, value_name = "tags")]
    pub tags: Option<String>,

    /// Journal thread.
    #[arg(short, long, value_name = "thread", default_value = "Daily")]
    pub thread: String,

    /// Prefill comment from file.
    #[arg(short, long, value_name = "file")]
    pub file: Option<PathBuf>,

    /// Also save comment as new observation.
    #[arg(short = 's', short_alias = 'o')]
    pub observation: bool,

    /// Print what was journaled today on the thread instead.
    #[arg(short = 'L', long)]
    pub today: bool,
}

#[derive(Args, Clone, Debug, Default)]
pub struct ObservationOptions {
    /// List recent observations instead.
    #[arg(short, long)]
    pub list: bool,

    /// With --list, number of observations shown.
    #[arg(short, long, value_name = "count", requires = "list")]
    pub number: Option<usize>,

    /// With --list, number of situation characters shown.
    #[arg(short, long, value_name = "count", requires = "list")]
    pub chars: Option<usize>,

    /// Publication date of observation.
    #[arg(long, value_name = "date")]
    pub date: Option<String>,

    /// Save new observation as default target for updates.
    #[arg(short, long)]
    pub save: bool,

    /// Observation thread.
    #[arg(long, value_name = "thread", default_value = "big-picture")]
    pub thread: String,

    /// Observation type.
    #[arg(long = "type", value_name = "type", default_value = "observation")]
    pub kind: String,
}

#[derive(Args, Clone, Debug, Default)]
pub struct UpdateOptions {
    /// Observation to comment on. Defaults to saved observation.
    #[arg(value_name = "id")]
    pub id: Option<u64>,
}

#[derive(Args, Clone, Debug, Default)]
pub struct ReflectOptions {
    /// Day to reflect on, or a day within the week or month.
    #[arg(short, long, value_name = "date")]
    pub date: Option<String>,

    /// Reflect on the week.
    #[arg(short, long, group = "period")]
    pub week: bool,

    /// Reflect on the month.
    #[arg(short, long, group = "period")]
    pub month: bool,

    /// Reflect on yesterday.
    #[arg(short, long, group = "period")]
    pub yesterday: bool,

    /// First journal past days of the period that have no reflection yet.
    #[arg(short = 'M', long)]
    pub missing: bool,
}

impl ReflectOptions {
    pub fn period(&self) -> ReflectionPeriod {
        if self.week {
            ReflectionPeriod::Week
        } else if self.month {
            ReflectionPeriod::Month
        } else if self.yesterday {
            ReflectionPeriod::Yesterday
        } else {
            ReflectionPeriod::Day
        }
    }
}

#[derive(Args, Clone, Debug, Default)]
pub struct HabitsOptions {
    /// Write list to file instead of standard output.
    #[arg(short, long, value_name = "file")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Clone, Debug, Default)]
pub struct TaskOptions {
    /// Board thread. A trailing `> thread` in the text overrides it.
    #[arg(long, value_name = "thread", default_value = "Inbox")]
    pub thread: String,

    /// Task text.
    #[arg(
        required = true,
        value_name = "text",
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub text: Vec<String>,
}

#[derive(Args, Clone, Debug, Default)]
pub struct ShellOptions {
    /// Board thread tasks go to.
    #[arg(long, value_name = "thread", default_value = "Inbox")]
    pub thread: String,
}

#[derive(Debug, Clone, Subcommand)]
pub enum QueueCommand {
    /// List queued submissions, oldest first.
    List,

    /// Send queued submissions now.
    Flush,
}

/// Everything a command needs.
pub struct App<T, E> {
    config: TasksConfig,
    api: Api<T>,
    queue: DeadLetterQueue,
    editor: E,
    session: Session,
    draft_dir: Option<PathBuf>,
    quiet: bool,
    clock: fn() -> NaiveDateTime,
}

impl<T: Transport, E: Editor> App<T, E> {
    pub fn new(config: TasksConfig, transport: T, editor: E, session: Session) -> Self {
        let api = Api::new(config.url.clone(), transport);
        let queue = DeadLetterQueue::new(config.queue_dir.clone(), config.delete_on);
        Self {
            config,
            api,
            queue,
            editor,
            session,
            draft_dir: None,
            quiet: false,
            clock: || Local::now().naive_local(),
        }
    }

    /// Write drafts into `dir`.
    pub fn with_draft_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.draft_dir = Some(dir.into());
        self
    }

    /// Hide progress bars.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Use `clock` instead of the local wall clock.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn queue(&self) -> &DeadLetterQueue {
        &self.queue
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    fn submitter(&self) -> Submitter<'_, T, E> {
        let mut submitter = Submitter::new(&self.api, &self.queue, &self.editor);
        if let Some(dir) = &self.draft_dir {
            submitter = submitter.with_draft_dir(dir);
        }
        if self.quiet {
            submitter = submitter.quiet();
        }
        submitter
    }

    /// Run command, returning process exit code.
    ///
    /// # Errors
    ///
    /// - Return [`CommandError`] if command fails in a way that is not
    ///   reported through its exit code.
    pub fn run(&mut self, command: Command, out: &mut impl Write) -> Result<i32> {
        match command {
            Command::Journal(opts) => self.journal(opts, out),
            Command::Observation(opts) => self.observation(opts, out),
            Command::Update(opts) => self.update(opts, out),
            Command::Reflect(opts) => self.reflect(opts, out),
            Command::Habits(opts) => self.habits(opts, out),
            Command::Task(opts) => self.task(opts, out),
            Command::Shell(opts) => {
                self.session.thread = opts.thread;
                shell::run(self, &mut InquirePrompt, out)?;
                Ok(0)
            }
            Command::Queue(QueueCommand::List) => self.queue_list(out),
            Command::Queue(QueueCommand::Flush) => self.queue_flush(out),
        }
    }

    /// Write journal entry.
    ///
    /// # Errors
    ///
    /// - Return [`CommandError`] if entry cannot be edited or sent.
    #[instrument(skip(self, out), level = "debug")]
    pub fn journal(&mut self, opts: JournalOptions, out: &mut impl Write) -> Result<i32> {
        if opts.today {
            return self.todays_digest(&opts.thread, out);
        }

        let now = self.now();
        let published = match (&opts.date, opts.yesterday) {
            (Some(date), _) => parse_date_time(date)?,
            (None, true) => yesterday_evening(now),
            (None, false) => now,
        };

        let mut entry = JournalEntry::new(&opts.thread, published.format(PUBLISHED_FORMAT).to_string());
        entry.tags = opts.tags.as_deref().map(split_list).unwrap_or_default();
        entry.notes = format_quick_notes(&self.api.quick_notes());
        entry.plan = self
            .api
            .plan_for(now.date())
            .map(|plan| plan.to_string())
            .filter(|plan| !plan.trim().is_empty());
        if let Some(path) = &opts.file {
            entry.comment = Some(read_file(path)?.trim().to_string());
        }

        let outcome = self.submitter().submit(entry, out)?;
        if let (Outcome::Submitted(echo), true) = (&outcome, opts.observation) {
            self.copy_as_observation(echo, &opts.thread, now.date(), out)?;
        }

        Ok(outcome.exit_code())
    }

    fn todays_digest(&self, thread: &str, out: &mut impl Write) -> Result<i32> {
        let day = match self.api.daily_events(self.now().date(), thread) {
            Ok(day) => day,
            Err(ClientError::Rejected(response)) => {
                writeln!(out, "{}", response.describe())?;
                return Ok(1);
            }
            Err(err) => return Err(err.into()),
        };

        let digest = ReflectionDigest::new(&[day], false)?;
        writeln!(out, "{}", digest.summary)?;

        Ok(0)
    }

    fn copy_as_observation(
        &self,
        echo: &Json,
        thread: &str,
        today: NaiveDate,
        out: &mut impl Write,
    ) -> Result<()> {
        let mut observation =
            Observation::new(today.format("%Y-%m-%d").to_string(), thread, "observation");
        observation.situation = echo
            .get("comment")
            .and_then(Json::as_str)
            .map(|comment| comment.replace("\r\n", "\n"));

        let submission = Submission::from(observation);
        let payload = Json::Object(submission.payload()?);
        match self.api.post(submission.endpoint(), &payload) {
            Ok(response) if response.is_success() => {
                let id = response.json().ok().and_then(|json| json.get("id").cloned());
                writeln!(out, "Saved observation under id {}", id.unwrap_or(Json::Null))?;
            }
            Ok(response) => writeln!(out, "{}", response.describe())?,
            Err(err) => {
                warn!("{err}");
                writeln!(out, "Error: Failed to save observation copy.")?;
            }
        }

        Ok(())
    }

    /// Write observation, or list recent ones.
    ///
    /// # Errors
    ///
    /// - Return [`CommandError`] if observation cannot be edited or sent, or
    ///   listing fails.
    #[instrument(skip(self, out), level = "debug")]
    pub fn observation(&mut self, opts: ObservationOptions, out: &mut impl Write) -> Result<i32> {
        if opts.list {
            let count = opts.number.unwrap_or(self.config.observation_list_count);
            let chars = opts.chars.unwrap_or(self.config.observation_list_characters);
            return self.list_observations(count, chars, out);
        }

        let pub_date = opts
            .date
            .unwrap_or_else(|| self.now().format("%Y-%m-%d").to_string());
        let observation = Observation::new(pub_date, opts.thread, opts.kind);

        let outcome = self.submitter().submit(observation, out)?;
        if let (Outcome::Submitted(echo), true) = (&outcome, opts.save) {
            if let Some(id) = echo.get("id").and_then(Json::as_u64) {
                self.session.save_observation_id(id)?;
                info!("saved observation {id} as update target");
            }
        }

        Ok(outcome.exit_code())
    }

    fn list_observations(&self, count: usize, chars: usize, out: &mut impl Write) -> Result<i32> {
        match self.api.observations(count) {
            Ok(observations) => {
                for observation in observations {
                    writeln!(out, "{}", observation.line(chars))?;
                }
                Ok(0)
            }
            Err(ClientError::Rejected(response)) => {
                writeln!(out, "{}", response.describe())?;
                Ok(0)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Comment on observation.
    ///
    /// # Errors
    ///
    /// - Return [`CommandError`] if update cannot be edited or sent.
    #[instrument(skip(self, out), level = "debug")]
    pub fn update(&mut self, opts: UpdateOptions, out: &mut impl Write) -> Result<i32> {
        let id = match opts.id {
            Some(id) => id,
            None => match self.session.saved_observation_id()? {
                Some(id) => id,
                None => {
                    writeln!(out, "No observation id given, and none was saved with `observation --save`.")?;
                    return Ok(1);
                }
            },
        };

        let update = ObservationUpdate::new(id, self.now().format("%Y-%m-%d %H:%M").to_string());
        let outcome = self.submitter().submit(update, out)?;
        if let Outcome::Submitted(echo) = &outcome {
            let id = echo.get("observation").and_then(Json::as_u64).unwrap_or(id);
            self.session.save_observation_id(id)?;
        }

        Ok(outcome.exit_code())
    }

    /// Reflect, then journal the reflection.
    ///
    /// # Errors
    ///
    /// - Return [`CommandError`] if reflection or journal entry cannot be
    ///   edited or sent.
    #[instrument(skip(self, out), level = "debug")]
    pub fn reflect(&mut self, opts: ReflectOptions, out: &mut impl Write) -> Result<i32> {
        let now = self.now();
        let period = opts.period();
        let date = opts.date.as_deref().map(parse_date_time).transpose()?;
        let day = date.map_or(now.date(), |date| date.date());

        if opts.missing {
            let days = self.daily_events(period, day);
            self.journal_missing_days(&days, now.date(), out)?;
        }

        let days = self
            .daily_events(period, day)
            .into_iter()
            .filter_map(|(_, events)| events)
            .collect::<Vec<_>>();
        let digest = ReflectionDigest::new(&days, period == ReflectionPeriod::Month)?;
        let reflection = Reflection::new(period.label(day)).with_digest(digest);

        let submitter = self.submitter();
        let (reflection, draft) = match submitter.edit(reflection, out)? {
            Edit::Changed { record, draft } => (record, draft),
            Edit::Unchanged => return Ok(Outcome::Unchanged.exit_code()),
            Edit::EditorFailed(path) => return Ok(Outcome::EditorFailed(path).exit_code()),
        };
        draft.discard()?;

        let published = period.published(date, now).format(PUBLISHED_FORMAT).to_string();
        let entry = reflection.into_journal(period.save_thread(), published);
        let outcome = submitter.submit(entry, out)?;

        Ok(outcome.exit_code())
    }

    // Daily event feed of every day in the period, `None` where it failed.
    fn daily_events(
        &self,
        period: ReflectionPeriod,
        day: NaiveDate,
    ) -> Vec<(NaiveDate, Option<DailyEvents>)> {
        let (start, end) = period.range(day);
        start
            .iter_days()
            .take_while(|day| *day <= end)
            .map(|day| match self.api.daily_events(day, period.fetch_thread()) {
                Ok(events) => (day, Some(events)),
                Err(err) => {
                    warn!("failed to fetch events of {day}: {err}");
                    (day, None)
                }
            })
            .collect()
    }

    fn journal_missing_days(
        &mut self,
        days: &[(NaiveDate, Option<DailyEvents>)],
        today: NaiveDate,
        out: &mut impl Write,
    ) -> Result<()> {
        let missing = days
            .iter()
            .filter(|(_, events)| events.as_ref().map_or(true, DailyEvents::lacks_reflection))
            .map(|(day, _)| *day)
            .filter(|day| *day <= today)
            .collect::<Vec<_>>();
        if missing.is_empty() {
            writeln!(out, "No missing journal entries found for past dates.")?;
            return Ok(());
        }

        writeln!(out, "Found {} missing journal entries for past dates.", missing.len())?;
        for day in missing {
            writeln!(out, "Creating journal entry for {}...", day.format("%Y-%m-%d (%A)"))?;
            let opts = JournalOptions {
                date: Some(day.format("%Y-%m-%d").to_string()),
                thread: "Daily".into(),
                ..JournalOptions::default()
            };
            if let Err(err) = self.journal(opts, out) {
                warn!("{err:?}");
                writeln!(out, "Error creating journal entry for {day}")?;
            }
        }

        Ok(())
    }

    /// Print habit tags.
    ///
    /// # Errors
    ///
    /// - Return [`CommandError`] if habits cannot be fetched or written.
    #[instrument(skip(self, out), level = "debug")]
    pub fn habits(&mut self, opts: HabitsOptions, out: &mut impl Write) -> Result<i32> {
        let habits = match self.api.habits() {
            Ok(habits) => habits,
            Err(ClientError::Rejected(response)) => {
                writeln!(out, "{}", response.describe())?;
                return Ok(0);
            }
            Err(err) => return Err(err.into()),
        };

        let line = format_habits(&habits, &self.config.ignore_habits);
        match &opts.output {
            Some(path) => fs::write(path, format!("{line}\n")).map_err(|err| CommandError::WriteFile {
                source: err,
                path: path.clone(),
            })?,
            None => writeln!(out, "{line}")?,
        }

        Ok(0)
    }

    /// Append task to board.
    ///
    /// # Errors
    ///
    /// - Return [`CommandError::Transport`] if task could not be sent.
    #[instrument(skip(self, out), level = "debug")]
    pub fn task(&mut self, opts: TaskOptions, out: &mut impl Write) -> Result<i32> {
        let text = opts.text.join(" ");
        let (text, thread) = route_task(&text, &opts.thread);

        let response = self.api.append_to_board(thread, text)?;
        if response.is_success() {
            writeln!(out, "Task added.")?;
            writeln!(out, "See more:\n- {}/todo/#/board/{thread}", self.api.base_url())?;
        } else {
            writeln!(out, "{}", response.describe())?;
        }

        Ok(0)
    }

    /// List queued submissions.
    ///
    /// # Errors
    ///
    /// - Return [`CommandError::Queue`] if queue cannot be listed.
    pub fn queue_list(&mut self, out: &mut impl Write) -> Result<i32> {
        let pending = self.queue.pending()?;
        if pending.is_empty() {
            writeln!(out, "Queue is empty.")?;
        }
        for letter in pending {
            let kind = letter.kind.map(|kind| kind.as_str()).unwrap_or("unknown");
            writeln!(out, "{}  ({kind})", letter.name)?;
        }

        Ok(0)
    }

    /// Deliver queued submissions now.
    ///
    /// # Errors
    ///
    /// - Return [`CommandError::Queue`] if any letter cannot be delivered.
    pub fn queue_flush(&mut self, out: &mut impl Write) -> Result<i32> {
        let progress = match self.quiet {
            true => ProgressBar::hidden(),
            false => ProgressBar::new(0),
        };

        let report = self.queue.flush(self.api.transport(), &progress).inspect_err(|_| {
            progress.abandon();
        })?;
        writeln!(out, "Sent {} queued submissions.", report.delivered.len())?;

        Ok(0)
    }

    /// Lines printed when the shell starts.
    pub(crate) fn shell_banner(&self) -> Vec<String> {
        let mut lines = vec![format!("Connected to Tasks Collector at {}", self.api.base_url())];
        let notes = format_quick_notes(&self.api.quick_notes());
        if !notes.is_empty() {
            lines.push(notes);
        }
        if let Some(plan) = self.api.plan_for(self.now().date()) {
            lines.push(plan.to_string());
        }
        lines
    }
}

/// Split trailing `> thread` off task text.
///
/// Returns task text and thread, falling back to `default` when the text
/// carries no valid thread name.
pub fn route_task<'a>(text: &'a str, default: &'a str) -> (&'a str, &'a str) {
    if let Some((task, thread)) = text.rsplit_once('>') {
        let thread = thread.trim();
        let valid = !thread.is_empty()
            && thread
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if valid {
            return (task.trim(), thread);
        }
    }

    (text.trim(), default)
}

/// Parse user supplied date, with or without time of day.
///
/// # Errors
///
/// - Return [`CommandError::InvalidDate`] if no known format matches.
pub fn parse_date_time(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    for format in [PUBLISHED_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(date_time) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(date_time);
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| CommandError::InvalidDate(text.to_string()))
}

// Yesterday at 23 past the current minute, so the entry sorts last that day.
fn yesterday_evening(now: NaiveDateTime) -> NaiveDateTime {
    let yesterday = now.checked_sub_days(Days::new(1)).unwrap_or(now);
    yesterday.with_hour(23).unwrap_or(yesterday)
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| CommandError::ReadFile {
        source: err,
        path: path.to_path_buf(),
    })
}

/// Command error types.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Editor(#[from] crate::editor::EditorError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Failed to serialize payload.
    #[error("failed to serialize payload")]
    Payload(#[from] serde_json::Error),

    /// Failed to read input file.
    #[error("failed to read {:?}", path.display())]
    ReadFile {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to write output file.
    #[error("failed to write {:?}", path.display())]
    WriteFile {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Date matches no known format.
    #[error("invalid date {0:?}, expected YYYY-MM-DD with optional HH:MM[:SS]")]
    InvalidDate(String),

    /// Failed to read interactive input.
    #[error(transparent)]
    Prompt(#[from] inquire::InquireError),

    /// Failed to write user facing message.
    #[error("failed to write output")]
    Output(#[from] std::io::Error),
}

/// Friendly result alias :3
type Result<T, E = CommandError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test_case("water plants", "Inbox", "water plants"; "no routing")]
    #[test_case("water plants > Home", "Home", "water plants"; "routed")]
    #[test_case("water plants>home-2 ", "home-2", "water plants"; "tight routing")]
    #[test_case("a > b > Work", "Work", "a > b"; "last arrow wins")]
    #[test_case("compare a > b c", "Inbox", "compare a > b c"; "not a thread name")]
    #[test]
    fn task_routing(text: &str, thread: &str, task: &str) {
        pretty_assertions::assert_eq!(route_task(text, "Inbox"), (task, thread));
    }

    #[test_case("2024-05-01", "2024-05-01 00:00:00"; "date only")]
    #[test_case("2024-05-01 21:15", "2024-05-01 21:15:00"; "minutes")]
    #[test_case("2024-05-01 21:15:07", "2024-05-01 21:15:07"; "seconds")]
    #[test_case("2024-05-01T21:15:07", "2024-05-01 21:15:07"; "iso")]
    #[test]
    fn date_formats(text: &str, expect: &str) -> anyhow::Result<()> {
        let parsed = parse_date_time(text)?;
        pretty_assertions::assert_eq!(parsed.format(PUBLISHED_FORMAT).to_string(), expect);

        Ok(())
    }

    #[test]
    fn rejects_unknown_date() {
        assert!(matches!(
            parse_date_time("yesterday"),
            Err(CommandError::InvalidDate(_))
        ));
    }

    #[test]
    fn yesterday_evening_keeps_minutes() -> anyhow::Result<()> {
        let now = parse_date_time("2024-05-01 09:42:10")?;
        pretty_assertions::assert_eq!(
            yesterday_evening(now).format(PUBLISHED_FORMAT).to_string(),
            "2024-04-30 23:42:10"
        );

        Ok(())
    }

    #[test_case(ReflectOptions { week: true, ..Default::default() }, ReflectionPeriod::Week; "week")]
    #[test_case(ReflectOptions { month: true, ..Default::default() }, ReflectionPeriod::Month; "month")]
    #[test_case(ReflectOptions { yesterday: true, ..Default::default() }, ReflectionPeriod::Yesterday; "yesterday")]
    #[test_case(ReflectOptions::default(), ReflectionPeriod::Day; "day")]
    #[test]
    fn reflect_periods(opts: ReflectOptions, expect: ReflectionPeriod) {
        pretty_assertions::assert_eq!(opts.period(), expect);
    }
}
