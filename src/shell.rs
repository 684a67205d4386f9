// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Interactive task shell.
//!
//! Every line typed at the prompt is either a command or a task. The first
//! word picks a command if it is a prefix of one of [`SHELL_COMMANDS`], tried
//! in table order, so `o` runs `observation` and `ol` runs `olist`. Anything
//! else is added to the current board thread as a task.
//!
//! The shell ends on Ctrl+D or Ctrl+C, saving input history on the way out.

use crate::{
    client::Transport,
    commands::{App, Command, CommandError, TaskOptions},
    editor::Editor,
};

use clap::Parser;
use inquire::{
    autocompletion::{Autocomplete, Replacement},
    CustomUserError, InquireError, Text,
};
use std::io::Write;
use tracing::warn;

/// Shell command names and the arguments they expand to.
pub const SHELL_COMMANDS: &[(&str, &[&str])] = &[
    ("observation", &["observation"]),
    ("olist", &["observation", "--list"]),
    ("habits", &["habits"]),
    ("journal", &["journal"]),
    ("thought", &["journal", "--tags", "thoughts"]),
    ("update", &["update"]),
    ("wtf", &["journal", "--tags", "wtf"]),
    ("reflect", &["reflect"]),
    ("queue", &["queue"]),
    ("help", &[]),
];

/// Source of shell input lines.
pub trait Prompt {
    /// Read one line. Returns `Ok(None)` once the user wants out.
    ///
    /// # Errors
    ///
    /// - Return [`InquireError`] if terminal cannot be read.
    fn read_line(&mut self, prompt: &str, history: &[String]) -> Result<Option<String>, InquireError>;
}

/// Terminal prompt, completing from shell history.
#[derive(Clone, Copy, Debug, Default)]
pub struct InquirePrompt;

impl Prompt for InquirePrompt {
    fn read_line(&mut self, prompt: &str, history: &[String]) -> Result<Option<String>, InquireError> {
        let completer = HistoryCompleter(history.iter().rev().cloned().collect());
        match Text::new(prompt).with_autocomplete(completer).prompt() {
            Ok(line) => Ok(Some(line)),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[derive(Clone, Debug)]
struct HistoryCompleter(Vec<String>);

impl Autocomplete for HistoryCompleter {
    fn get_suggestions(&mut self, input: &str) -> Result<Vec<String>, CustomUserError> {
        if input.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .0
            .iter()
            .filter(|line| line.starts_with(input))
            .take(10)
            .cloned()
            .collect())
    }

    fn get_completion(
        &mut self,
        _: &str,
        highlighted: Option<String>,
    ) -> Result<Replacement, CustomUserError> {
        Ok(highlighted)
    }
}

/// What a shell line asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolved {
    Help,

    /// Command line, without binary name.
    Command(Vec<String>),

    /// Task text.
    Task(String),
}

/// Decide what a shell line asks for.
pub fn resolve(line: &str) -> Resolved {
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Resolved::Task(String::new());
    };

    match SHELL_COMMANDS.iter().find(|(name, _)| name.starts_with(first)) {
        Some(("help", _)) => Resolved::Help,
        Some((_, expansion)) => {
            let mut argv = expansion.iter().map(|arg| arg.to_string()).collect::<Vec<_>>();
            argv.extend(words.map(str::to_string));
            Resolved::Command(argv)
        }
        None => Resolved::Task(line.trim().to_string()),
    }
}

/// Help text listing shell commands.
pub fn help() -> String {
    let commands = SHELL_COMMANDS
        .iter()
        .map(|(name, _)| format!("  {name}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Available commands:\n{commands}\n\nQuit by pressing Ctrl+D or Ctrl+C.")
}

#[derive(Debug, Parser)]
#[command(name = "tcollect", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Command,
}

/// Run shell until the user quits.
///
/// # Errors
///
/// - Return [`CommandError::Prompt`] if terminal cannot be read.
/// - Return [`CommandError::Session`] if history cannot be saved.
pub fn run<T: Transport, E: Editor>(
    app: &mut App<T, E>,
    prompt: &mut impl Prompt,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    if let Err(err) = app.session_mut().load_history() {
        warn!("starting without history: {err}");
    }

    for line in app.shell_banner() {
        writeln!(out, "{line}")?;
    }

    loop {
        let thread = app.session().thread.clone();
        let label = match thread.as_str() {
            "Inbox" => "> ".to_string(),
            other => format!("({other}) > "),
        };

        let Some(line) = prompt.read_line(&label, app.session().history())? else {
            writeln!(out, "Exiting...")?;
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        app.session_mut().push_history(&line);

        let result = match resolve(&line) {
            Resolved::Help => {
                writeln!(out, "{}", help())?;
                continue;
            }
            Resolved::Command(argv) => match ShellLine::try_parse_from(argv) {
                Ok(parsed) => app.run(parsed.command, out),
                Err(err) => {
                    writeln!(out, "{}", err.render())?;
                    continue;
                }
            },
            Resolved::Task(text) => app.task(
                TaskOptions {
                    thread,
                    text: vec![text],
                },
                out,
            ),
        };

        match result {
            Ok(0) => {}
            Ok(code) => writeln!(out, "Command exited with return code {code}")?,
            Err(err) => writeln!(out, "Error: {err}")?,
        }
    }

    app.session().save_history()?;
    Ok(())
}
