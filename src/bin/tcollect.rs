// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use tcollect::{
    client::{Credentials, HttpTransport},
    commands::{App, Command},
    config::TasksConfig,
    editor::ExternalEditor,
    path::config_search_path,
    session::Session,
};

use anyhow::Result;
use clap::Parser;
use inquire::Password;
use std::{io::stdout, path::PathBuf, process::exit};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "tcollect [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Log more, repeat for debug output.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Read only this configuration file.
    #[arg(long, value_name = "path", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<i32> {
        let paths = match self.config {
            Some(path) => vec![path],
            None => config_search_path()?,
        };
        let config = TasksConfig::load(paths)?;

        let password = match &config.password {
            Some(password) => password.clone(),
            None => Password::new("Password:").without_confirmation().prompt()?,
        };
        let transport = HttpTransport::new(Credentials::new(&config.user, password))?;
        let session = Session::from_home()?;

        let mut app = App::new(config, transport, ExternalEditor::from_env(), session);
        let code = app.run(self.command, &mut stdout().lock())?;

        Ok(code)
    }
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    match cli.run() {
        Ok(code) => exit(code),
        Err(error) => {
            error!("{error:?}");
            exit(1);
        }
    }
}
