// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{
    created, daily_url, fill_section, set_line, RecordingTransport, ScriptedEditor, Workspace,
    BASE_URL,
};

use anyhow::Result;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::{json, Value as Json};
use std::fs;
use tcollect::{
    client::ApiResponse,
    commands::{
        Command, JournalOptions, ObservationOptions, QueueCommand, ReflectOptions, TaskOptions,
        UpdateOptions,
    },
    queue::{DeadLetter, LetterMeta},
    record::RecordKind,
};

fn journal() -> JournalOptions {
    JournalOptions {
        thread: "Daily".into(),
        ..JournalOptions::default()
    }
}

fn output(out: Vec<u8>) -> Result<String> {
    Ok(String::from_utf8(out)?)
}

#[test]
fn blank_comment_sends_nothing() -> Result<()> {
    let workspace = Workspace::new()?;
    let transport = RecordingTransport::default();
    let editor = ScriptedEditor::default();
    let mut app = workspace.app(&transport, &editor);

    let mut out = Vec::new();
    let code = app.run(Command::Journal(journal()), &mut out)?;

    assert_eq!(code, 0);
    assert_eq!(
        output(out)?,
        "No changes were made to the Comment field.\n"
    );
    assert!(transport.posted().is_empty());

    Ok(())
}

#[test]
fn journal_draft_shows_metadata() -> Result<()> {
    let workspace = Workspace::new()?;
    let transport = RecordingTransport::default();
    let editor = ScriptedEditor::default();
    let mut app = workspace.app(&transport, &editor);

    let opts = JournalOptions {
        tags: Some("running, health".into()),
        ..journal()
    };
    app.run(Command::Journal(opts), &mut Vec::new())?;

    let seen = editor.seen();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].starts_with(
        "> Thread: Daily\n> Published: 2024-05-01 21:15:00\n> Tags: running, health\n"
    ));
    assert!(seen[0].contains("# Comment"));

    Ok(())
}

#[test]
fn journal_submission_echoes_and_links() -> Result<()> {
    let workspace = Workspace::new()?;
    let echo = json!({
        "id": 12,
        "thread": "Daily",
        "published": "2024-05-01 21:15:00",
        "tags": ["running"],
        "comment": "Ran 5k.",
    });
    let transport = RecordingTransport::answering([created(&echo.to_string())]);
    let editor = ScriptedEditor::default()
        .then(|text| fill_section(text, "# Comment", "Ran 5k.\nFelt good."));
    let mut app = workspace.app(&transport, &editor);

    let opts = JournalOptions {
        tags: Some("running".into()),
        ..journal()
    };
    let mut out = Vec::new();
    let code = app.run(Command::Journal(opts), &mut out)?;
    assert_eq!(code, 0);

    let posted = transport.posted();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].0, format!("{BASE_URL}/journal/"));
    assert_eq!(
        posted[0].1,
        json!({
            "comment": "Ran 5k.\r\nFelt good.",
            "thread": "Daily",
            "published": "2024-05-01 21:15:00",
            "tags": ["running"],
        })
    );

    let out = output(out)?;
    assert!(out.contains("> Thread: Daily\n"));
    assert!(out.ends_with(&format!("See more:\n- {BASE_URL}/\n")));

    // INVARIANT: Submitted drafts are cleaned up.
    let drafts = fs::read_dir(workspace.path())?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "md"))
        .count();
    assert_eq!(drafts, 0);

    Ok(())
}

#[test]
fn edited_tags_are_split() -> Result<()> {
    let workspace = Workspace::new()?;
    let transport = RecordingTransport::answering([created("{}")]);
    let editor = ScriptedEditor::default().then(|text| {
        let text = set_line(text, "> Tags:", "> Tags: work, , deep focus ,");
        fill_section(&text, "# Comment", "Long day.")
    });
    let mut app = workspace.app(&transport, &editor);

    app.run(Command::Journal(journal()), &mut Vec::new())?;

    let posted = transport.posted();
    assert_eq!(posted[0].1["tags"], json!(["work", "deep focus"]));

    Ok(())
}

#[test]
fn unreachable_service_queues_submission() -> Result<()> {
    let workspace = Workspace::new()?;
    let transport = RecordingTransport::default();
    let editor = ScriptedEditor::default()
        .then(|text| fill_section(text, "# Comment", "Offline thoughts."));
    let mut app = workspace.app(&transport, &editor);

    let mut out = Vec::new();
    let code = app.run(Command::Journal(journal()), &mut out)?;
    assert_eq!(code, 2);

    let pending = app.queue().pending()?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].kind, Some(RecordKind::Journal));
    assert!(pending[0].name.ends_with("_journal.json"));

    let letter: DeadLetter = serde_json::from_str(&fs::read_to_string(&pending[0].path)?)?;
    assert_eq!(letter.meta, LetterMeta::new(format!("{BASE_URL}/journal/")));
    assert_eq!(letter.payload["comment"], "Offline thoughts.");

    let out = output(out)?;
    assert_eq!(
        out,
        format!(
            "Error: Connection failed.\nYour update was saved at {}.\n\
             It will be sent next time you run this program.\n",
            pending[0].name
        )
    );

    Ok(())
}

#[test]
fn queued_letters_go_out_before_new_submission() -> Result<()> {
    let workspace = Workspace::new()?;
    let transport = RecordingTransport::answering([created("{}"), created("{}")]);
    let editor = ScriptedEditor::default()
        .then(|text| fill_section(text, "# Comment", "Back online."));
    let mut app = workspace.app(&transport, &editor);

    let stale = json!({"comment": "From the train.", "observation": 3});
    app.queue().enqueue(
        &stale,
        LetterMeta::new(format!("{BASE_URL}/updates/")),
        RecordKind::Update,
    )?;

    let code = app.run(Command::Journal(journal()), &mut Vec::new())?;
    assert_eq!(code, 0);

    let posted = transport.posted();
    let urls = posted.iter().map(|(url, _)| url.as_str()).collect::<Vec<_>>();
    assert_eq!(
        urls,
        vec![
            format!("{BASE_URL}/updates/"),
            format!("{BASE_URL}/journal/")
        ]
    );
    assert_eq!(posted[0].1, stale);
    assert!(app.queue().pending()?.is_empty());

    Ok(())
}

#[test]
fn failed_flush_still_queues_new_submission() -> Result<()> {
    let workspace = Workspace::new()?;
    let transport = RecordingTransport::default();
    let editor = ScriptedEditor::default()
        .then(|text| fill_section(text, "# Comment", "Still offline."));
    let mut app = workspace.app(&transport, &editor);

    app.queue().enqueue(
        &json!({"comment": "first"}),
        LetterMeta::new(format!("{BASE_URL}/journal/")),
        RecordKind::Journal,
    )?;

    let mut out = Vec::new();
    let code = app.run(Command::Journal(journal()), &mut out)?;
    assert_eq!(code, 2);
    assert_eq!(app.queue().pending()?.len(), 2);
    assert!(output(out)?.contains("Error: Failed to send queue\n"));

    Ok(())
}

#[test]
fn rejected_letter_stays_queued_while_new_submission_goes_out() -> Result<()> {
    let workspace = Workspace::new()?;
    let transport = RecordingTransport::answering([
        ApiResponse::new(400, r#"{"comment":["bad"]}"#),
        created(r#"{"comment": "Fresh start."}"#),
    ]);
    let editor = ScriptedEditor::default()
        .then(|text| fill_section(text, "# Comment", "Fresh start."));
    let mut app = workspace.app(&transport, &editor);

    let stale = json!({"comment": "x"});
    let name = app.queue().enqueue(
        &stale,
        LetterMeta::new(format!("{BASE_URL}/journal/")),
        RecordKind::Journal,
    )?;

    let mut out = Vec::new();
    let code = app.run(Command::Journal(journal()), &mut out)?;
    assert_eq!(code, 0);

    let posted = transport.posted();
    assert_eq!(posted.len(), 2);
    assert_eq!(posted[0].1, stale);
    assert_eq!(posted[1].1["comment"], "Fresh start.");

    let pending = app.queue().pending()?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].name, name);

    let out = output(out)?;
    assert!(out.starts_with("{\n    \"comment\": [\n        \"bad\"\n    ]\n}\n"));
    assert!(out.contains("Error: Failed to send queue\n"));

    Ok(())
}

#[test]
fn queue_lists_letters_in_order() -> Result<()> {
    let workspace = Workspace::new()?;
    let transport = RecordingTransport::default();
    let editor = ScriptedEditor::default();
    let mut app = workspace.app(&transport, &editor);

    let early = NaiveDate::from_ymd_opt(2024, 5, 1)
        .and_then(|date| date.and_hms_opt(8, 0, 0))
        .unwrap_or_default();
    let late = NaiveDate::from_ymd_opt(2024, 5, 2)
        .and_then(|date| date.and_hms_opt(8, 0, 0))
        .unwrap_or_default();
    let meta = LetterMeta::new(format!("{BASE_URL}/journal/"));
    let payload = Json::Null;

    app.queue().enqueue_at(&payload, meta.clone(), RecordKind::Journal, late)?;
    for _ in 0..11 {
        app.queue().enqueue_at(&payload, meta.clone(), RecordKind::Update, early)?;
    }

    let mut out = Vec::new();
    app.run(Command::Queue(QueueCommand::List), &mut out)?;
    let out = output(out)?;
    let names = out
        .lines()
        .map(|line| line.split_whitespace().next().unwrap_or_default())
        .collect::<Vec<_>>();

    let mut expect = vec!["2024-05-01_080000_update.json".to_string()];
    expect.extend((1..=10).map(|n| format!("2024-05-01_080000_update-{n}.json")));
    expect.push("2024-05-02_080000_journal.json".into());
    assert_eq!(names, expect);
    assert!(out.lines().all(|line| line.ends_with("(update)") || line.ends_with("(journal)")));

    Ok(())
}

#[test]
fn empty_queue_listing() -> Result<()> {
    let workspace = Workspace::new()?;
    let transport = RecordingTransport::default();
    let editor = ScriptedEditor::default();
    let mut app = workspace.app(&transport, &editor);

    let mut out = Vec::new();
    app.run(Command::Queue(QueueCommand::List), &mut out)?;
    assert_eq!(output(out)?, "Queue is empty.\n");

    Ok(())
}

#[test]
fn queue_flush_reports_count() -> Result<()> {
    let workspace = Workspace::new()?;
    let transport = RecordingTransport::answering([created("{}"), created("{}")]);
    let editor = ScriptedEditor::default();
    let mut app = workspace.app(&transport, &editor);

    for kind in [RecordKind::Journal, RecordKind::Observation] {
        app.queue()
            .enqueue(&json!({}), LetterMeta::new(format!("{BASE_URL}/{kind}/")), kind)?;
    }

    let mut out = Vec::new();
    app.run(Command::Queue(QueueCommand::Flush), &mut out)?;
    assert_eq!(output(out)?, "Sent 2 queued submissions.\n");
    assert!(app.queue().pending()?.is_empty());

    Ok(())
}

#[test]
fn update_without_target_exits_early() -> Result<()> {
    let workspace = Workspace::new()?;
    let transport = RecordingTransport::default();
    let editor = ScriptedEditor::default();
    let mut app = workspace.app(&transport, &editor);

    let mut out = Vec::new();
    let code = app.run(Command::Update(UpdateOptions::default()), &mut out)?;
    assert_eq!(code, 1);
    assert!(editor.seen().is_empty());
    assert!(transport.posted().is_empty());

    Ok(())
}

#[test]
fn update_uses_saved_observation() -> Result<()> {
    let workspace = Workspace::new()?;
    workspace.session().save_observation_id(7)?;
    let transport = RecordingTransport::answering([created(r#"{"id": 40, "observation": 7}"#)]);
    let editor = ScriptedEditor::default()
        .then(|text| fill_section(text, "# Comment (2024-05-01 21:15)", "Resolved."));
    let mut app = workspace.app(&transport, &editor);

    let code = app.run(Command::Update(UpdateOptions::default()), &mut Vec::new())?;
    assert_eq!(code, 0);

    let posted = transport.posted();
    assert_eq!(posted[0].0, format!("{BASE_URL}/updates/"));
    assert_eq!(posted[0].1, json!({"comment": "Resolved.", "observation": 7}));
    assert_eq!(workspace.session().saved_observation_id()?, Some(7));

    Ok(())
}

#[test]
fn saved_observation_becomes_update_target() -> Result<()> {
    let workspace = Workspace::new()?;
    let transport = RecordingTransport::answering([
        created(r#"{"id": 31, "situation": "Standup ran long."}"#),
        created(r#"{"id": 41, "observation": 31}"#),
    ]);
    let editor = ScriptedEditor::default()
        .then(|text| fill_section(text, "# Situation", "Standup ran long."))
        .then(|text| fill_section(text, "# Comment", "Timeboxed it."));
    let mut app = workspace.app(&transport, &editor);

    let opts = ObservationOptions {
        save: true,
        thread: "big-picture".into(),
        kind: "observation".into(),
        ..ObservationOptions::default()
    };
    app.run(Command::Observation(opts), &mut Vec::new())?;
    app.run(Command::Update(UpdateOptions::default()), &mut Vec::new())?;

    let posted = transport.posted();
    assert_eq!(posted[0].0, format!("{BASE_URL}/observation-api/"));
    assert_eq!(posted[0].1["pub_date"], "2024-05-01");
    assert_eq!(posted[0].1["type"], "observation");
    assert_eq!(posted[1].1["observation"], 31);

    Ok(())
}

#[test]
fn reflection_is_journaled() -> Result<()> {
    let workspace = Workspace::new()?;
    let transport = RecordingTransport::answering([created("{}")]);
    let editor = ScriptedEditor::default()
        .then(|text| text.replacen("- [ ]", "- [x] shipped the release", 1));
    let mut app = workspace.app(&transport, &editor);

    let code = app.run(Command::Reflect(ReflectOptions::default()), &mut Vec::new())?;
    assert_eq!(code, 0);

    let seen = editor.seen();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].starts_with("# Reflection"));
    assert!(seen[1].contains("- [x] shipped the release"));

    let posted = transport.posted();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].0, format!("{BASE_URL}/journal/"));
    assert_eq!(posted[0].1["comment"], "- [x] shipped the release");
    assert_eq!(posted[0].1["thread"], "Daily");
    assert_eq!(posted[0].1["reflection"], true);

    Ok(())
}

#[test]
fn reflection_keeps_time_of_given_date() -> Result<()> {
    let workspace = Workspace::new()?;
    let transport = RecordingTransport::answering([created("{}")]);
    let editor = ScriptedEditor::default()
        .then(|text| text.replacen("- [ ]", "- [x] late walk", 1));
    let mut app = workspace.app(&transport, &editor);

    let opts = ReflectOptions {
        date: Some("2024-04-20 21:00".into()),
        ..ReflectOptions::default()
    };
    let code = app.run(Command::Reflect(opts), &mut Vec::new())?;
    assert_eq!(code, 0);

    let posted = transport.posted();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].1["published"], "2024-04-20 21:00:00");
    assert!(editor.seen()[0].starts_with("# Reflection (2024-04-20)"));

    Ok(())
}

#[test]
fn reflection_draft_digests_the_day() -> Result<()> {
    let feed = r#"{
        "date": "2024-05-01",
        "events": [
            {"resourcetype": "JournalAdded", "published": "2024-05-01T18:05:00", "comment": "Walked home.", "tags": []}
        ],
        "plan": {"id": 4, "pub_date": "2024-05-01", "focus": "ship release", "want": ""},
        "reflection": {"id": 9, "pub_date": "2024-05-01", "good": "stretched", "better": "", "best": ""}
    }"#;
    let workspace = Workspace::new()?;
    let transport = RecordingTransport::answering([created("{}")])
        .serving(daily_url("2024-05-01", "Daily"), feed);
    let editor = ScriptedEditor::default()
        .then(|text| text.replace("- [ ] stretched", "- [x] stretched"));
    let mut app = workspace.app(&transport, &editor);

    let code = app.run(Command::Reflect(ReflectOptions::default()), &mut Vec::new())?;
    assert_eq!(code, 0);

    let draft = &editor.seen()[0];
    assert!(draft.starts_with("# Reflection (2024-05-01)\n\n- [ ] stretched\n"));
    assert!(draft.contains("# Plans\n\n- [ ] ship release\n"));
    assert!(draft.contains("# Journals\n\n### (Wed) 18:05\n\nWalked home.\n"));

    let posted = transport.posted();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].1["comment"], "- [x] stretched");

    Ok(())
}

#[test]
fn missing_days_are_journaled_before_reflecting() -> Result<()> {
    let reflected = r#"{
        "date": "2024-04-29",
        "events": [],
        "plan": null,
        "reflection": {"id": 9, "pub_date": "2024-04-29", "good": "rested", "better": "", "best": ""}
    }"#;
    let workspace = Workspace::new()?;
    let transport = RecordingTransport::answering([created("{}"), created("{}"), created("{}")])
        .serving(daily_url("2024-04-29", "Daily"), reflected);
    let editor = ScriptedEditor::default()
        .then(|text| fill_section(text, "# Comment", "Caught up on Tuesday."))
        .then(|text| fill_section(text, "# Comment", "Caught up on Wednesday."))
        .then(|text| fill_section(text, "# Reflection", "- [x] long week"));
    let mut app = workspace.app(&transport, &editor);

    let opts = ReflectOptions {
        week: true,
        missing: true,
        ..ReflectOptions::default()
    };
    let mut out = Vec::new();
    let code = app.run(Command::Reflect(opts), &mut out)?;
    assert_eq!(code, 0);

    let out = output(out)?;
    assert!(out.starts_with("Found 2 missing journal entries for past dates.\n"));
    assert!(out.contains("Creating journal entry for 2024-04-30 (Tuesday)...\n"));
    assert!(out.contains("Creating journal entry for 2024-05-01 (Wednesday)...\n"));

    let posted = transport.posted();
    let published = posted
        .iter()
        .map(|(_, body)| body["published"].as_str().unwrap_or_default())
        .collect::<Vec<_>>();
    assert_eq!(
        published,
        vec!["2024-04-30 00:00:00", "2024-05-01 00:00:00", "2024-05-05 23:59:59"]
    );
    assert_eq!(posted[2].1["thread"], "Weekly");
    assert_eq!(posted[2].1["comment"], "- [x] long week");

    Ok(())
}

#[test]
fn journal_lists_today() -> Result<()> {
    let feed = r#"{
        "date": "2024-05-01",
        "events": [
            {"resourcetype": "JournalAdded", "published": "2024-05-01T08:10:00", "comment": "Coffee first.", "tags": []},
            {"resourcetype": "HabitTracked", "published": "2024-05-01T07:00:00", "note": "", "occured": true, "habit": {"tagname": "running"}}
        ]
    }"#;
    let workspace = Workspace::new()?;
    let transport = RecordingTransport::default().serving(daily_url("2024-05-01", "Daily"), feed);
    let editor = ScriptedEditor::default();
    let mut app = workspace.app(&transport, &editor);

    let opts = JournalOptions {
        today: true,
        ..journal()
    };
    let mut out = Vec::new();
    let code = app.run(Command::Journal(opts), &mut out)?;
    assert_eq!(code, 0);
    assert_eq!(
        output(out)?,
        "# Habits\n\n- #running: 1 times on Wed\n\n# Journals\n\n### (Wed) 08:10\n\nCoffee first.\n"
    );
    assert!(editor.seen().is_empty());
    assert!(transport.posted().is_empty());

    Ok(())
}

#[test]
fn untouched_reflection_sends_nothing() -> Result<()> {
    let workspace = Workspace::new()?;
    let transport = RecordingTransport::default();
    let editor = ScriptedEditor::default();
    let mut app = workspace.app(&transport, &editor);

    let mut out = Vec::new();
    let code = app.run(Command::Reflect(ReflectOptions::default()), &mut out)?;
    assert_eq!(code, 0);
    assert_eq!(output(out)?, "No changes were made to the Reflection field.\n");
    assert!(transport.posted().is_empty());

    Ok(())
}

#[test]
fn task_is_routed_to_thread() -> Result<()> {
    let workspace = Workspace::new()?;
    let transport = RecordingTransport::answering([created("{}")]);
    let editor = ScriptedEditor::default();
    let mut app = workspace.app(&transport, &editor);

    let opts = TaskOptions {
        thread: "Inbox".into(),
        text: vec!["water".into(), "plants".into(), ">".into(), "Home".into()],
    };
    let mut out = Vec::new();
    app.run(Command::Task(opts), &mut out)?;

    let posted = transport.posted();
    assert_eq!(posted[0].0, format!("{BASE_URL}/boards/append/"));
    assert_eq!(posted[0].1, json!({"thread-name": "Home", "text": "water plants"}));
    assert_eq!(
        output(out)?,
        format!("Task added.\nSee more:\n- {BASE_URL}/todo/#/board/Home\n")
    );

    Ok(())
}
