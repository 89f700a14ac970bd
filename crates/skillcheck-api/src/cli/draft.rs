//! Scripted draft editing: `skc draft <id> [edits..]`.
//!
//! Edits are applied to a draft store in a fixed order (session fields,
//! assessees, skills, checks), coalesced by the diff log, then saved as a
//! single batch. `--dry-run` prints the batch without sending it.

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use skillcheck_core::draft::DraftStore;
use skillcheck_core::repository::endpoint::SessionEndpoint;
use skillcheck_types::check::CompetenceLevel;
use skillcheck_types::diff::Diff;
use skillcheck_types::session::{PersonId, SkillId};

use super::backend::Backend;
use super::{parse_session_id, spinner};

#[derive(Args, Debug)]
pub struct DraftArgs {
    /// Session ID.
    pub id: String,

    /// Rename the session.
    #[arg(long)]
    pub name: Option<String>,

    /// Move the session to another date (YYYY-MM-DD).
    #[arg(long)]
    pub date: Option<String>,

    /// Assign an assessee (repeatable).
    #[arg(long, value_name = "PERSON")]
    pub add_assessee: Vec<String>,

    /// Unassign an assessee (repeatable).
    #[arg(long, value_name = "PERSON")]
    pub remove_assessee: Vec<String>,

    /// Assign a skill (repeatable).
    #[arg(long, value_name = "SKILL")]
    pub add_skill: Vec<String>,

    /// Unassign a skill (repeatable).
    #[arg(long, value_name = "SKILL")]
    pub remove_skill: Vec<String>,

    /// Record a result as `SKILL:PERSON=LEVEL[:NOTES]` (repeatable).
    ///
    /// LEVEL is one of not_assessed, not_taught, not_competent, competent,
    /// highly_confident.
    #[arg(long, value_name = "EDIT")]
    pub check: Vec<String>,

    /// Print the coalesced batch without saving it.
    #[arg(long)]
    pub dry_run: bool,
}

/// One parsed `--check` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckEdit {
    pub skill_id: SkillId,
    pub assessee_id: PersonId,
    pub result: CompetenceLevel,
    pub notes: Option<String>,
}

/// Parse `SKILL:PERSON=LEVEL[:NOTES]`. Notes may contain further colons.
pub fn parse_check_edit(raw: &str) -> Result<CheckEdit> {
    let (pair, outcome) = raw
        .split_once('=')
        .with_context(|| format!("check edit '{raw}' is missing '=LEVEL'"))?;
    let (skill, person) = pair
        .split_once(':')
        .with_context(|| format!("check edit '{raw}' must start with SKILL:PERSON"))?;
    let (level, notes) = match outcome.split_once(':') {
        Some((level, notes)) => (level, Some(notes.to_string())),
        None => (outcome, None),
    };

    if skill.trim().is_empty() || person.trim().is_empty() {
        bail!("check edit '{raw}' has an empty skill or person");
    }
    let result = level
        .trim()
        .parse::<CompetenceLevel>()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(CheckEdit {
        skill_id: SkillId::new(skill.trim()),
        assessee_id: PersonId::new(person.trim()),
        result,
        notes,
    })
}

/// Apply every edit in `args` to `store`.
///
/// A check edit overwrites the latest check for its pair when one exists and
/// creates a new one otherwise.
pub fn apply_edits(store: &mut DraftStore, args: &DraftArgs) -> Result<()> {
    let Some(mut session) = store.session().cloned() else {
        bail!("draft store has no session loaded");
    };

    let mut session_changed = false;
    if let Some(name) = &args.name {
        session.name = name.clone();
        session_changed = true;
    }
    if let Some(date) = &args.date {
        session.date = date
            .parse::<NaiveDate>()
            .map_err(|e| anyhow::anyhow!("invalid date '{date}': {e}"))?;
        session_changed = true;
    }
    if session_changed {
        store.update_session(session);
    }

    for person in &args.add_assessee {
        store.add_assessee(PersonId::new(person.as_str()));
    }
    for person in &args.remove_assessee {
        store.remove_assessee(PersonId::new(person.as_str()));
    }
    for skill in &args.add_skill {
        store.add_skill(SkillId::new(skill.as_str()));
    }
    for skill in &args.remove_skill {
        store.remove_skill(SkillId::new(skill.as_str()));
    }

    for raw in &args.check {
        let edit = parse_check_edit(raw)?;
        let mut check = store.check_for(&edit.skill_id, &edit.assessee_id);
        check.result = edit.result;
        if let Some(notes) = edit.notes {
            check.notes = notes;
        }
        check.timestamp = Utc::now();
        store.update_check(check);
    }

    Ok(())
}

/// One-line description of a diff for tables.
pub fn describe_diff(diff: &Diff) -> String {
    match diff {
        Diff::UpdateSession(s) => format!("{} on {} ({})", s.name, s.date, s.status),
        Diff::AddAssessee(p) | Diff::RemoveAssessee(p) => p.to_string(),
        Diff::AddSkill(s) | Diff::RemoveSkill(s) => s.to_string(),
        Diff::UpdateCheck(c) => format!("{} / {} = {}", c.skill_id, c.assessee_id, c.result),
    }
}

/// Run `skc draft`.
pub async fn run_draft(backend: &Backend, args: DraftArgs, json: bool) -> Result<()> {
    let id = parse_session_id(&args.id)?;
    let mut store = DraftStore::from_baseline(backend.load_baseline(&id).await?);
    apply_edits(&mut store, &args)?;

    let diffs: Vec<Diff> = store.diffs().cloned().collect();
    tracing::info!(session_id = %id, diff_count = diffs.len(), dry_run = args.dry_run, "draft edits applied");

    if args.dry_run {
        if json {
            println!("{}", serde_json::to_string_pretty(&diffs)?);
        } else {
            print_diffs(&diffs);
            println!(
                "  {} Dry run: nothing was saved.",
                style("i").blue().bold()
            );
            println!();
        }
        return Ok(());
    }

    if diffs.is_empty() {
        if json {
            println!("{}", serde_json::json!({ "session_id": id, "saved": 0 }));
        } else {
            println!("  {} Nothing to save.", style("i").blue().bold());
        }
        return Ok(());
    }

    let progress = spinner(format!(
        "Saving {} change{}...",
        diffs.len(),
        if diffs.len() == 1 { "" } else { "s" }
    ))?;
    let outcome = store.save(backend).await;
    progress.finish_and_clear();
    outcome?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "session_id": id, "saved": diffs.len(), "status": store.status().to_string() })
        );
    } else {
        print_diffs(&diffs);
        println!(
            "  {} Saved {} change{} to {}.",
            style("✓").green().bold(),
            diffs.len(),
            if diffs.len() == 1 { "" } else { "s" },
            style(backend.describe()).dim()
        );
        println!();
    }
    Ok(())
}

fn print_diffs(diffs: &[Diff]) {
    println!();
    if diffs.is_empty() {
        println!("  {} No changes.", style("i").blue().bold());
        println!();
        return;
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#").fg(Color::White),
        Cell::new("Change").fg(Color::White),
        Cell::new("Target").fg(Color::White),
    ]);
    for (i, diff) in diffs.iter().enumerate() {
        let kind = match diff {
            Diff::AddAssessee(_) | Diff::AddSkill(_) => Cell::new(diff.kind()).fg(Color::Green),
            Diff::RemoveAssessee(_) | Diff::RemoveSkill(_) => Cell::new(diff.kind()).fg(Color::Red),
            Diff::UpdateSession(_) | Diff::UpdateCheck(_) => Cell::new(diff.kind()).fg(Color::Cyan),
        };
        table.add_row(vec![Cell::new(i + 1), kind, Cell::new(describe_diff(diff))]);
    }
    println!("{table}");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillcheck_types::session::{Baseline, Session, SessionId, SessionStatus};

    fn args() -> DraftArgs {
        DraftArgs {
            id: String::new(),
            name: None,
            date: None,
            add_assessee: Vec::new(),
            remove_assessee: Vec::new(),
            add_skill: Vec::new(),
            remove_skill: Vec::new(),
            check: Vec::new(),
            dry_run: true,
        }
    }

    fn loaded_store() -> DraftStore {
        let session = Session {
            id: SessionId::new(),
            team_id: "team-1".to_string(),
            name: "Ropes".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            status: SessionStatus::Draft,
        };
        let mut baseline = Baseline::empty(session);
        baseline.assessee_ids = ["p1", "p2"].into_iter().map(PersonId::from).collect();
        DraftStore::from_baseline(baseline)
    }

    #[test]
    fn test_parse_check_edit_with_notes() {
        let edit = parse_check_edit("knots:ana=highly-confident:clean: no slack").unwrap();
        assert_eq!(edit.skill_id, SkillId::from("knots"));
        assert_eq!(edit.assessee_id, PersonId::from("ana"));
        assert_eq!(edit.result, CompetenceLevel::HighlyConfident);
        assert_eq!(edit.notes.as_deref(), Some("clean: no slack"));
    }

    #[test]
    fn test_parse_check_edit_rejects_malformed() {
        assert!(parse_check_edit("knots:ana").is_err());
        assert!(parse_check_edit("knots=competent").is_err());
        assert!(parse_check_edit(":ana=competent").is_err());
        assert!(parse_check_edit("knots:ana=brilliant").is_err());
    }

    #[test]
    fn test_remove_then_add_coalesces_to_nothing() {
        let mut store = loaded_store();
        let mut a = args();
        a.remove_assessee = vec!["p1".to_string()];
        apply_edits(&mut store, &a).unwrap();
        store.add_assessee(PersonId::from("p1"));

        assert_eq!(store.change_count(), 0);
        assert_eq!(store.assessees().len(), 2);
    }

    #[test]
    fn test_repeated_check_edits_keep_one_diff() {
        let mut store = loaded_store();
        let mut a = args();
        a.check = vec![
            "c1:p1=competent".to_string(),
            "c1:p1=highly_confident".to_string(),
        ];
        apply_edits(&mut store, &a).unwrap();

        let diffs: Vec<&Diff> = store.diffs().collect();
        assert_eq!(diffs.len(), 1);
        match diffs[0] {
            Diff::UpdateCheck(check) => assert_eq!(check.result, CompetenceLevel::HighlyConfident),
            other => panic!("unexpected diff {other:?}"),
        }
        let current = store.check_for(&SkillId::from("c1"), &PersonId::from("p1"));
        assert_eq!(current.result, CompetenceLevel::HighlyConfident);
    }

    #[test]
    fn test_rename_and_redate_is_one_session_update() {
        let mut store = loaded_store();
        let mut a = args();
        a.name = Some("Ropes II".to_string());
        a.date = Some("2026-08-01".to_string());
        apply_edits(&mut store, &a).unwrap();

        let diffs: Vec<&Diff> = store.diffs().collect();
        assert_eq!(diffs.len(), 1);
        assert_eq!(
            describe_diff(diffs[0]),
            "Ropes II on 2026-08-01 (draft)"
        );
    }

    #[test]
    fn test_apply_edits_requires_loaded_store() {
        let mut store = DraftStore::new();
        assert!(apply_edits(&mut store, &args()).is_err());
    }
}
