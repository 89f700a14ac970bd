//! Session lifecycle CLI commands: create, list, show, complete, discard, delete.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::{Confirm, Input};

use skillcheck_core::draft::{DraftStore, lookup_check};
use skillcheck_core::repository::endpoint::SessionEndpoint;
use skillcheck_core::service::session::summarize_baseline;
use skillcheck_types::check::CompetenceLevel;
use skillcheck_types::session::{Baseline, CreateSessionRequest, SessionStatus};

use super::backend::Backend;
use super::{parse_session_id, spinner};

/// Create a new draft session, prompting for missing fields.
pub async fn create_session(
    backend: &Backend,
    name: Option<String>,
    team: Option<String>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let name = match name {
        Some(n) => n,
        None => Input::<String>::new()
            .with_prompt("Session name")
            .interact_text()?,
    };
    let team_id = match team {
        Some(t) => t,
        None => Input::<String>::new().with_prompt("Team").interact_text()?,
    };
    let date = match date {
        Some(d) => Some(
            d.parse::<NaiveDate>()
                .map_err(|e| anyhow::anyhow!("invalid date '{d}': {e}"))?,
        ),
        None => None,
    };

    let session = backend
        .create_session(CreateSessionRequest {
            team_id,
            name,
            date,
        })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
        return Ok(());
    }

    println!();
    println!("  {} Session created", style("✓").green().bold());
    println!();
    println!("  {}  {}", style("Name:").bold(), style(&session.name).cyan());
    println!("  {}  {}", style("Team:").bold(), session.team_id);
    println!("  {}  {}", style("Date:").bold(), session.date);
    println!("  {}    {}", style("ID:").bold(), style(session.id).dim());
    println!();
    println!(
        "  Add people and skills: {}",
        style(format!("skc assign assessees {} <ids..>", session.id)).yellow()
    );
    println!();

    Ok(())
}

/// List sessions in a table.
pub async fn list_sessions(
    backend: &Backend,
    status: Option<String>,
    team: Option<String>,
    json: bool,
) -> Result<()> {
    let status = match status {
        Some(s) => Some(s.parse::<SessionStatus>().map_err(|e| anyhow::anyhow!(e))?),
        None => None,
    };

    let sessions = backend.list_sessions(status, team).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!(
            "  {} No sessions found. Create one with: {}",
            style("i").blue().bold(),
            style("skc session create").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Date").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Team").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("ID").fg(Color::White),
    ]);

    for session in &sessions {
        table.add_row(vec![
            Cell::new(session.date),
            Cell::new(&session.name).fg(Color::Cyan),
            Cell::new(&session.team_id),
            status_cell(session.status),
            Cell::new(session.id).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} session{}",
        style(sessions.len()).bold(),
        if sessions.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Show a session's details and its latest result per assessee and skill.
pub async fn show_session(backend: &Backend, id: &str, json: bool) -> Result<()> {
    let id = parse_session_id(id)?;
    let baseline = backend.load_baseline(&id).await?;
    let summary = summarize_baseline(&baseline);

    if json {
        let out = serde_json::json!({ "baseline": baseline, "summary": summary });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let session = &baseline.session;
    println!();
    println!("  {}", style(&session.name).cyan().bold());
    println!();
    println!("  {}", style("── Details ──").dim());
    println!("  {}    {}", style("Team:").bold(), session.team_id);
    println!("  {}    {}", style("Date:").bold(), session.date);
    println!("  {}  {}", style("Status:").bold(), session.status);
    println!("  {}      {}", style("ID:").bold(), style(session.id).dim());
    println!();

    if baseline.assessee_ids.is_empty() || baseline.skill_ids.is_empty() {
        println!(
            "  {} No assessees or skills assigned yet.",
            style("i").blue().bold()
        );
        println!();
        return Ok(());
    }

    println!("  {}", style("── Results ──").dim());
    println!("{}", results_table(&baseline));
    println!();
    println!(
        "  {} of {} assessed, {} passed",
        style(summary.assessed_count).bold(),
        summary.assessee_count * summary.skill_count,
        style(summary.pass_count).green().bold()
    );
    println!();

    Ok(())
}

/// One row per assessee, one column per skill, latest result in each cell.
fn results_table(baseline: &Baseline) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![Cell::new("Assessee").fg(Color::White)];
    header.extend(
        baseline
            .skill_ids
            .iter()
            .map(|s| Cell::new(s).fg(Color::White)),
    );
    table.set_header(header);

    for assessee in &baseline.assessee_ids {
        let mut row = vec![Cell::new(assessee).fg(Color::Cyan)];
        for skill in &baseline.skill_ids {
            let check = lookup_check(&baseline.checks, skill, assessee);
            row.push(level_cell(check.result));
        }
        table.add_row(row);
    }
    table
}

fn level_cell(level: CompetenceLevel) -> Cell {
    let cell = Cell::new(level);
    match level {
        CompetenceLevel::HighlyConfident => cell.fg(Color::Green),
        CompetenceLevel::Competent => cell.fg(Color::DarkGreen),
        CompetenceLevel::NotCompetent => cell.fg(Color::Red),
        CompetenceLevel::NotTaught => cell.fg(Color::Yellow),
        CompetenceLevel::NotAssessed => cell.fg(Color::DarkGrey),
    }
}

fn status_cell(status: SessionStatus) -> Cell {
    match status {
        SessionStatus::Draft => Cell::new("● draft").fg(Color::Yellow),
        SessionStatus::Complete => Cell::new("✓ complete").fg(Color::Green),
        SessionStatus::Discard => Cell::new("◌ discard").fg(Color::DarkGrey),
    }
}

/// Close a draft session as complete or discarded.
///
/// The status change goes through a draft store so it is saved as an
/// `UpdateSession` diff like any other edit.
pub async fn change_status(
    backend: &Backend,
    id: &str,
    target: SessionStatus,
    force: bool,
    json: bool,
) -> Result<()> {
    let id = parse_session_id(id)?;
    let mut store = DraftStore::from_baseline(backend.load_baseline(&id).await?);

    let Some(mut session) = store.session().cloned() else {
        bail!("session {id} did not load");
    };
    if session.status != SessionStatus::Draft {
        bail!("session '{}' is already {}", session.name, session.status);
    }

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Mark '{}' as {target}? It cannot be edited afterwards.",
                style(&session.name).bold()
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    session.status = target;
    store.update_session(session);

    let progress = spinner(format!("Saving {} on {}...", target, backend.describe()))?;
    let outcome = store.save(backend).await;
    progress.finish_and_clear();
    outcome?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "id": id, "status": target })
        );
    } else {
        println!("  {} Session is now {}.", style("✓").green().bold(), target);
    }
    Ok(())
}

/// Delete a session permanently with confirmation.
pub async fn delete_session(backend: &Backend, id: &str, force: bool, json: bool) -> Result<()> {
    let id = parse_session_id(id)?;
    let session = backend.get_session(&id).await?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Permanently delete session '{}' and all its results?",
                style(&session.name).red().bold()
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let progress = spinner(format!("Deleting {}...", session.name))?;
    let outcome = backend.delete_session(&id).await;
    progress.finish_and_clear();
    outcome?;

    if json {
        println!("{}", serde_json::json!({ "deleted": true, "id": id }));
    } else {
        println!(
            "  {} Session '{}' deleted.",
            style("✓").red().bold(),
            session.name
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use skillcheck_types::check::{Check, CheckId};
    use skillcheck_types::session::{PersonId, Session, SessionId, SkillId};

    #[test]
    fn test_results_table_has_row_per_assessee() {
        let session = Session {
            id: SessionId::new(),
            team_id: "team-1".to_string(),
            name: "Ropes".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
            status: SessionStatus::Draft,
        };
        let mut baseline = Baseline::empty(session);
        baseline.assessee_ids = ["ana", "ben"].into_iter().map(PersonId::from).collect();
        baseline.skill_ids = ["knots"].into_iter().map(SkillId::from).collect();
        let check = Check {
            id: CheckId::new(),
            skill_id: SkillId::from("knots"),
            assessee_id: PersonId::from("ana"),
            result: CompetenceLevel::Competent,
            notes: String::new(),
            timestamp: Utc::now(),
        };
        baseline.checks.insert(check.id, check);

        let rendered = results_table(&baseline).to_string();
        assert!(rendered.contains("ana"));
        assert!(rendered.contains("ben"));
        assert!(rendered.contains("competent"));
        assert!(rendered.contains("not_assessed"));
    }
}
