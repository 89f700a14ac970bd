//! Whole-set assignment commands: `skc assign assessees|skills <id> <ids..>`.
//!
//! These bypass the draft log and write straight to the endpoint, with the
//! local view updated optimistically and refetched afterwards.

use std::collections::BTreeSet;
use std::fmt::Display;

use anyhow::Result;
use console::style;

use skillcheck_core::draft::AssignmentView;
use skillcheck_types::session::{PersonId, SkillId};

use super::backend::Backend;
use super::{AssignCommand, parse_session_id, spinner};

pub async fn run_assign(backend: &Backend, action: AssignCommand, json: bool) -> Result<()> {
    match action {
        AssignCommand::Assessees { id, ids } => {
            let id = parse_session_id(&id)?;
            let mut view = AssignmentView::load(backend, id).await?;
            let wanted: BTreeSet<PersonId> = ids.iter().map(|p| PersonId::new(p.as_str())).collect();

            let progress = spinner(format!("Assigning {} assessee(s)...", wanted.len()))?;
            let outcome = view.set_assessees(wanted).await;
            progress.finish_and_clear();

            report("assessees", view.assessees(), json)?;
            outcome?;
        }
        AssignCommand::Skills { id, ids } => {
            let id = parse_session_id(&id)?;
            let mut view = AssignmentView::load(backend, id).await?;
            let wanted: BTreeSet<SkillId> = ids.iter().map(|s| SkillId::new(s.as_str())).collect();

            let progress = spinner(format!("Assigning {} skill(s)...", wanted.len()))?;
            let outcome = view.set_skills(wanted).await;
            progress.finish_and_clear();

            report("skills", view.skills(), json)?;
            outcome?;
        }
    }
    Ok(())
}

/// Print the set as the endpoint now reports it.
fn report<T: Display + serde::Serialize>(label: &str, current: &BTreeSet<T>, json: bool) -> Result<()> {
    if json {
        let mut out = serde_json::Map::new();
        out.insert(label.to_string(), serde_json::to_value(current)?);
        println!("{}", serde_json::Value::Object(out));
        return Ok(());
    }

    println!();
    println!(
        "  {} {} {}",
        style(current.len()).bold(),
        label,
        style("assigned").dim()
    );
    for item in current {
        println!("    {} {}", style("•").dim(), item);
    }
    println!();
    Ok(())
}
