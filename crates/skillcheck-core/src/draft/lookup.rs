//! Resolve the check to display for a (skill, assessee) pair.

use std::collections::HashMap;

use skillcheck_types::check::{Check, CheckId};
use skillcheck_types::session::{PersonId, SkillId};

/// Return the current check for the pair, or a fresh unassessed one.
///
/// If several checks exist for the pair, the latest by timestamp wins (ties
/// broken by the time-sortable check id). The default has `NotAssessed`,
/// empty notes, and a newly generated id.
pub fn lookup_check(
    checks: &HashMap<CheckId, Check>,
    skill_id: &SkillId,
    assessee_id: &PersonId,
) -> Check {
    checks
        .values()
        .filter(|c| &c.skill_id == skill_id && &c.assessee_id == assessee_id)
        .max_by_key(|c| (c.timestamp, c.id))
        .cloned()
        .unwrap_or_else(|| Check::unassessed(skill_id.clone(), assessee_id.clone()))
}
