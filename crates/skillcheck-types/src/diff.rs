//! Pending changes against a session's last-synced state.

use serde::{Deserialize, Serialize};

use crate::check::{Check, CheckId};
use crate::session::{PersonId, Session, SkillId};

/// One atomic pending change to a session, its assignments, or its checks.
///
/// Serialized as `{"kind": "add_assessee", "payload": "p1"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum Diff {
    UpdateSession(Session),
    AddAssessee(PersonId),
    RemoveAssessee(PersonId),
    AddSkill(SkillId),
    RemoveSkill(SkillId),
    UpdateCheck(Check),
}

impl Diff {
    /// Stable name of the diff kind, used in logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Diff::UpdateSession(_) => "update_session",
            Diff::AddAssessee(_) => "add_assessee",
            Diff::RemoveAssessee(_) => "remove_assessee",
            Diff::AddSkill(_) => "add_skill",
            Diff::RemoveSkill(_) => "remove_skill",
            Diff::UpdateCheck(_) => "update_check",
        }
    }

    /// The check id this diff targets, if it is a check update.
    pub fn check_id(&self) -> Option<&CheckId> {
        match self {
            Diff::UpdateCheck(check) => Some(&check.id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_wire_format() {
        let diff = Diff::RemoveSkill(SkillId::from("s9"));
        let json = serde_json::to_value(&diff).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "remove_skill", "payload": "s9"}));

        let parsed: Diff = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, diff);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Diff::AddAssessee(PersonId::from("p1")).kind(), "add_assessee");
        assert_eq!(Diff::AddSkill(SkillId::from("s1")).kind(), "add_skill");
    }

    #[test]
    fn test_check_id_only_for_check_updates() {
        let check = Check::unassessed(SkillId::from("s1"), PersonId::from("a1"));
        let id = check.id;
        assert_eq!(Diff::UpdateCheck(check).check_id(), Some(&id));
        assert_eq!(Diff::AddAssessee(PersonId::from("a1")).check_id(), None);
    }
}
