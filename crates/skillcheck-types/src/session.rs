use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::check::{Check, CheckId};
use crate::diff::Diff;

/// Unique identifier for an assessment session, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new SessionId using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create a SessionId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Opaque reference to a person (an assessee) managed outside this system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub String);

impl PersonId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PersonId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque reference to a skill in the organization's skill taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillId(pub String);

impl SkillId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SkillId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One assessment event for a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// Owning team (opaque reference into the organization model).
    pub team_id: String,
    pub name: String,
    pub date: NaiveDate,
    pub status: SessionStatus,
}

/// Session lifecycle states.
///
/// - Draft: editable, the only state in which diffs are accepted
/// - Complete: assessment finished, read-only
/// - Discard: abandoned, read-only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Draft,
    Complete,
    Discard,
}

impl SessionStatus {
    pub fn is_editable(&self) -> bool {
        matches!(self, SessionStatus::Draft)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Draft => write!(f, "draft"),
            SessionStatus::Complete => write!(f, "complete"),
            SessionStatus::Discard => write!(f, "discard"),
        }
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(SessionStatus::Draft),
            "complete" => Ok(SessionStatus::Complete),
            "discard" => Ok(SessionStatus::Discard),
            other => Err(format!("invalid session status: '{other}'")),
        }
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Draft
    }
}

/// Request to create a new session. New sessions always start as drafts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub team_id: String,
    pub name: String,
    /// Defaults to today (UTC) when omitted.
    pub date: Option<NaiveDate>,
}

/// Last-synced state of a session, used to hydrate a draft store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub session: Session,
    #[serde(default)]
    pub assessee_ids: BTreeSet<PersonId>,
    #[serde(default)]
    pub skill_ids: BTreeSet<SkillId>,
    #[serde(default)]
    pub checks: HashMap<CheckId, Check>,
}

impl Baseline {
    /// Baseline for a session with nothing assigned yet.
    pub fn empty(session: Session) -> Self {
        Self {
            session,
            assessee_ids: BTreeSet::new(),
            skill_ids: BTreeSet::new(),
            checks: HashMap::new(),
        }
    }
}

/// One batch of pending diffs for a single session.
///
/// The receiving endpoint applies the diffs in order, all or nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub session_id: SessionId,
    pub diffs: Vec<Diff>,
}

/// Aggregated results for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session: Session,
    pub assessee_count: usize,
    pub skill_count: usize,
    /// Number of (skill, assessee) pairs with a recorded result.
    pub assessed_count: usize,
    /// Number of (skill, assessee) pairs whose latest result is a pass.
    pub pass_count: usize,
    /// Pass count per assigned assessee (zero when nothing passed).
    pub passes_by_assessee: Vec<(PersonId, usize)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_roundtrip() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_session_status_parse_case_insensitive() {
        assert_eq!("Draft".parse::<SessionStatus>().unwrap(), SessionStatus::Draft);
        assert_eq!("COMPLETE".parse::<SessionStatus>().unwrap(), SessionStatus::Complete);
        assert!("archived".parse::<SessionStatus>().is_err());
    }

    #[test]
    fn test_only_draft_is_editable() {
        assert!(SessionStatus::Draft.is_editable());
        assert!(!SessionStatus::Complete.is_editable());
        assert!(!SessionStatus::Discard.is_editable());
    }

    #[test]
    fn test_baseline_deserialize_defaults_empty_sets() {
        let json = serde_json::json!({
            "session": {
                "id": "0190a8c2-5c3e-7b7e-8a5f-1d2b3c4d5e6f",
                "team_id": "team-1",
                "name": "Rope rescue",
                "date": "2026-03-14",
                "status": "draft"
            }
        });
        let baseline: Baseline = serde_json::from_value(json).unwrap();
        assert!(baseline.assessee_ids.is_empty());
        assert!(baseline.skill_ids.is_empty());
        assert!(baseline.checks.is_empty());
        assert_eq!(baseline.session.status, SessionStatus::Draft);
    }

    #[test]
    fn test_person_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&PersonId::from("p1")).unwrap();
        assert_eq!(json, "\"p1\"");
    }
}
