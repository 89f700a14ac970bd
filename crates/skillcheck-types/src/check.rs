use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::session::{PersonId, SkillId};

/// Unique identifier for a recorded check. Generated client-side for new checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckId(pub Uuid);

impl CheckId {
    /// Create a new CheckId using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create a CheckId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for CheckId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CheckId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Result of a single check, ordered from "not yet usable" to "highly capable".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetenceLevel {
    NotAssessed,
    NotTaught,
    NotCompetent,
    Competent,
    HighlyConfident,
}

impl CompetenceLevel {
    pub const ALL: [CompetenceLevel; 5] = [
        CompetenceLevel::NotAssessed,
        CompetenceLevel::NotTaught,
        CompetenceLevel::NotCompetent,
        CompetenceLevel::Competent,
        CompetenceLevel::HighlyConfident,
    ];

    /// Competent and HighlyConfident both count as a pass.
    pub fn is_pass(&self) -> bool {
        matches!(self, CompetenceLevel::Competent | CompetenceLevel::HighlyConfident)
    }

    /// Whether an assessor has recorded anything beyond the default.
    pub fn is_assessed(&self) -> bool {
        !matches!(self, CompetenceLevel::NotAssessed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompetenceLevel::NotAssessed => "not_assessed",
            CompetenceLevel::NotTaught => "not_taught",
            CompetenceLevel::NotCompetent => "not_competent",
            CompetenceLevel::Competent => "competent",
            CompetenceLevel::HighlyConfident => "highly_confident",
        }
    }
}

impl fmt::Display for CompetenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompetenceLevel {
    type Err = String;

    /// Accepts snake_case, kebab-case, or the bare words ("HighlyConfident").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "notassessed" => Ok(CompetenceLevel::NotAssessed),
            "nottaught" => Ok(CompetenceLevel::NotTaught),
            "notcompetent" => Ok(CompetenceLevel::NotCompetent),
            "competent" => Ok(CompetenceLevel::Competent),
            "highlyconfident" => Ok(CompetenceLevel::HighlyConfident),
            _ => Err(format!("invalid competence level: '{s}'")),
        }
    }
}

impl Default for CompetenceLevel {
    fn default() -> Self {
        CompetenceLevel::NotAssessed
    }
}

/// One recorded assessment result for an assessee against a skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub id: CheckId,
    pub skill_id: SkillId,
    pub assessee_id: PersonId,
    pub result: CompetenceLevel,
    #[serde(default)]
    pub notes: String,
    pub timestamp: DateTime<Utc>,
}

impl Check {
    /// A fresh, unassessed check for a (skill, assessee) pair.
    pub fn unassessed(skill_id: SkillId, assessee_id: PersonId) -> Self {
        Self {
            id: CheckId::new(),
            skill_id,
            assessee_id,
            result: CompetenceLevel::NotAssessed,
            notes: String::new(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(CompetenceLevel::NotAssessed < CompetenceLevel::NotTaught);
        assert!(CompetenceLevel::NotCompetent < CompetenceLevel::Competent);
        assert!(CompetenceLevel::Competent < CompetenceLevel::HighlyConfident);
    }

    #[test]
    fn test_pass_levels() {
        let passes: Vec<_> = CompetenceLevel::ALL.iter().filter(|l| l.is_pass()).collect();
        assert_eq!(
            passes,
            vec![&CompetenceLevel::Competent, &CompetenceLevel::HighlyConfident]
        );
    }

    #[test]
    fn test_parse_accepts_several_spellings() {
        assert_eq!(
            "highly_confident".parse::<CompetenceLevel>().unwrap(),
            CompetenceLevel::HighlyConfident
        );
        assert_eq!(
            "HighlyConfident".parse::<CompetenceLevel>().unwrap(),
            CompetenceLevel::HighlyConfident
        );
        assert_eq!(
            "not-taught".parse::<CompetenceLevel>().unwrap(),
            CompetenceLevel::NotTaught
        );
        assert!("expert".parse::<CompetenceLevel>().is_err());
    }

    #[test]
    fn test_display_matches_serde_name() {
        for level in CompetenceLevel::ALL {
            let json = serde_json::to_string(&level).unwrap();
            assert_eq!(json, format!("\"{level}\""));
        }
    }

    #[test]
    fn test_unassessed_check_defaults() {
        let check = Check::unassessed(SkillId::from("s1"), PersonId::from("a1"));
        assert_eq!(check.result, CompetenceLevel::NotAssessed);
        assert!(check.notes.is_empty());
        assert_eq!(check.skill_id.as_str(), "s1");
    }
}
