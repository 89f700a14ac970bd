//! Session management service.
//!
//! Owns the server-side rules for sessions: creation, listing, hydration,
//! and validation of diff batches before the repository applies them. A
//! batch is checked as a whole first, so a rejected batch never reaches
//! storage.

use std::collections::{BTreeSet, HashMap};

use skillcheck_types::check::Check;
use skillcheck_types::diff::Diff;
use skillcheck_types::error::SessionError;
use skillcheck_types::session::{
    Baseline, CreateSessionRequest, PersonId, SaveRequest, Session, SessionId, SessionStatus,
    SessionSummary, SkillId,
};

use crate::draft::lookup::lookup_check;
use crate::repository::endpoint::SessionEndpoint;
use crate::repository::session::{SessionFilter, SessionRepository};

/// Service orchestrating the session lifecycle.
///
/// Generic over the repository trait to maintain clean architecture --
/// skillcheck-core never depends on skillcheck-infra.
pub struct SessionService<R: SessionRepository> {
    repo: R,
    max_notes_length: usize,
}

impl<R: SessionRepository> SessionService<R> {
    /// Create a new SessionService.
    ///
    /// - `repo`: persistence for sessions, assignments, and checks
    /// - `max_notes_length`: upper bound on check notes, in characters
    pub fn new(repo: R, max_notes_length: usize) -> Self {
        Self {
            repo,
            max_notes_length,
        }
    }

    /// Create a new draft session.
    pub async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<Session, SessionError> {
        let name = validate_name(&request.name)?;
        let team_id = request.team_id.trim().to_string();
        if team_id.is_empty() {
            return Err(SessionError::Validation("team id cannot be empty".to_string()));
        }

        let session = Session {
            id: SessionId::new(),
            team_id,
            name,
            date: request
                .date
                .unwrap_or_else(|| chrono::Utc::now().date_naive()),
            status: SessionStatus::Draft,
        };

        let session = self.repo.create(&session).await?;
        tracing::info!(session_id = %session.id, team_id = %session.team_id, "session created");
        Ok(session)
    }

    /// Get a session by ID.
    pub async fn get_session(&self, id: &SessionId) -> Result<Session, SessionError> {
        self.repo.get_by_id(id).await?.ok_or(SessionError::NotFound)
    }

    /// List sessions with optional filtering.
    pub async fn list_sessions(
        &self,
        filter: Option<SessionFilter>,
    ) -> Result<Vec<Session>, SessionError> {
        Ok(self.repo.list(filter).await?)
    }

    /// Permanently delete a session with its assignments and checks.
    pub async fn delete_session(&self, id: &SessionId) -> Result<(), SessionError> {
        self.get_session(id).await?;
        self.repo.delete(id).await?;
        tracing::info!(session_id = %id, "session deleted");
        Ok(())
    }

    /// Load a session's last-persisted state.
    pub async fn get_baseline(&self, id: &SessionId) -> Result<Baseline, SessionError> {
        self.repo.load_baseline(id).await?.ok_or(SessionError::NotFound)
    }

    /// Validate and apply a batch of diffs, all or nothing.
    ///
    /// Rejects the batch if the session is missing or no longer a draft, if
    /// a session update targets another session or blanks the name, or if
    /// any check's notes are too long. Concurrent batches for one session
    /// are applied in arrival order with no version check.
    ///
    /// The status check here fails fast; the repository repeats it under
    /// its write lock, where a batch queued behind a closing one is refused.
    pub async fn apply_diffs(&self, request: &SaveRequest) -> Result<(), SessionError> {
        let session = self.get_session(&request.session_id).await?;
        if !session.status.is_editable() {
            return Err(SessionError::NotEditable(session.status));
        }

        for diff in &request.diffs {
            self.validate_diff(&request.session_id, diff)?;
        }

        self.repo
            .apply_diffs(&request.session_id, &request.diffs)
            .await?;

        tracing::info!(
            session_id = %request.session_id,
            diff_count = request.diffs.len(),
            "diff batch applied"
        );
        Ok(())
    }

    fn validate_diff(&self, session_id: &SessionId, diff: &Diff) -> Result<(), SessionError> {
        match diff {
            Diff::UpdateSession(session) => {
                if &session.id != session_id {
                    return Err(SessionError::Validation(format!(
                        "session update for {} sent to session {session_id}",
                        session.id
                    )));
                }
                validate_name(&session.name)?;
                Ok(())
            }
            Diff::AddAssessee(id) | Diff::RemoveAssessee(id) => {
                validate_ref("assessee id", id.as_str())
            }
            Diff::AddSkill(id) | Diff::RemoveSkill(id) => validate_ref("skill id", id.as_str()),
            Diff::UpdateCheck(check) => {
                validate_ref("assessee id", check.assessee_id.as_str())?;
                validate_ref("skill id", check.skill_id.as_str())?;
                let len = check.notes.chars().count();
                if len > self.max_notes_length {
                    return Err(SessionError::Validation(format!(
                        "notes for check {} are {len} characters, limit is {}",
                        check.id, self.max_notes_length
                    )));
                }
                Ok(())
            }
        }
    }

    /// Replace the assessee set of a draft session.
    pub async fn replace_assessees(
        &self,
        id: &SessionId,
        assessees: &BTreeSet<PersonId>,
    ) -> Result<(), SessionError> {
        self.ensure_editable(id).await?;
        for person in assessees {
            validate_ref("assessee id", person.as_str())?;
        }
        self.repo.replace_assessees(id, assessees).await?;
        Ok(())
    }

    /// Replace the skill set of a draft session.
    pub async fn replace_skills(
        &self,
        id: &SessionId,
        skills: &BTreeSet<SkillId>,
    ) -> Result<(), SessionError> {
        self.ensure_editable(id).await?;
        for skill in skills {
            validate_ref("skill id", skill.as_str())?;
        }
        self.repo.replace_skills(id, skills).await?;
        Ok(())
    }

    async fn ensure_editable(&self, id: &SessionId) -> Result<Session, SessionError> {
        let session = self.get_session(id).await?;
        if !session.status.is_editable() {
            return Err(SessionError::NotEditable(session.status));
        }
        Ok(session)
    }

    /// Aggregate the latest results of a session.
    pub async fn summarize(&self, id: &SessionId) -> Result<SessionSummary, SessionError> {
        let baseline = self.get_baseline(id).await?;
        Ok(summarize_baseline(&baseline))
    }
}

impl<R: SessionRepository> SessionEndpoint for SessionService<R> {
    async fn load_baseline(&self, id: &SessionId) -> Result<Baseline, SessionError> {
        self.get_baseline(id).await
    }

    async fn save_diffs(&self, request: &SaveRequest) -> Result<(), SessionError> {
        self.apply_diffs(request).await
    }

    async fn set_assessees(
        &self,
        id: &SessionId,
        assessees: &BTreeSet<PersonId>,
    ) -> Result<(), SessionError> {
        self.replace_assessees(id, assessees).await
    }

    async fn set_skills(
        &self,
        id: &SessionId,
        skills: &BTreeSet<SkillId>,
    ) -> Result<(), SessionError> {
        self.replace_skills(id, skills).await
    }
}

fn validate_name(name: &str) -> Result<String, SessionError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(SessionError::Validation(
            "session name cannot be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_ref(what: &str, value: &str) -> Result<(), SessionError> {
    if value.trim().is_empty() {
        return Err(SessionError::Validation(format!("{what} cannot be empty")));
    }
    Ok(())
}

/// Count results over the assigned assessees and skills only.
///
/// Checks for pairs that are no longer assigned stay in storage but do not
/// count towards the summary.
pub fn summarize_baseline(baseline: &Baseline) -> SessionSummary {
    let mut assessed_count = 0;
    let mut pass_count = 0;
    let mut passes: HashMap<&PersonId, usize> = HashMap::new();

    for assessee in &baseline.assessee_ids {
        for skill in &baseline.skill_ids {
            let current: Check = lookup_check(&baseline.checks, skill, assessee);
            if current.result.is_assessed() {
                assessed_count += 1;
            }
            if current.result.is_pass() {
                pass_count += 1;
                *passes.entry(assessee).or_default() += 1;
            }
        }
    }

    SessionSummary {
        session: baseline.session.clone(),
        assessee_count: baseline.assessee_ids.len(),
        skill_count: baseline.skill_ids.len(),
        assessed_count,
        pass_count,
        passes_by_assessee: baseline
            .assessee_ids
            .iter()
            .map(|a| (a.clone(), passes.get(a).copied().unwrap_or(0)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use skillcheck_types::check::{CheckId, CompetenceLevel};
    use skillcheck_types::error::RepositoryError;
    use std::sync::Mutex;

    // --- In-memory repository for testing ---

    #[derive(Default)]
    struct MemoryRepository {
        baselines: Mutex<HashMap<SessionId, Baseline>>,
        applied: Mutex<Vec<Vec<Diff>>>,
    }

    impl MemoryRepository {
        fn with_session(status: SessionStatus) -> (Self, SessionId) {
            let repo = Self::default();
            let session = Session {
                id: SessionId::new(),
                team_id: "team-1".to_string(),
                name: "Night navigation".to_string(),
                date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
                status,
            };
            let id = session.id;
            repo.baselines
                .lock()
                .unwrap()
                .insert(id, Baseline::empty(session));
            (repo, id)
        }
    }

    impl SessionRepository for MemoryRepository {
        async fn create(&self, session: &Session) -> Result<Session, RepositoryError> {
            self.baselines
                .lock()
                .unwrap()
                .insert(session.id, Baseline::empty(session.clone()));
            Ok(session.clone())
        }

        async fn get_by_id(&self, id: &SessionId) -> Result<Option<Session>, RepositoryError> {
            Ok(self.baselines.lock().unwrap().get(id).map(|b| b.session.clone()))
        }

        async fn list(
            &self,
            _filter: Option<SessionFilter>,
        ) -> Result<Vec<Session>, RepositoryError> {
            Ok(self
                .baselines
                .lock()
                .unwrap()
                .values()
                .map(|b| b.session.clone())
                .collect())
        }

        async fn delete(&self, id: &SessionId) -> Result<(), RepositoryError> {
            self.baselines.lock().unwrap().remove(id);
            Ok(())
        }

        async fn load_baseline(&self, id: &SessionId) -> Result<Option<Baseline>, RepositoryError> {
            Ok(self.baselines.lock().unwrap().get(id).cloned())
        }

        async fn apply_diffs(
            &self,
            _session_id: &SessionId,
            diffs: &[Diff],
        ) -> Result<(), RepositoryError> {
            self.applied.lock().unwrap().push(diffs.to_vec());
            Ok(())
        }

        async fn replace_assessees(
            &self,
            session_id: &SessionId,
            assessees: &BTreeSet<PersonId>,
        ) -> Result<(), RepositoryError> {
            let mut baselines = self.baselines.lock().unwrap();
            let baseline = baselines.get_mut(session_id).ok_or(RepositoryError::NotFound)?;
            baseline.assessee_ids = assessees.clone();
            Ok(())
        }

        async fn replace_skills(
            &self,
            session_id: &SessionId,
            skills: &BTreeSet<SkillId>,
        ) -> Result<(), RepositoryError> {
            let mut baselines = self.baselines.lock().unwrap();
            let baseline = baselines.get_mut(session_id).ok_or(RepositoryError::NotFound)?;
            baseline.skill_ids = skills.clone();
            Ok(())
        }
    }

    fn check_with_notes(notes: &str) -> Check {
        Check {
            id: CheckId::new(),
            skill_id: SkillId::from("s1"),
            assessee_id: PersonId::from("a1"),
            result: CompetenceLevel::Competent,
            notes: notes.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_session_trims_and_defaults_to_draft() {
        let service = SessionService::new(MemoryRepository::default(), 100);
        let session = service
            .create_session(CreateSessionRequest {
                team_id: "team-7".to_string(),
                name: "  Swiftwater refresher ".to_string(),
                date: None,
            })
            .await
            .unwrap();
        assert_eq!(session.name, "Swiftwater refresher");
        assert_eq!(session.status, SessionStatus::Draft);
    }

    #[tokio::test]
    async fn test_create_session_rejects_blank_name() {
        let service = SessionService::new(MemoryRepository::default(), 100);
        let err = service
            .create_session(CreateSessionRequest {
                team_id: "team-7".to_string(),
                name: "   ".to_string(),
                date: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
    }

    #[tokio::test]
    async fn test_apply_diffs_passes_batch_through_in_order() {
        let (repo, id) = MemoryRepository::with_session(SessionStatus::Draft);
        let service = SessionService::new(repo, 100);
        let diffs = vec![
            Diff::AddAssessee(PersonId::from("a1")),
            Diff::AddSkill(SkillId::from("s1")),
            Diff::UpdateCheck(check_with_notes("tidy knots")),
        ];

        service
            .apply_diffs(&SaveRequest {
                session_id: id,
                diffs: diffs.clone(),
            })
            .await
            .unwrap();

        assert_eq!(service.repo.applied.lock().unwrap().as_slice(), &[diffs]);
    }

    #[tokio::test]
    async fn test_apply_diffs_rejects_completed_session() {
        let (repo, id) = MemoryRepository::with_session(SessionStatus::Complete);
        let service = SessionService::new(repo, 100);

        let err = service
            .apply_diffs(&SaveRequest {
                session_id: id,
                diffs: vec![Diff::AddAssessee(PersonId::from("a1"))],
            })
            .await
            .unwrap_err();

        assert_eq!(err, SessionError::NotEditable(SessionStatus::Complete));
        assert!(service.repo.applied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_apply_diffs_rejects_missing_session() {
        let service = SessionService::new(MemoryRepository::default(), 100);
        let err = service
            .apply_diffs(&SaveRequest {
                session_id: SessionId::new(),
                diffs: vec![],
            })
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::NotFound);
    }

    #[tokio::test]
    async fn test_apply_diffs_rejects_whole_batch_on_long_notes() {
        let (repo, id) = MemoryRepository::with_session(SessionStatus::Draft);
        let service = SessionService::new(repo, 10);

        let err = service
            .apply_diffs(&SaveRequest {
                session_id: id,
                diffs: vec![
                    Diff::AddAssessee(PersonId::from("a1")),
                    Diff::UpdateCheck(check_with_notes("far more than ten characters")),
                ],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Validation(msg) if msg.contains("limit is 10")));
        assert!(service.repo.applied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_apply_diffs_rejects_foreign_session_update() {
        let (repo, id) = MemoryRepository::with_session(SessionStatus::Draft);
        let service = SessionService::new(repo, 100);
        let mut other = service.get_session(&id).await.unwrap();
        other.id = SessionId::new();

        let err = service
            .apply_diffs(&SaveRequest {
                session_id: id,
                diffs: vec![Diff::UpdateSession(other)],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
    }

    #[tokio::test]
    async fn test_replace_assessees_requires_draft() {
        let (repo, id) = MemoryRepository::with_session(SessionStatus::Discard);
        let service = SessionService::new(repo, 100);
        let set: BTreeSet<PersonId> = [PersonId::from("a1")].into_iter().collect();

        let err = service.replace_assessees(&id, &set).await.unwrap_err();
        assert_eq!(err, SessionError::NotEditable(SessionStatus::Discard));
    }

    #[test]
    fn test_summary_counts_latest_assigned_results() {
        let session = Session {
            id: SessionId::new(),
            team_id: "team-1".to_string(),
            name: "Ropes".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            status: SessionStatus::Complete,
        };
        let mut baseline = Baseline::empty(session);
        baseline.assessee_ids = [PersonId::from("a1"), PersonId::from("a2")].into_iter().collect();
        baseline.skill_ids = [SkillId::from("s1"), SkillId::from("s2")].into_iter().collect();

        let mut add = |skill: &str, assessee: &str, result: CompetenceLevel| {
            let check = Check {
                id: CheckId::new(),
                skill_id: SkillId::from(skill),
                assessee_id: PersonId::from(assessee),
                result,
                notes: String::new(),
                timestamp: Utc::now(),
            };
            baseline.checks.insert(check.id, check);
        };
        add("s1", "a1", CompetenceLevel::Competent);
        add("s2", "a1", CompetenceLevel::HighlyConfident);
        add("s1", "a2", CompetenceLevel::NotCompetent);
        // Not assigned: ignored.
        add("s9", "a2", CompetenceLevel::Competent);

        let summary = summarize_baseline(&baseline);
        assert_eq!(summary.assessee_count, 2);
        assert_eq!(summary.skill_count, 2);
        assert_eq!(summary.assessed_count, 3);
        assert_eq!(summary.pass_count, 2);
        assert_eq!(
            summary.passes_by_assessee,
            vec![(PersonId::from("a1"), 2), (PersonId::from("a2"), 0)]
        );
    }
}
