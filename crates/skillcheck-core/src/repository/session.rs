//! Session repository trait definition.

use std::collections::BTreeSet;

use skillcheck_types::diff::Diff;
use skillcheck_types::error::RepositoryError;
use skillcheck_types::session::{Baseline, PersonId, Session, SessionId, SessionStatus, SkillId};

use super::SortOrder;

/// Filter criteria for listing sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    /// Filter by lifecycle status.
    pub status: Option<SessionStatus>,
    /// Filter by owning team.
    pub team_id: Option<String>,
    /// Sort direction on session date.
    pub sort_order: Option<SortOrder>,
    /// Maximum number of results.
    pub limit: Option<i64>,
    /// Number of results to skip (offset pagination).
    pub offset: Option<i64>,
}

/// Repository trait for session persistence.
///
/// Implementations live in skillcheck-infra (e.g., SqliteSessionRepository).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait SessionRepository: Send + Sync {
    /// Create a new session. Returns the created session.
    fn create(
        &self,
        session: &Session,
    ) -> impl std::future::Future<Output = Result<Session, RepositoryError>> + Send;

    /// Get a session by its unique ID.
    fn get_by_id(
        &self,
        id: &SessionId,
    ) -> impl std::future::Future<Output = Result<Option<Session>, RepositoryError>> + Send;

    /// List sessions with optional filtering, sorting, and pagination.
    fn list(
        &self,
        filter: Option<SessionFilter>,
    ) -> impl std::future::Future<Output = Result<Vec<Session>, RepositoryError>> + Send;

    /// Permanently delete a session with its assignments and checks.
    fn delete(
        &self,
        id: &SessionId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Load the session together with its assignments and checks.
    fn load_baseline(
        &self,
        id: &SessionId,
    ) -> impl std::future::Future<Output = Result<Option<Baseline>, RepositoryError>> + Send;

    /// Apply diffs in order inside a single transaction.
    ///
    /// Either every diff is applied or none is. Returns `NotFound` if the
    /// session does not exist, `NotEditable` if it is no longer a draft when
    /// the transaction starts, and `Conflict` if a check id belongs to a
    /// different session.
    fn apply_diffs(
        &self,
        session_id: &SessionId,
        diffs: &[Diff],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Replace the assessee set of a draft session.
    fn replace_assessees(
        &self,
        session_id: &SessionId,
        assessees: &BTreeSet<PersonId>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Replace the skill set of a draft session.
    fn replace_skills(
        &self,
        session_id: &SessionId,
        skills: &BTreeSet<SkillId>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
