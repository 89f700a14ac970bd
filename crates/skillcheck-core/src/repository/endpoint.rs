//! Session endpoint trait: hydration and batch persistence.

use std::collections::BTreeSet;

use skillcheck_types::error::SessionError;
use skillcheck_types::session::{Baseline, PersonId, SaveRequest, SessionId, SkillId};

/// The remote side of a draft store.
///
/// Implementations: `SessionService` (in-process, backed by a repository) and
/// `RemoteSessionEndpoint` in skillcheck-infra (REST client).
pub trait SessionEndpoint: Send + Sync {
    /// Load the last-synced state of a session.
    fn load_baseline(
        &self,
        id: &SessionId,
    ) -> impl std::future::Future<Output = Result<Baseline, SessionError>> + Send;

    /// Apply an ordered batch of diffs to one session, all or nothing.
    fn save_diffs(
        &self,
        request: &SaveRequest,
    ) -> impl std::future::Future<Output = Result<(), SessionError>> + Send;

    /// Replace the assigned assessee set outright.
    fn set_assessees(
        &self,
        id: &SessionId,
        assessees: &BTreeSet<PersonId>,
    ) -> impl std::future::Future<Output = Result<(), SessionError>> + Send;

    /// Replace the assigned skill set outright.
    fn set_skills(
        &self,
        id: &SessionId,
        skills: &BTreeSet<SkillId>,
    ) -> impl std::future::Future<Output = Result<(), SessionError>> + Send;
}
