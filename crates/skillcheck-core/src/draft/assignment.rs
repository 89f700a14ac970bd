//! Direct assignment of assessees and skills, outside the diff log.
//!
//! Each call replaces the whole set on the endpoint. The cached set is
//! updated optimistically, restored if the endpoint rejects the write, and
//! refetched from the endpoint once the call settles.

use std::collections::BTreeSet;

use skillcheck_types::error::SessionError;
use skillcheck_types::session::{PersonId, SessionId, SkillId};

use super::optimistic::optimistic_update;
use crate::repository::endpoint::SessionEndpoint;

/// Cached assignment sets for one session.
pub struct AssignmentView<'a, E: SessionEndpoint> {
    endpoint: &'a E,
    session_id: SessionId,
    assessees: BTreeSet<PersonId>,
    skills: BTreeSet<SkillId>,
}

impl<'a, E: SessionEndpoint> AssignmentView<'a, E> {
    /// Fetch the current assignments for `session_id`.
    pub async fn load(endpoint: &'a E, session_id: SessionId) -> Result<Self, SessionError> {
        let baseline = endpoint.load_baseline(&session_id).await?;
        Ok(Self {
            endpoint,
            session_id,
            assessees: baseline.assessee_ids,
            skills: baseline.skill_ids,
        })
    }

    pub fn assessees(&self) -> &BTreeSet<PersonId> {
        &self.assessees
    }

    pub fn skills(&self) -> &BTreeSet<SkillId> {
        &self.skills
    }

    /// Replace the assessee set.
    pub async fn set_assessees(&mut self, ids: BTreeSet<PersonId>) -> Result<(), SessionError> {
        let endpoint = self.endpoint;
        let session_id = self.session_id;
        let outcome = optimistic_update(&mut self.assessees, ids, |value| async move {
            endpoint.set_assessees(&session_id, &value).await
        })
        .await;
        self.settle(outcome).await
    }

    /// Replace the skill set.
    pub async fn set_skills(&mut self, ids: BTreeSet<SkillId>) -> Result<(), SessionError> {
        let endpoint = self.endpoint;
        let session_id = self.session_id;
        let outcome = optimistic_update(&mut self.skills, ids, |value| async move {
            endpoint.set_skills(&session_id, &value).await
        })
        .await;
        self.settle(outcome).await
    }

    /// Refetch after a write, whether it succeeded or not. The write's own
    /// error takes precedence over a refetch error.
    async fn settle(&mut self, outcome: Result<(), SessionError>) -> Result<(), SessionError> {
        if let Err(e) = &outcome {
            tracing::warn!(session_id = %self.session_id, error = %e, "assignment rejected, reverted");
        }
        let refreshed = self.refetch().await;
        outcome.and(refreshed)
    }

    async fn refetch(&mut self) -> Result<(), SessionError> {
        let baseline = self.endpoint.load_baseline(&self.session_id).await?;
        self.assessees = baseline.assessee_ids;
        self.skills = baseline.skill_ids;
        Ok(())
    }
}
