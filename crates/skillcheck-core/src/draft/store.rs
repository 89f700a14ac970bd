//! Draft store: working copy of one session plus its pending diffs.
//!
//! Status moves `Loading -> Ready -> Saving -> Saved`. Any edit made after a
//! save completes returns the store to `Ready`. Edits made while a save is in
//! flight are queued separately and flushed by the next save; they are never
//! merged into the request already sent.
//!
//! The store is a plain value with a single owner. Construct one per session
//! view and pass it explicitly.

use std::collections::{BTreeSet, HashMap};

use skillcheck_types::check::{Check, CheckId};
use skillcheck_types::diff::Diff;
use skillcheck_types::error::{DraftError, SessionError};
use skillcheck_types::session::{Baseline, PersonId, SaveRequest, Session, SessionId, SkillId};

use super::log::DiffLog;
use super::lookup::lookup_check;
use crate::repository::endpoint::SessionEndpoint;

/// Lifecycle of a draft store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DraftStatus {
    /// No baseline loaded yet.
    #[default]
    Loading,
    /// Editable.
    Ready,
    /// A save request is in flight.
    Saving,
    /// The last save succeeded and nothing has changed since.
    Saved,
}

impl std::fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DraftStatus::Loading => write!(f, "loading"),
            DraftStatus::Ready => write!(f, "ready"),
            DraftStatus::Saving => write!(f, "saving"),
            DraftStatus::Saved => write!(f, "saved"),
        }
    }
}

/// In-memory editable state for one assessment session.
#[derive(Debug, Default)]
pub struct DraftStore {
    status: DraftStatus,
    session: Option<Session>,
    assessees: BTreeSet<PersonId>,
    skills: BTreeSet<SkillId>,
    checks: HashMap<CheckId, Check>,
    /// Diffs not yet persisted. While saving, these are the in-flight diffs.
    pending: DiffLog,
    /// Diffs recorded while a save is in flight.
    queued: DiffLog,
}

impl DraftStore {
    /// Create an empty store in `Loading` status.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already hydrated from `baseline`.
    pub fn from_baseline(baseline: Baseline) -> Self {
        let mut store = Self::new();
        store.reset(baseline);
        store
    }

    /// Hydrate from a baseline.
    ///
    /// Applies only if nothing is loaded or the baseline is for a different
    /// session; hydrating a different session discards all pending edits.
    /// A repeat hydration for the loaded session is ignored so in-progress
    /// edits survive. Returns whether the baseline was applied.
    pub fn init(&mut self, baseline: Baseline) -> bool {
        if let Some(current) = &self.session {
            if current.id == baseline.session.id {
                tracing::debug!(session_id = %current.id, "ignoring repeat hydration");
                return false;
            }
            if self.change_count() > 0 {
                tracing::info!(
                    old_session_id = %current.id,
                    new_session_id = %baseline.session.id,
                    discarded = self.change_count(),
                    "switching session, discarding pending edits"
                );
            }
        }
        self.reset(baseline);
        true
    }

    /// Replace all working state with `baseline` unconditionally, dropping
    /// every pending diff.
    pub fn reset(&mut self, baseline: Baseline) {
        let Baseline {
            session,
            assessee_ids,
            skill_ids,
            checks,
        } = baseline;
        self.session = Some(session);
        self.assessees = assessee_ids;
        self.skills = skill_ids;
        self.checks = checks;
        self.pending.clear();
        self.queued.clear();
        self.status = DraftStatus::Ready;
    }

    // --- Mutators ---

    /// Replace the working session metadata.
    ///
    /// The id is not validated. A session with a different id retargets the
    /// store: the next save sends every pending diff to that session, and a
    /// later `init` for the old id no longer counts as the same session.
    pub fn update_session(&mut self, session: Session) {
        if let Some(current) = &self.session {
            if current.id != session.id {
                tracing::warn!(
                    old_session_id = %current.id,
                    new_session_id = %session.id,
                    pending = self.pending.len(),
                    "session update changes the draft's session id"
                );
            }
        }
        self.session = Some(session.clone());
        self.record(Diff::UpdateSession(session));
    }

    pub fn add_assessee(&mut self, id: PersonId) {
        self.assessees.insert(id.clone());
        self.record(Diff::AddAssessee(id));
    }

    pub fn remove_assessee(&mut self, id: PersonId) {
        self.assessees.remove(&id);
        self.record(Diff::RemoveAssessee(id));
    }

    pub fn add_skill(&mut self, id: SkillId) {
        self.skills.insert(id.clone());
        self.record(Diff::AddSkill(id));
    }

    pub fn remove_skill(&mut self, id: SkillId) {
        self.skills.remove(&id);
        self.record(Diff::RemoveSkill(id));
    }

    /// Insert or replace a check by its id.
    pub fn update_check(&mut self, check: Check) {
        self.checks.insert(check.id, check.clone());
        self.record(Diff::UpdateCheck(check));
    }

    fn record(&mut self, diff: Diff) {
        match self.status {
            DraftStatus::Saving => self.queued.append(diff),
            DraftStatus::Saved => {
                self.status = DraftStatus::Ready;
                self.pending.append(diff);
            }
            DraftStatus::Loading | DraftStatus::Ready => self.pending.append(diff),
        }
    }

    // --- Saving ---

    /// Send all pending diffs to `endpoint` as one batch.
    ///
    /// On success the flushed diffs are dropped and the status becomes
    /// `Saved`. On failure the pending diffs are kept as they were, the
    /// status returns to `Ready`, and the endpoint's error is returned so the
    /// caller can surface it and retry. Working state is never rolled back.
    pub async fn save<E: SessionEndpoint>(&mut self, endpoint: &E) -> Result<(), DraftError> {
        let request = self.begin_save()?;
        if request.diffs.is_empty() {
            tracing::debug!(session_id = %request.session_id, "nothing to save");
            return self.finish_save(Ok(()));
        }

        tracing::info!(
            session_id = %request.session_id,
            diff_count = request.diffs.len(),
            "saving draft"
        );
        let outcome = endpoint.save_diffs(&request).await;
        self.finish_save(outcome)
    }

    /// First half of a save: snapshot the pending diffs into a request.
    ///
    /// Fails with `NotLoaded` if no session was ever loaded (a caller bug),
    /// or `SaveInProgress` if a save has not finished yet.
    pub fn begin_save(&mut self) -> Result<SaveRequest, DraftError> {
        let session_id = self.session.as_ref().map(|s| s.id).ok_or(DraftError::NotLoaded)?;
        if self.status == DraftStatus::Saving {
            return Err(DraftError::SaveInProgress);
        }
        self.status = DraftStatus::Saving;
        Ok(SaveRequest {
            session_id,
            diffs: self.pending.as_slice().to_vec(),
        })
    }

    /// Second half of a save: apply the endpoint's outcome.
    pub fn finish_save(&mut self, outcome: Result<(), SessionError>) -> Result<(), DraftError> {
        if self.status != DraftStatus::Saving {
            return Err(DraftError::NoSaveInFlight);
        }

        match outcome {
            Ok(()) => {
                self.pending = std::mem::take(&mut self.queued);
                self.status = if self.pending.is_empty() {
                    DraftStatus::Saved
                } else {
                    DraftStatus::Ready
                };
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    session_id = ?self.session_id(),
                    pending = self.pending.len(),
                    error = %e,
                    "save rejected, keeping pending diffs"
                );
                for diff in self.queued.take() {
                    self.pending.append(diff);
                }
                self.status = DraftStatus::Ready;
                Err(DraftError::Persist(e))
            }
        }
    }

    // --- Accessors ---

    pub fn status(&self) -> DraftStatus {
        self.status
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn assessees(&self) -> &BTreeSet<PersonId> {
        &self.assessees
    }

    pub fn skills(&self) -> &BTreeSet<SkillId> {
        &self.skills
    }

    pub fn checks(&self) -> &HashMap<CheckId, Check> {
        &self.checks
    }

    /// The check to display for a pair, or a fresh unassessed one.
    pub fn check_for(&self, skill_id: &SkillId, assessee_id: &PersonId) -> Check {
        lookup_check(&self.checks, skill_id, assessee_id)
    }

    /// All unsaved diffs in order, including any queued during a save.
    pub fn diffs(&self) -> impl Iterator<Item = &Diff> {
        self.pending.iter().chain(self.queued.iter())
    }

    /// Number of unsaved diffs. Drives "save enabled" and reset confirmation.
    pub fn change_count(&self) -> usize {
        self.pending.len() + self.queued.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.change_count() > 0
    }
}
