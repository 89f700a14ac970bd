//! Where CLI commands send their reads and writes.
//!
//! `Local` goes through `SessionService` on the local SQLite database;
//! `Remote` goes through the REST client. Both implement `SessionEndpoint`,
//! so the draft store and assignment view work the same on either.

use std::collections::BTreeSet;
use std::time::Duration;

use skillcheck_core::repository::endpoint::SessionEndpoint;
use skillcheck_core::repository::session::SessionFilter;
use skillcheck_infra::config::load_global_config;
use skillcheck_infra::filesystem::resolve_data_dir;
use skillcheck_infra::http::remote::RemoteSessionEndpoint;
use skillcheck_types::config::RemoteConfig;
use skillcheck_types::error::SessionError;
use skillcheck_types::session::{
    Baseline, CreateSessionRequest, PersonId, SaveRequest, Session, SessionId, SessionStatus,
    SessionSummary, SkillId,
};

use crate::state::AppState;

pub enum Backend {
    Local(AppState),
    Remote(RemoteSessionEndpoint),
}

impl Backend {
    /// Pick the backend: `--remote` first, then `[remote]` in config.toml,
    /// else the local database.
    pub async fn connect(remote: Option<&str>) -> anyhow::Result<Self> {
        let config = load_global_config(&resolve_data_dir()).await;
        let remote = match (remote, config.remote) {
            (Some(url), configured) => Some(RemoteConfig {
                url: url.to_string(),
                timeout_secs: configured.map(|r| r.timeout_secs).unwrap_or(30),
            }),
            (None, configured) => configured,
        };

        match remote {
            Some(remote) => {
                tracing::debug!(url = %remote.url, "using remote session endpoint");
                let endpoint = RemoteSessionEndpoint::new(
                    &remote.url,
                    Duration::from_secs(remote.timeout_secs),
                )?;
                Ok(Backend::Remote(endpoint))
            }
            None => Ok(Backend::Local(AppState::init().await?)),
        }
    }

    /// Human-readable target, for status lines.
    pub fn describe(&self) -> String {
        match self {
            Backend::Local(state) => state.data_dir.join("skillcheck.db").display().to_string(),
            Backend::Remote(endpoint) => endpoint.base_url().to_string(),
        }
    }

    pub async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<Session, SessionError> {
        match self {
            Backend::Local(state) => state.session_service.create_session(request).await,
            Backend::Remote(endpoint) => endpoint.create_session(&request).await,
        }
    }

    pub async fn list_sessions(
        &self,
        status: Option<SessionStatus>,
        team_id: Option<String>,
    ) -> Result<Vec<Session>, SessionError> {
        match self {
            Backend::Local(state) => {
                let filter = SessionFilter {
                    status,
                    team_id,
                    ..Default::default()
                };
                state.session_service.list_sessions(Some(filter)).await
            }
            Backend::Remote(endpoint) => endpoint.list_sessions(status, team_id.as_deref()).await,
        }
    }

    pub async fn get_session(&self, id: &SessionId) -> Result<Session, SessionError> {
        match self {
            Backend::Local(state) => state.session_service.get_session(id).await,
            Backend::Remote(endpoint) => endpoint.get_session(id).await,
        }
    }

    pub async fn delete_session(&self, id: &SessionId) -> Result<(), SessionError> {
        match self {
            Backend::Local(state) => state.session_service.delete_session(id).await,
            Backend::Remote(endpoint) => endpoint.delete_session(id).await,
        }
    }

    pub async fn summarize(&self, id: &SessionId) -> Result<SessionSummary, SessionError> {
        match self {
            Backend::Local(state) => state.session_service.summarize(id).await,
            Backend::Remote(endpoint) => endpoint.summarize(id).await,
        }
    }
}

impl SessionEndpoint for Backend {
    async fn load_baseline(&self, id: &SessionId) -> Result<Baseline, SessionError> {
        match self {
            Backend::Local(state) => state.session_service.load_baseline(id).await,
            Backend::Remote(endpoint) => endpoint.load_baseline(id).await,
        }
    }

    async fn save_diffs(&self, request: &SaveRequest) -> Result<(), SessionError> {
        match self {
            Backend::Local(state) => state.session_service.save_diffs(request).await,
            Backend::Remote(endpoint) => endpoint.save_diffs(request).await,
        }
    }

    async fn set_assessees(
        &self,
        id: &SessionId,
        assessees: &BTreeSet<PersonId>,
    ) -> Result<(), SessionError> {
        match self {
            Backend::Local(state) => state.session_service.set_assessees(id, assessees).await,
            Backend::Remote(endpoint) => endpoint.set_assessees(id, assessees).await,
        }
    }

    async fn set_skills(
        &self,
        id: &SessionId,
        skills: &BTreeSet<SkillId>,
    ) -> Result<(), SessionError> {
        match self {
            Backend::Local(state) => state.session_service.set_skills(id, skills).await,
            Backend::Remote(endpoint) => endpoint.set_skills(id, skills).await,
        }
    }
}
