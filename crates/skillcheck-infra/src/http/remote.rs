//! REST client implementing `SessionEndpoint` against a running `skc serve`.
//!
//! Responses use the server's envelope (`{data, meta, errors, _links}`).
//! Error codes in the envelope are mapped back onto `SessionError` so a
//! draft store behaves the same against a remote server as in-process.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use skillcheck_core::repository::endpoint::SessionEndpoint;
use skillcheck_types::error::SessionError;
use skillcheck_types::session::{
    Baseline, CreateSessionRequest, PersonId, SaveRequest, Session, SessionId, SessionStatus,
    SessionSummary, SkillId,
};

/// Response envelope as sent by the API server.
#[derive(Debug, serde::Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<EnvelopeError>,
}

#[derive(Debug, serde::Deserialize)]
struct EnvelopeError {
    code: String,
    message: String,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

/// Body for `PUT /sessions/{id}/assessees`.
#[derive(Debug, Serialize)]
struct AssesseesBody<'a> {
    assessee_ids: &'a BTreeSet<PersonId>,
}

/// Body for `PUT /sessions/{id}/skills`.
#[derive(Debug, Serialize)]
struct SkillsBody<'a> {
    skill_ids: &'a BTreeSet<SkillId>,
}

/// Remote session endpoint over the `/api/v1` REST API.
pub struct RemoteSessionEndpoint {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteSessionEndpoint {
    /// Create a client for `base_url` (e.g. `http://127.0.0.1:3210`).
    ///
    /// Every request is bounded by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SessionError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The server base URL, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, SessionError> {
        let response = request
            .send()
            .await
            .map_err(|e| SessionError::Transport(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SessionError::Transport(format!("failed to read response: {e}")))?;

        decode_envelope(status.as_u16(), &body)
    }

    /// Create a session on the server.
    pub async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<Session, SessionError> {
        self.send(self.client.post(self.url("/sessions")).json(request))
            .await
    }

    /// List sessions, optionally filtered by status and team.
    pub async fn list_sessions(
        &self,
        status: Option<SessionStatus>,
        team_id: Option<&str>,
    ) -> Result<Vec<Session>, SessionError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(status) = status {
            query.push(("status", status.to_string()));
        }
        if let Some(team_id) = team_id {
            query.push(("team_id", team_id.to_string()));
        }
        self.send(self.client.get(self.url("/sessions")).query(&query))
            .await
    }

    /// Fetch one session.
    pub async fn get_session(&self, id: &SessionId) -> Result<Session, SessionError> {
        self.send(self.client.get(self.url(&format!("/sessions/{id}"))))
            .await
    }

    /// Delete a session with its assignments and checks.
    pub async fn delete_session(&self, id: &SessionId) -> Result<(), SessionError> {
        let _: serde_json::Value = self
            .send(self.client.delete(self.url(&format!("/sessions/{id}"))))
            .await?;
        Ok(())
    }

    /// Fetch the aggregated results of a session.
    pub async fn summarize(&self, id: &SessionId) -> Result<SessionSummary, SessionError> {
        self.send(self.client.get(self.url(&format!("/sessions/{id}/summary"))))
            .await
    }
}

impl SessionEndpoint for RemoteSessionEndpoint {
    async fn load_baseline(&self, id: &SessionId) -> Result<Baseline, SessionError> {
        self.send(self.client.get(self.url(&format!("/sessions/{id}/baseline"))))
            .await
    }

    async fn save_diffs(&self, request: &SaveRequest) -> Result<(), SessionError> {
        tracing::debug!(
            session_id = %request.session_id,
            diff_count = request.diffs.len(),
            base_url = %self.base_url,
            "sending diff batch"
        );
        let url = self.url(&format!("/sessions/{}/diffs", request.session_id));
        let _: serde_json::Value = self.send(self.client.post(url).json(request)).await?;
        Ok(())
    }

    async fn set_assessees(
        &self,
        id: &SessionId,
        assessees: &BTreeSet<PersonId>,
    ) -> Result<(), SessionError> {
        let url = self.url(&format!("/sessions/{id}/assessees"));
        let body = AssesseesBody {
            assessee_ids: assessees,
        };
        let _: serde_json::Value = self.send(self.client.put(url).json(&body)).await?;
        Ok(())
    }

    async fn set_skills(
        &self,
        id: &SessionId,
        skills: &BTreeSet<SkillId>,
    ) -> Result<(), SessionError> {
        let url = self.url(&format!("/sessions/{id}/skills"));
        let body = SkillsBody { skill_ids: skills };
        let _: serde_json::Value = self.send(self.client.put(url).json(&body)).await?;
        Ok(())
    }
}

/// Decode an envelope body, mapping error codes onto `SessionError`.
fn decode_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, SessionError> {
    let envelope: Envelope<T> = serde_json::from_str(body).map_err(|e| {
        SessionError::Transport(format!("HTTP {status}: unreadable response ({e})"))
    })?;

    if let Some(error) = envelope.errors.into_iter().next() {
        return Err(map_error(error));
    }

    envelope
        .data
        .ok_or_else(|| SessionError::Transport(format!("HTTP {status}: response has no data")))
}

fn map_error(error: EnvelopeError) -> SessionError {
    match error.code.as_str() {
        "SESSION_NOT_FOUND" => SessionError::NotFound,
        "SESSION_NOT_EDITABLE" => {
            let status = error
                .details
                .as_ref()
                .and_then(|d| d.get("status"))
                .and_then(|s| s.as_str())
                .and_then(|s| s.parse::<SessionStatus>().ok());
            match status {
                Some(status) => SessionError::NotEditable(status),
                None => SessionError::Transport(error.message),
            }
        }
        "VALIDATION_ERROR" => SessionError::Validation(error.message),
        "CONFLICT" => SessionError::Conflict(error.message),
        "STORAGE_ERROR" => SessionError::StorageError(error.message),
        _ => SessionError::Transport(format!("{}: {}", error.code, error.message)),
    }
}
