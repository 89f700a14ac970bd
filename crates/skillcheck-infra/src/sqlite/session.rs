//! SQLite session repository implementation.
//!
//! Implements `SessionRepository` from `skillcheck-core`. Diff batches are
//! applied inside one writer transaction; any failure rolls the whole batch
//! back when the transaction is dropped.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use skillcheck_core::repository::SortOrder;
use skillcheck_core::repository::session::{SessionFilter, SessionRepository};
use skillcheck_types::check::{Check, CheckId, CompetenceLevel};
use skillcheck_types::diff::Diff;
use skillcheck_types::error::RepositoryError;
use skillcheck_types::session::{Baseline, PersonId, Session, SessionId, SessionStatus, SkillId};
use sqlx::Row;
use sqlx::sqlite::{Sqlite, SqliteRow};

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SessionRepository`.
pub struct SqliteSessionRepository {
    pool: DatabasePool,
}

impl SqliteSessionRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to a domain Session.
struct SessionRow {
    id: String,
    team_id: String,
    name: String,
    date: String,
    status: String,
}

impl SessionRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            team_id: row.try_get("team_id")?,
            name: row.try_get("name")?,
            date: row.try_get("date")?,
            status: row.try_get("status")?,
        })
    }

    fn into_session(self) -> Result<Session, RepositoryError> {
        let id = self
            .id
            .parse::<SessionId>()
            .map_err(|e| RepositoryError::Query(format!("invalid session id: {e}")))?;
        let date = self
            .date
            .parse::<NaiveDate>()
            .map_err(|e| RepositoryError::Query(format!("invalid session date: {e}")))?;
        let status: SessionStatus = self
            .status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Session {
            id,
            team_id: self.team_id,
            name: self.name,
            date,
            status,
        })
    }
}

/// Internal row type for mapping SQLite rows to a domain Check.
struct CheckRow {
    id: String,
    skill_id: String,
    assessee_id: String,
    result: String,
    notes: String,
    timestamp: String,
}

impl CheckRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            skill_id: row.try_get("skill_id")?,
            assessee_id: row.try_get("assessee_id")?,
            result: row.try_get("result")?,
            notes: row.try_get("notes")?,
            timestamp: row.try_get("timestamp")?,
        })
    }

    fn into_check(self) -> Result<Check, RepositoryError> {
        let id = self
            .id
            .parse::<CheckId>()
            .map_err(|e| RepositoryError::Query(format!("invalid check id: {e}")))?;
        let result: CompetenceLevel = self
            .result
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Check {
            id,
            skill_id: SkillId::new(self.skill_id),
            assessee_id: PersonId::new(self.assessee_id),
            result,
            notes: self.notes,
            timestamp: parse_datetime(&self.timestamp)?,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

/// Fail unless the session exists and is still a draft.
///
/// Runs on the writer transaction, so a batch queued behind one that closes
/// the session sees the closed status.
async fn ensure_editable(
    conn: &mut sqlx::SqliteConnection,
    session_id: &SessionId,
) -> Result<(), RepositoryError> {
    let status: Option<(String,)> = sqlx::query_as("SELECT status FROM sessions WHERE id = ?")
        .bind(session_id.to_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(query_err)?;
    let Some((status,)) = status else {
        return Err(RepositoryError::NotFound);
    };
    let status: SessionStatus = status.parse().map_err(|e: String| RepositoryError::Query(e))?;
    if !status.is_editable() {
        return Err(RepositoryError::NotEditable(status));
    }
    Ok(())
}

/// Apply one diff on an open transaction.
async fn apply_one(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    session_id: &SessionId,
    diff: &Diff,
) -> Result<(), RepositoryError> {
    let sid = session_id.to_string();
    match diff {
        Diff::UpdateSession(session) => {
            sqlx::query(
                "UPDATE sessions SET team_id = ?, name = ?, date = ?, status = ?, updated_at = ?
                 WHERE id = ?",
            )
            .bind(&session.team_id)
            .bind(&session.name)
            .bind(session.date.to_string())
            .bind(session.status.to_string())
            .bind(format_datetime(&Utc::now()))
            .bind(&sid)
            .execute(&mut **tx)
            .await
            .map_err(query_err)?;
        }
        Diff::AddAssessee(person) => {
            sqlx::query(
                "INSERT OR IGNORE INTO session_assessees (session_id, person_id) VALUES (?, ?)",
            )
            .bind(&sid)
            .bind(person.as_str())
            .execute(&mut **tx)
            .await
            .map_err(query_err)?;
        }
        Diff::RemoveAssessee(person) => {
            sqlx::query("DELETE FROM session_assessees WHERE session_id = ? AND person_id = ?")
                .bind(&sid)
                .bind(person.as_str())
                .execute(&mut **tx)
                .await
                .map_err(query_err)?;
        }
        Diff::AddSkill(skill) => {
            sqlx::query("INSERT OR IGNORE INTO session_skills (session_id, skill_id) VALUES (?, ?)")
                .bind(&sid)
                .bind(skill.as_str())
                .execute(&mut **tx)
                .await
                .map_err(query_err)?;
        }
        Diff::RemoveSkill(skill) => {
            sqlx::query("DELETE FROM session_skills WHERE session_id = ? AND skill_id = ?")
                .bind(&sid)
                .bind(skill.as_str())
                .execute(&mut **tx)
                .await
                .map_err(query_err)?;
        }
        Diff::UpdateCheck(check) => {
            // The WHERE on the upsert leaves rows of other sessions untouched.
            let result = sqlx::query(
                "INSERT INTO checks (id, session_id, skill_id, assessee_id, result, notes, timestamp)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                     skill_id = excluded.skill_id,
                     assessee_id = excluded.assessee_id,
                     result = excluded.result,
                     notes = excluded.notes,
                     timestamp = excluded.timestamp
                 WHERE checks.session_id = excluded.session_id",
            )
            .bind(check.id.to_string())
            .bind(&sid)
            .bind(check.skill_id.as_str())
            .bind(check.assessee_id.as_str())
            .bind(check.result.as_str())
            .bind(&check.notes)
            .bind(format_datetime(&check.timestamp))
            .execute(&mut **tx)
            .await
            .map_err(query_err)?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::Conflict(format!(
                    "check {} belongs to another session",
                    check.id
                )));
            }
        }
    }
    Ok(())
}

impl SessionRepository for SqliteSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session, RepositoryError> {
        let now = format_datetime(&Utc::now());
        let result = sqlx::query(
            "INSERT INTO sessions (id, team_id, name, date, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(session.id.to_string())
        .bind(&session.team_id)
        .bind(&session.name)
        .bind(session.date.to_string())
        .bind(session.status.to_string())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(session.clone()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => Err(
                RepositoryError::Conflict(format!("session {} already exists", session.id)),
            ),
            Err(e) => Err(query_err(e)),
        }
    }

    async fn get_by_id(&self, id: &SessionId) -> Result<Option<Session>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM sessions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => {
                let session_row = SessionRow::from_row(&row).map_err(query_err)?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn list(&self, filter: Option<SessionFilter>) -> Result<Vec<Session>, RepositoryError> {
        let filter = filter.unwrap_or_default();
        let mut sql = String::from("SELECT * FROM sessions");
        let mut conditions: Vec<&str> = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            binds.push(status.to_string());
        }
        if let Some(team_id) = filter.team_id {
            conditions.push("team_id = ?");
            binds.push(team_id);
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        let order = match filter.sort_order.unwrap_or_default() {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        sql.push_str(&format!(" ORDER BY date {order}, created_at {order}"));

        // SQLite only accepts OFFSET after LIMIT; -1 means no limit.
        match (filter.limit, filter.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }

        let mut query = sqlx::query(&sql);
        for value in &binds {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&self.pool.reader).await.map_err(query_err)?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let session_row = SessionRow::from_row(row).map_err(query_err)?;
            sessions.push(session_row.into_session()?);
        }
        Ok(sessions)
    }

    async fn delete(&self, id: &SessionId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn load_baseline(&self, id: &SessionId) -> Result<Option<Baseline>, RepositoryError> {
        // One read transaction so the four queries see the same snapshot.
        let mut tx = self.pool.reader.begin().await.map_err(query_err)?;
        let sid = id.to_string();

        let Some(row) = sqlx::query("SELECT * FROM sessions WHERE id = ?")
            .bind(&sid)
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_err)?
        else {
            return Ok(None);
        };
        let session = SessionRow::from_row(&row)
            .map_err(query_err)?
            .into_session()?;

        let assessees: Vec<(String,)> =
            sqlx::query_as("SELECT person_id FROM session_assessees WHERE session_id = ?")
                .bind(&sid)
                .fetch_all(&mut *tx)
                .await
                .map_err(query_err)?;
        let skills: Vec<(String,)> =
            sqlx::query_as("SELECT skill_id FROM session_skills WHERE session_id = ?")
                .bind(&sid)
                .fetch_all(&mut *tx)
                .await
                .map_err(query_err)?;
        let check_rows = sqlx::query("SELECT * FROM checks WHERE session_id = ?")
            .bind(&sid)
            .fetch_all(&mut *tx)
            .await
            .map_err(query_err)?;

        tx.commit().await.map_err(query_err)?;

        let mut checks = HashMap::with_capacity(check_rows.len());
        for row in &check_rows {
            let check = CheckRow::from_row(row).map_err(query_err)?.into_check()?;
            checks.insert(check.id, check);
        }

        Ok(Some(Baseline {
            session,
            assessee_ids: assessees.into_iter().map(|(p,)| PersonId::new(p)).collect(),
            skill_ids: skills.into_iter().map(|(s,)| SkillId::new(s)).collect(),
            checks,
        }))
    }

    async fn apply_diffs(
        &self,
        session_id: &SessionId,
        diffs: &[Diff],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;
        ensure_editable(&mut tx, session_id).await?;

        for diff in diffs {
            apply_one(&mut tx, session_id, diff).await?;
        }

        tx.commit().await.map_err(query_err)?;
        tracing::debug!(session_id = %session_id, diffs = diffs.len(), "diff batch committed");
        Ok(())
    }

    async fn replace_assessees(
        &self,
        session_id: &SessionId,
        assessees: &BTreeSet<PersonId>,
    ) -> Result<(), RepositoryError> {
        let sid = session_id.to_string();
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;
        ensure_editable(&mut tx, session_id).await?;

        sqlx::query("DELETE FROM session_assessees WHERE session_id = ?")
            .bind(&sid)
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;
        for person in assessees {
            sqlx::query("INSERT INTO session_assessees (session_id, person_id) VALUES (?, ?)")
                .bind(&sid)
                .bind(person.as_str())
                .execute(&mut *tx)
                .await
                .map_err(query_err)?;
        }

        tx.commit().await.map_err(query_err)
    }

    async fn replace_skills(
        &self,
        session_id: &SessionId,
        skills: &BTreeSet<SkillId>,
    ) -> Result<(), RepositoryError> {
        let sid = session_id.to_string();
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;
        ensure_editable(&mut tx, session_id).await?;

        sqlx::query("DELETE FROM session_skills WHERE session_id = ?")
            .bind(&sid)
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;
        for skill in skills {
            sqlx::query("INSERT INTO session_skills (session_id, skill_id) VALUES (?, ?)")
                .bind(&sid)
                .bind(skill.as_str())
                .execute(&mut *tx)
                .await
                .map_err(query_err)?;
        }

        tx.commit().await.map_err(query_err)
    }
}
