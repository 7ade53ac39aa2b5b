//! libSQL backend: async `Database` trait implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::intake::{ChatEntry, Session, StudentProfile};
use crate::plan::normalize::{Normalized, normalize_plan};
use crate::plan::PlanRecord;
use crate::store::migrations;
use crate::store::traits::Database;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::Serialization(e.to_string()))
}

/// Map a libsql Row to a Session.
///
/// Column order matches SESSION_COLUMNS:
/// 0:id, 1:user_id, 2:messages, 3:current_state, 4:revision, 5:created_at, 6:updated_at
fn row_to_session(row: &libsql::Row) -> Result<Session, DatabaseError> {
    let read = |e: libsql::Error| DatabaseError::Query(format!("row_to_session: {e}"));

    let id_str: String = row.get(0).map_err(read)?;
    let owner: String = row.get(1).map_err(read)?;
    let messages_str: String = row.get(2).map_err(read)?;
    let current_state: i64 = row.get(3).map_err(read)?;
    let revision: i64 = row.get(4).map_err(read)?;
    let created_str: String = row.get(5).map_err(read)?;
    let updated_str: String = row.get(6).map_err(read)?;

    let messages: Vec<ChatEntry> = serde_json::from_str(&messages_str)
        .map_err(|e| DatabaseError::Serialization(format!("session messages: {e}")))?;

    Ok(Session {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| DatabaseError::Serialization(format!("session id: {e}")))?,
        owner,
        messages,
        current_state: u32::try_from(current_state).unwrap_or_default(),
        revision,
        created_at: parse_datetime(&created_str),
        updated_at: parse_datetime(&updated_str),
    })
}

/// Map a libsql Row to a PlanRecord, re-normalizing the stored plan.
///
/// Column order matches PLAN_COLUMNS:
/// 0:id, 1:user_id, 2:plan_json, 3:student_profile, 4:created_at
fn row_to_plan(row: &libsql::Row) -> Result<PlanRecord, DatabaseError> {
    let read = |e: libsql::Error| DatabaseError::Query(format!("row_to_plan: {e}"));

    let id_str: String = row.get(0).map_err(read)?;
    let owner: String = row.get(1).map_err(read)?;
    let plan_str: String = row.get(2).map_err(read)?;
    let profile_str: String = row.get(3).map_err(read)?;
    let created_str: String = row.get(4).map_err(read)?;

    let raw: serde_json::Value = serde_json::from_str(&plan_str)
        .map_err(|e| DatabaseError::Serialization(format!("plan_json: {e}")))?;
    let plan = match normalize_plan(raw) {
        Normalized::Plan(plan) => plan,
        Normalized::Passthrough(_) => {
            return Err(DatabaseError::Serialization(
                "plan_json has no careers array".to_string(),
            ));
        }
    };
    let student_profile: StudentProfile = serde_json::from_str(&profile_str)
        .map_err(|e| DatabaseError::Serialization(format!("student_profile: {e}")))?;

    Ok(PlanRecord {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| DatabaseError::Serialization(format!("plan id: {e}")))?,
        owner,
        plan,
        student_profile,
        created_at: parse_datetime(&created_str),
    })
}

// ── Trait implementation ────────────────────────────────────────────

const SESSION_COLUMNS: &str = "id, user_id, messages, current_state, revision, created_at, updated_at";

const PLAN_COLUMNS: &str = "id, user_id, plan_json, student_profile, created_at";

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Sessions ────────────────────────────────────────────────────

    async fn get_session(&self, id: Uuid, owner: &str) -> Result<Option<Session>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1 AND user_id = ?2"),
                params![id.to_string(), owner],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_session: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row_to_session(&row).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_session: {e}"))),
        }
    }

    async fn create_session(
        &self,
        owner: &str,
        messages: &[ChatEntry],
        current_state: u32,
    ) -> Result<Session, DatabaseError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            owner: owner.to_string(),
            messages: messages.to_vec(),
            current_state,
            revision: 0,
            created_at: now,
            updated_at: now,
        };

        self.conn()
            .execute(
                "INSERT INTO sessions (id, user_id, messages, current_state, revision, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)",
                params![
                    session.id.to_string(),
                    owner,
                    to_json(messages)?,
                    i64::from(current_state),
                    now.to_rfc3339()
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("create_session: {e}")))?;

        debug!(session_id = %session.id, "Session created");
        Ok(session)
    }

    async fn update_session(
        &self,
        id: Uuid,
        owner: &str,
        messages: &[ChatEntry],
        current_state: u32,
        expected_revision: i64,
    ) -> Result<bool, DatabaseError> {
        let count = self
            .conn()
            .execute(
                "UPDATE sessions
                 SET messages = ?1, current_state = ?2, revision = revision + 1, updated_at = ?3
                 WHERE id = ?4 AND user_id = ?5 AND revision = ?6",
                params![
                    to_json(messages)?,
                    i64::from(current_state),
                    Utc::now().to_rfc3339(),
                    id.to_string(),
                    owner,
                    expected_revision
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_session: {e}")))?;

        Ok(count > 0)
    }

    // ── Plans ───────────────────────────────────────────────────────

    async fn insert_plan(&self, record: &PlanRecord) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO career_plans (id, user_id, plan_json, student_profile, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id.to_string(),
                    record.owner.as_str(),
                    to_json(&record.plan)?,
                    to_json(&record.student_profile)?,
                    record.created_at.to_rfc3339()
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_plan: {e}")))?;

        debug!(plan_id = %record.id, "Plan saved");
        Ok(())
    }

    async fn list_plans(&self, owner: &str, limit: i64) -> Result<Vec<PlanRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {PLAN_COLUMNS} FROM career_plans WHERE user_id = ?1
                     ORDER BY created_at DESC LIMIT ?2"
                ),
                params![owner, limit],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_plans: {e}")))?;

        let mut plans = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_plans: {e}")))?
        {
            match row_to_plan(&row) {
                Ok(plan) => plans.push(plan),
                Err(e) => warn!(error = %e, "Skipping unreadable plan row"),
            }
        }
        Ok(plans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::fallback::fallback_plan;

    async fn test_db() -> LibSqlBackend {
        LibSqlBackend::new_memory().await.unwrap()
    }

    fn profile(grade: &str) -> StudentProfile {
        StudentProfile {
            grade: grade.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn session_roundtrip() {
        let db = test_db().await;
        let created = db
            .create_session("user-1", &[ChatEntry::user("hi")], 1)
            .await
            .unwrap();

        let loaded = db.get_session(created.id, "user-1").await.unwrap().unwrap();
        assert_eq!(loaded.messages, vec![ChatEntry::user("hi")]);
        assert_eq!(loaded.current_state, 1);
        assert_eq!(loaded.revision, 0);
        assert_eq!(loaded.owner, "user-1");
    }

    #[tokio::test]
    async fn session_is_invisible_to_other_owner() {
        let db = test_db().await;
        let created = db.create_session("user-1", &[], 1).await.unwrap();
        assert!(db.get_session(created.id, "user-2").await.unwrap().is_none());
        assert!(db.get_session(Uuid::new_v4(), "user-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_is_compare_and_swap() {
        let db = test_db().await;
        let s = db
            .create_session("user-1", &[ChatEntry::user("hi")], 1)
            .await
            .unwrap();

        let messages = vec![ChatEntry::user("hi"), ChatEntry::user("10th")];
        assert!(db.update_session(s.id, "user-1", &messages, 2, 0).await.unwrap());

        // Stale revision loses.
        let stale = vec![ChatEntry::user("hi"), ChatEntry::user("9th")];
        assert!(!db.update_session(s.id, "user-1", &stale, 2, 0).await.unwrap());

        let loaded = db.get_session(s.id, "user-1").await.unwrap().unwrap();
        assert_eq!(loaded.messages, messages);
        assert_eq!(loaded.current_state, 2);
        assert_eq!(loaded.revision, 1);
    }

    #[tokio::test]
    async fn update_requires_matching_owner() {
        let db = test_db().await;
        let s = db.create_session("user-1", &[], 1).await.unwrap();
        assert!(!db.update_session(s.id, "user-2", &[], 2, 0).await.unwrap());
    }

    #[tokio::test]
    async fn plans_list_newest_first_per_owner() {
        let db = test_db().await;
        let mut older = PlanRecord::new("user-1", fallback_plan(), profile("9th"));
        older.created_at = Utc::now() - chrono::Duration::minutes(5);
        let newer = PlanRecord::new("user-1", fallback_plan(), profile("10th"));
        let other = PlanRecord::new("user-2", fallback_plan(), profile("11th"));

        db.insert_plan(&older).await.unwrap();
        db.insert_plan(&newer).await.unwrap();
        db.insert_plan(&other).await.unwrap();

        let plans = db.list_plans("user-1", 10).await.unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].id, newer.id);
        assert_eq!(plans[1].student_profile.grade, "9th");

        assert_eq!(db.list_plans("user-1", 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn legacy_plan_rows_are_normalized_on_read() {
        let db = test_db().await;
        db.conn()
            .execute(
                "INSERT INTO career_plans (id, user_id, plan_json, student_profile, created_at)
                 VALUES (?1, 'user-1', ?2, '{}', ?3)",
                params![
                    Uuid::new_v4().to_string(),
                    r#"{"careers": [{"title": "Welder", "why_matched": "hands-on", "alt_programs": ["NOVA"]}]}"#,
                    Utc::now().to_rfc3339()
                ],
            )
            .await
            .unwrap();
        db.conn()
            .execute(
                "INSERT INTO career_plans (id, user_id, plan_json, student_profile, created_at)
                 VALUES (?1, 'user-1', 'not json', '{}', ?2)",
                params![Uuid::new_v4().to_string(), Utc::now().to_rfc3339()],
            )
            .await
            .unwrap();

        let plans = db.list_plans("user-1", 10).await.unwrap();
        assert_eq!(plans.len(), 1);
        let career = &plans[0].plan.careers[0];
        assert_eq!(career.why, "hands-on");
        assert_eq!(career.example_programs, vec!["NOVA"]);
        assert_eq!(career.difficulty, "medium");
    }

    #[tokio::test]
    async fn local_file_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("guide.db");

        let id = {
            let db = LibSqlBackend::new_local(&path).await.unwrap();
            db.create_session("user-1", &[ChatEntry::user("hi")], 1)
                .await
                .unwrap()
                .id
        };

        let db = LibSqlBackend::new_local(&path).await.unwrap();
        let loaded = db.get_session(id, "user-1").await.unwrap();
        assert!(loaded.is_some());
    }
}
