//! Unified `Database` trait: single async interface for sessions and plans.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::intake::{ChatEntry, Session};
use crate::plan::PlanRecord;

/// Backend-agnostic database trait covering intake sessions and saved plans.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    // ── Sessions ────────────────────────────────────────────────────

    /// Get a session by ID, only if it belongs to `owner`.
    async fn get_session(&self, id: Uuid, owner: &str) -> Result<Option<Session>, DatabaseError>;

    /// Create a new session owned by `owner`.
    async fn create_session(
        &self,
        owner: &str,
        messages: &[ChatEntry],
        current_state: u32,
    ) -> Result<Session, DatabaseError>;

    /// Replace a session's messages and state if its revision still equals
    /// `expected_revision`. Returns `false` when another writer got there first.
    async fn update_session(
        &self,
        id: Uuid,
        owner: &str,
        messages: &[ChatEntry],
        current_state: u32,
        expected_revision: i64,
    ) -> Result<bool, DatabaseError>;

    // ── Plans ───────────────────────────────────────────────────────

    /// Append a plan record.
    async fn insert_plan(&self, record: &PlanRecord) -> Result<(), DatabaseError>;

    /// List an owner's plans, newest first.
    async fn list_plans(&self, owner: &str, limit: i64) -> Result<Vec<PlanRecord>, DatabaseError>;
}
