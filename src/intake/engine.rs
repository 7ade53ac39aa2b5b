//! ConversationEngine: advances an owner's intake session one answer at a
//! time and produces the summary plan when the questions run out.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::IdentityVerifier;
use crate::error::IntakeError;
use crate::plan::{CareerPlan, PlanGenerator, PlanRecord, PlanSource};
use crate::store::Database;

use super::model::{ChatEntry, Session};
use super::questions::{
    COMPLETED_STATE, COMPLETION_REPLY, IntakeQuestion, Transition, opening_prompt, transition,
};

/// Attempts at a compare-and-swap session update before giving up.
const MAX_UPDATE_ATTEMPTS: usize = 3;

/// Plans returned by the history listing.
const PLAN_HISTORY_LIMIT: i64 = 50;

/// Reply to one intake submission.
#[derive(Debug, Clone, Serialize)]
pub struct AdvanceOutcome {
    pub reply: String,
    pub next_state: u32,
    pub session_id: Uuid,
    /// Present only on the completion branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<CareerPlan>,
    #[serde(skip)]
    pub plan_source: Option<PlanSource>,
}

/// Coordinates identity, session storage and plan generation for intake.
pub struct ConversationEngine {
    db: Arc<dyn Database>,
    identity: Arc<dyn IdentityVerifier>,
    generator: Arc<PlanGenerator>,
}

impl ConversationEngine {
    pub fn new(
        db: Arc<dyn Database>,
        identity: Arc<dyn IdentityVerifier>,
        generator: Arc<PlanGenerator>,
    ) -> Self {
        Self {
            db,
            identity,
            generator,
        }
    }

    pub fn generator(&self) -> &Arc<PlanGenerator> {
        &self.generator
    }

    /// Resolve the caller and advance their session.
    ///
    /// Identity is established before any storage access; an unverifiable
    /// token never touches a session.
    pub async fn submit(
        &self,
        access_token: &str,
        session_id: Option<&str>,
        message: &str,
    ) -> Result<AdvanceOutcome, IntakeError> {
        let owner = self.authenticate(access_token).await?;
        let session_id = session_id.and_then(|raw| Uuid::parse_str(raw.trim()).ok());
        self.advance(&owner, session_id, message).await
    }

    /// Advance `owner`'s session with one submitted answer.
    pub async fn advance(
        &self,
        owner: &str,
        session_id: Option<Uuid>,
        message: &str,
    ) -> Result<AdvanceOutcome, IntakeError> {
        let Some(session) = self.resolve_session(owner, session_id).await else {
            return self.open_session(owner, message).await;
        };

        debug!(
            owner,
            session_id = %session.id,
            state = session.current_state,
            "Advancing intake session"
        );

        match transition(session.current_state) {
            Transition::Ask {
                question,
                next_state,
            } => {
                let id = session.id;
                // Report what was stored, which differs from the snapshot
                // when a concurrent write moved the session on.
                let (question, next_state) = self
                    .record_answer(session, message)
                    .await
                    .unwrap_or((question, next_state));
                Ok(AdvanceOutcome {
                    reply: question.prompt().to_string(),
                    next_state,
                    session_id: id,
                    plan: None,
                    plan_source: None,
                })
            }
            Transition::Complete => self.complete(owner, &session).await,
        }
    }

    /// List the caller's saved plans, newest first.
    pub async fn list_plans(&self, access_token: &str) -> Result<Vec<PlanRecord>, IntakeError> {
        let owner = self.authenticate(access_token).await?;
        self.db
            .list_plans(&owner, PLAN_HISTORY_LIMIT)
            .await
            .map_err(IntakeError::Storage)
    }

    async fn authenticate(&self, access_token: &str) -> Result<String, IntakeError> {
        self.identity.verify(access_token).await.map_err(|e| {
            debug!(error = %e, "Identity verification failed");
            IntakeError::Unauthorized
        })
    }

    /// Load the referenced session. Lookup failures are treated like a
    /// missing session so the caller starts over.
    async fn resolve_session(&self, owner: &str, session_id: Option<Uuid>) -> Option<Session> {
        let id = session_id?;
        match self.db.get_session(id, owner).await {
            Ok(session) => session,
            Err(e) => {
                warn!(owner, session_id = %id, error = %e, "Session lookup failed, starting a new session");
                None
            }
        }
    }

    async fn open_session(&self, owner: &str, message: &str) -> Result<AdvanceOutcome, IntakeError> {
        let session = self
            .db
            .create_session(owner, &[ChatEntry::user(message)], 1)
            .await
            .map_err(IntakeError::SessionCreateFailed)?;

        info!(owner, session_id = %session.id, "Intake session opened");
        Ok(AdvanceOutcome {
            reply: opening_prompt().to_string(),
            next_state: 1,
            session_id: session.id,
            plan: None,
            plan_source: None,
        })
    }

    /// Append the answer and persist it with a compare-and-swap write,
    /// re-reading and re-applying on conflict. Failures are logged only.
    ///
    /// Returns the question to ask next and the state that was written, or
    /// `None` when the answer was not stored.
    async fn record_answer(
        &self,
        mut session: Session,
        message: &str,
    ) -> Option<(IntakeQuestion, u32)> {
        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            let Transition::Ask {
                question,
                next_state,
            } = transition(session.current_state)
            else {
                debug!(session_id = %session.id, "Session completed concurrently, answer dropped");
                return None;
            };

            let mut messages = session.messages.clone();
            messages.push(ChatEntry::user(message));

            match self
                .db
                .update_session(
                    session.id,
                    &session.owner,
                    &messages,
                    next_state,
                    session.revision,
                )
                .await
            {
                Ok(true) => return Some((question, next_state)),
                Ok(false) => {
                    debug!(session_id = %session.id, attempt, "Session changed underneath, retrying");
                    match self.db.get_session(session.id, &session.owner).await {
                        Ok(Some(latest)) => session = latest,
                        Ok(None) => break,
                        Err(e) => {
                            warn!(session_id = %session.id, error = %e, "Failed to reload session");
                            return None;
                        }
                    }
                }
                Err(e) => {
                    warn!(session_id = %session.id, error = %e, "Failed to update session");
                    return None;
                }
            }
        }
        warn!(session_id = %session.id, "Failed to update session after retries");
        None
    }

    async fn complete(&self, owner: &str, session: &Session) -> Result<AdvanceOutcome, IntakeError> {
        let profile = session.profile();
        let generation = self.generator.summary_plan(&profile).await;
        let source = generation.source();
        let plan = generation.into_plan();

        info!(owner, session_id = %session.id, source = ?source, "Intake complete, plan ready");

        let record = PlanRecord::new(owner, plan.clone(), profile);
        if let Err(e) = self.db.insert_plan(&record).await {
            warn!(owner, session_id = %session.id, error = %e, "Failed to persist plan");
        }

        Ok(AdvanceOutcome {
            reply: COMPLETION_REPLY.to_string(),
            next_state: COMPLETED_STATE,
            session_id: session.id,
            plan: Some(plan),
            plan_source: Some(source),
        })
    }
}
