//! Session and student profile models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::questions::IntakeQuestion;

/// One stored message of an intake conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: String,
    pub content: String,
}

impl ChatEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A persisted intake session.
///
/// `messages` only grows, `current_state` never decreases, and
/// `current_state <= messages.len()` holds after every write.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: Uuid,
    pub owner: String,
    pub messages: Vec<ChatEntry>,
    pub current_state: u32,
    /// Bumped on every update; used for compare-and-swap writes.
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Content of the message at `index`, or "" if absent.
    fn content_at(&self, index: usize) -> String {
        self.messages
            .get(index)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }

    /// Derive the structured profile from the fixed answer positions.
    pub fn profile(&self) -> StudentProfile {
        let answer = |q: IntakeQuestion| self.content_at(q.answer_index());
        StudentProfile {
            grade: answer(IntakeQuestion::Grade),
            liked_classes_clubs: answer(IntakeQuestion::LikedClassesClubs),
            strengths: answer(IntakeQuestion::Strengths),
            post_hs_preference: answer(IntakeQuestion::PostHsPreference),
            priority: answer(IntakeQuestion::Priority),
            wildcard: answer(IntakeQuestion::Wildcard),
            location: None,
        }
    }
}

/// Structured view of a student's intake answers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentProfile {
    pub grade: String,
    pub liked_classes_clubs: String,
    pub strengths: String,
    pub post_hs_preference: String,
    pub priority: String,
    pub wildcard: String,
    /// Not asked by the intake; only present when a caller supplies it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl StudentProfile {
    /// All free-text answers joined, for keyword matching.
    pub fn combined_text(&self) -> String {
        [
            self.grade.as_str(),
            self.liked_classes_clubs.as_str(),
            self.strengths.as_str(),
            self.post_hs_preference.as_str(),
            self.priority.as_str(),
            self.wildcard.as_str(),
        ]
        .join(" ")
    }
}
