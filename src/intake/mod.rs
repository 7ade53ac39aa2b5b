//! Intake conversation: fixed question sequence, sessions, and the engine
//! that turns answers into a summary plan.

pub mod engine;
pub mod model;
pub mod questions;
pub mod routes;

pub use engine::{AdvanceOutcome, ConversationEngine};
pub use model::{ChatEntry, Session, StudentProfile};
pub use questions::{IntakeQuestion, Transition};
