//! Career plans: models, normalization, the deterministic fallback, and
//! model-backed generation of summaries and roadmaps.

pub mod fallback;
pub mod generator;
pub mod model;
pub mod normalize;
pub mod prompts;
pub mod routes;

pub use generator::{FallbackReason, Generation, GeneratorConfig, PlanGenerator};
pub use model::{
    CareerOption, CareerPlan, CareerTarget, DetailedPlan, PlanRecord, PlanSource, RoadmapSchema,
};
pub use normalize::{Normalized, normalize_plan};
