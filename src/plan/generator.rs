//! Plan generator: summary plans with a deterministic fallback, and
//! detailed roadmaps with no fallback.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::GenerationError;
use crate::intake::StudentProfile;
use crate::llm::costs::call_cost;
use crate::llm::{CompletionRequest, LlmProvider};

use super::fallback::fallback_plan;
use super::model::{CareerPlan, DetailedPlan, PlanSource, Roadmap, RoadmapSchema};
use super::normalize::{Normalized, normalize_plan};
use super::prompts::{roadmap_messages, summary_messages};

/// Number of careers a summary plan must contain.
pub const SUMMARY_CAREER_COUNT: usize = 3;

/// Configuration for plan generation.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Upper bound on a single model call.
    pub timeout: Duration,
    pub summary_temperature: f32,
    pub roadmap_temperature: f32,
    pub summary_max_tokens: u32,
    pub roadmap_max_tokens: u32,
    /// Shape requested for detailed roadmaps.
    pub roadmap_schema: RoadmapSchema,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(45),
            summary_temperature: 0.7,
            roadmap_temperature: 0.6,
            summary_max_tokens: 1024,
            roadmap_max_tokens: 4096,
            roadmap_schema: RoadmapSchema::default(),
        }
    }
}

/// Why the fallback plan was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// No model credential is configured; no call was attempted.
    NoModel,
    /// The model call or its output failed.
    GenerationFailed(String),
}

/// Outcome of summary generation.
#[derive(Debug, Clone, PartialEq)]
pub enum Generation {
    Generated(CareerPlan),
    Fallback {
        plan: CareerPlan,
        reason: FallbackReason,
    },
}

impl Generation {
    pub fn plan(&self) -> &CareerPlan {
        match self {
            Self::Generated(plan) | Self::Fallback { plan, .. } => plan,
        }
    }

    pub fn into_plan(self) -> CareerPlan {
        match self {
            Self::Generated(plan) | Self::Fallback { plan, .. } => plan,
        }
    }

    pub fn source(&self) -> PlanSource {
        match self {
            Self::Generated(_) => PlanSource::Generated,
            Self::Fallback { .. } => PlanSource::Fallback,
        }
    }
}

/// Produces career plans through the model.
pub struct PlanGenerator {
    llm: Option<Arc<dyn LlmProvider>>,
    config: GeneratorConfig,
}

impl PlanGenerator {
    /// Create a generator. `llm` is `None` when no credential is configured.
    pub fn new(llm: Option<Arc<dyn LlmProvider>>, config: GeneratorConfig) -> Self {
        Self { llm, config }
    }

    /// Generate a 3-career summary plan. Never fails: any problem yields the
    /// fallback plan.
    pub async fn summary_plan(&self, profile: &StudentProfile) -> Generation {
        let Some(llm) = self.llm.as_ref() else {
            info!("No model configured, using fallback plan");
            return Generation::Fallback {
                plan: fallback_plan(),
                reason: FallbackReason::NoModel,
            };
        };

        match self.generate_summary(llm.as_ref(), profile).await {
            Ok(plan) => {
                debug!(plan = ?plan, "Normalized summary plan");
                Generation::Generated(plan)
            }
            Err(e) => {
                warn!(error = %e, "Summary generation failed, using fallback plan");
                Generation::Fallback {
                    plan: fallback_plan(),
                    reason: FallbackReason::GenerationFailed(e.to_string()),
                }
            }
        }
    }

    async fn generate_summary(
        &self,
        llm: &dyn LlmProvider,
        profile: &StudentProfile,
    ) -> Result<CareerPlan, GenerationError> {
        let request = CompletionRequest::new(summary_messages(profile))
            .with_temperature(self.config.summary_temperature)
            .with_max_tokens(self.config.summary_max_tokens)
            .with_json_output();

        let raw = self.complete_json(llm, request).await?;

        let plan = match normalize_plan(raw) {
            Normalized::Plan(plan) => plan,
            Normalized::Passthrough(_) => {
                return Err(GenerationError::SchemaMismatch(
                    "response has no careers array".to_string(),
                ));
            }
        };

        if plan.careers.len() != SUMMARY_CAREER_COUNT {
            return Err(GenerationError::SchemaMismatch(format!(
                "expected {SUMMARY_CAREER_COUNT} careers, got {}",
                plan.careers.len()
            )));
        }
        if plan.careers.iter().any(|c| c.title.trim().is_empty()) {
            return Err(GenerationError::SchemaMismatch(
                "career without a title".to_string(),
            ));
        }

        Ok(plan)
    }

    /// Generate a detailed roadmap for one career. Errors propagate.
    pub async fn detailed_plan(
        &self,
        profile: &StudentProfile,
        career_title: &str,
    ) -> Result<DetailedPlan, GenerationError> {
        let llm = self.llm.as_ref().ok_or(GenerationError::Unavailable)?;
        let schema = self.config.roadmap_schema;

        info!(career = career_title, schema = ?schema, "Generating detailed plan");

        let request = CompletionRequest::new(roadmap_messages(profile, career_title, schema))
            .with_temperature(self.config.roadmap_temperature)
            .with_max_tokens(self.config.roadmap_max_tokens)
            .with_json_output();

        let raw = self.complete_json(llm.as_ref(), request).await?;

        let mut plan = match schema {
            RoadmapSchema::Monthly => serde_json::from_value::<Roadmap<_>>(raw)
                .map(DetailedPlan::Monthly),
            RoadmapSchema::Flat => serde_json::from_value::<Roadmap<_>>(raw)
                .map(DetailedPlan::Flat),
        }
        .map_err(|e| GenerationError::SchemaMismatch(e.to_string()))?;

        if !profile.grade.trim().is_empty() && plan.start_from() != profile.grade {
            plan.set_start_from(&profile.grade);
        }

        Ok(plan)
    }

    /// Run one bounded completion and parse its content as a JSON object.
    async fn complete_json(
        &self,
        llm: &dyn LlmProvider,
        request: CompletionRequest,
    ) -> Result<Value, GenerationError> {
        let timeout = self.config.timeout;
        let response = tokio::time::timeout(timeout, llm.complete(request))
            .await
            .map_err(|_| GenerationError::Timeout(timeout))??;

        debug!(
            model = llm.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            cost_usd = %call_cost(llm.cost_per_token(), response.input_tokens, response.output_tokens),
            raw = %response.content,
            "Model responded"
        );

        let json = extract_json_object(&response.content);
        let value: Value = serde_json::from_str(&json)
            .map_err(|e| GenerationError::MalformedJson(e.to_string()))?;
        if !value.is_object() {
            return Err(GenerationError::MalformedJson(
                "expected a JSON object".to_string(),
            ));
        }
        Ok(value)
    }
}

/// Extract a JSON object from model output that might contain markdown or extra text.
fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    // Already a JSON object
    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    // Wrapped in markdown code block
    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('{') {
                return inner.to_string();
            }
        }
    }

    // Try to find object bounds
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}
