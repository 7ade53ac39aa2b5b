//! REST endpoint for detailed career roadmaps.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
    routing::post,
};
use serde::Deserialize;
use tracing::info;

use crate::error::IntakeError;
use crate::intake::StudentProfile;
use crate::routes::AppState;

use super::model::{CareerTarget, DetailedPlan};
use super::generator::PlanGenerator;

/// Routes: `POST /api/detailed_plan`.
pub fn plan_routes() -> Router<AppState> {
    Router::new().route("/api/detailed_plan", post(detailed_plan))
}

#[derive(Debug, Deserialize)]
pub struct DetailedPlanRequest {
    #[serde(default, rename = "studentProfile", alias = "student_profile")]
    pub student_profile: Option<StudentProfile>,
    #[serde(default)]
    pub career: Option<CareerTarget>,
}

/// Validate a roadmap request and generate the plan. Validation happens
/// before any model call.
pub async fn roadmap_for(
    generator: &PlanGenerator,
    request: DetailedPlanRequest,
) -> Result<DetailedPlan, IntakeError> {
    let (Some(profile), Some(career)) = (request.student_profile, request.career) else {
        return Err(IntakeError::Validation(
            "studentProfile and career are required".to_string(),
        ));
    };
    let title = career.title();
    if title.is_empty() {
        return Err(IntakeError::Validation("career title is required".to_string()));
    }

    let plan = generator.detailed_plan(&profile, title).await?;
    info!(career = title, years = plan.year_count(), "Detailed plan generated");
    Ok(plan)
}

async fn detailed_plan(
    State(state): State<AppState>,
    body: Result<Json<DetailedPlanRequest>, JsonRejection>,
) -> Result<impl IntoResponse, IntakeError> {
    let Json(body) = body?;
    let plan = roadmap_for(&state.generator, body).await?;
    Ok(Json(serde_json::json!({ "plan": plan })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::GenerationError;
    use crate::plan::generator::test_support::{FixedLlm, GOOD_ROADMAP};
    use crate::plan::GeneratorConfig;

    fn request(json: &str) -> DetailedPlanRequest {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn missing_fields_fail_validation_before_model_call() {
        let llm = Arc::new(FixedLlm::new(GOOD_ROADMAP));
        let generator = PlanGenerator::new(Some(llm.clone()), GeneratorConfig::default());

        for body in [
            r#"{}"#,
            r#"{"career": "Electrician"}"#,
            r#"{"studentProfile": {"grade": "10th"}}"#,
            r#"{"studentProfile": {"grade": "10th"}, "career": {"title": "  "}}"#,
        ] {
            let err = roadmap_for(&generator, request(body)).await.unwrap_err();
            assert!(matches!(err, IntakeError::Validation(_)), "body: {body}");
        }
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn career_object_title_is_used() {
        let llm = Arc::new(FixedLlm::new(GOOD_ROADMAP));
        let generator = PlanGenerator::new(Some(llm.clone()), GeneratorConfig::default());
        let body = r#"{"studentProfile": {"grade": "10th grade"},
            "career": {"title": "Electrician", "why": "hands-on", "path": "apprenticeship"}}"#;

        let plan = roadmap_for(&generator, request(body)).await.unwrap();
        assert_eq!(plan.start_from(), "10th grade");
        let requests = llm.requests.lock().unwrap();
        assert!(requests[0].messages[1].content.contains("Target career: Electrician"));
    }

    #[tokio::test]
    async fn generation_failure_propagates() {
        let generator = PlanGenerator::new(None, GeneratorConfig::default());
        let body = r#"{"student_profile": {}, "career": "Electrician"}"#;
        let err = roadmap_for(&generator, request(body)).await.unwrap_err();
        assert!(matches!(err, IntakeError::Generation(GenerationError::Unavailable)));
    }
}
