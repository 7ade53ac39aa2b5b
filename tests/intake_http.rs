//! Integration tests for the intake, roadmap, and history HTTP endpoints.
//!
//! Most tests drive the router in-process with `oneshot`; one spins up a
//! real server on a random port and talks to it over HTTP.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tower::ServiceExt;

use career_guide::auth::IdentityVerifier;
use career_guide::error::{AuthError, LlmError};
use career_guide::intake::ConversationEngine;
use career_guide::llm::{CompletionRequest, CompletionResponse, LlmProvider};
use career_guide::plan::{GeneratorConfig, PlanGenerator};
use career_guide::routes::{AppState, build_router};
use career_guide::store::{Database, LibSqlBackend};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

const WHAT_GRADE: &str = "yo 👋 I’m Kai. what grade are you in?";

/// Accepts `token-<owner>` and yields `<owner>`.
struct StubVerifier;

#[async_trait]
impl IdentityVerifier for StubVerifier {
    async fn verify(&self, access_token: &str) -> Result<String, AuthError> {
        access_token
            .strip_prefix("token-")
            .map(str::to_string)
            .ok_or(AuthError::Rejected { status: 401 })
    }
}

/// Stub LLM provider returning a fixed roadmap (no real API calls).
struct RoadmapLlm;

#[async_trait]
impl LlmProvider for RoadmapLlm {
    fn model_name(&self) -> &str {
        "stub"
    }
    fn cost_per_token(&self) -> (Decimal, Decimal) {
        (Decimal::ZERO, Decimal::ZERO)
    }
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Ok(CompletionResponse {
            content: json!({
                "career_title": "Electrician",
                "start_from": "sophomore",
                "college_targets": [{"name": "NOVA", "type": "safety", "why": "close"}],
                "years": [{"label": "10th grade", "milestones": [], "months": []}]
            })
            .to_string(),
            input_tokens: 0,
            output_tokens: 0,
        })
    }
}

async fn app_with(llm: Option<Arc<dyn LlmProvider>>) -> (Router, Arc<LibSqlBackend>) {
    let db = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    let generator = Arc::new(PlanGenerator::new(llm, GeneratorConfig::default()));
    let engine = Arc::new(ConversationEngine::new(
        db.clone(),
        Arc::new(StubVerifier),
        generator,
    ));
    (build_router(AppState::new(engine)), db)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = timeout(TEST_TIMEOUT, app.clone().oneshot(request))
        .await
        .expect("request timed out")
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn chat(app: &Router, token: &str, session_id: Option<&str>, message: &str) -> (StatusCode, Value) {
    let mut body = json!({"message": message, "access_token": token});
    if let Some(id) = session_id {
        body["session_id"] = json!(id);
    }
    send(app, post_json("/api/chat", body)).await
}

#[tokio::test]
async fn intake_conversation_end_to_end() {
    let (app, db) = app_with(None).await;

    let (status, body) = chat(&app, "token-student", None, "hey").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], WHAT_GRADE);
    assert_eq!(body["next_state"], 1);
    assert!(body.get("plan").is_none());
    let sid = body["session_id"].as_str().unwrap().to_string();

    let mut states = vec![];
    for answer in ["10th grade", "robotics club", "math", "college", "money"] {
        let (status, body) = chat(&app, "token-student", Some(&sid), answer).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session_id"], sid.as_str());
        states.push(body["next_state"].as_u64().unwrap());
    }
    assert_eq!(states, vec![2, 3, 4, 5, 6]);

    let (status, body) = chat(&app, "token-student", Some(&sid), "esports").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["next_state"], 7);
    assert_eq!(body["plan"]["careers"].as_array().unwrap().len(), 3);
    assert_eq!(body["plan"]["careers"][0]["title"], "Software Developer");

    let saved = db.list_plans("student", 10).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].student_profile.grade, "10th grade");
}

#[tokio::test]
async fn chat_without_identity_is_unauthorized() {
    let (app, db) = app_with(None).await;

    let (status, body) = chat(&app, "", None, "hey").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "not authenticated"}));

    let (status, _) = chat(&app, "forged", None, "hey").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert!(db.list_plans("", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn detailed_plan_requires_both_fields() {
    let (app, _) = app_with(Some(Arc::new(RoadmapLlm))).await;

    let (status, body) = send(
        &app,
        post_json("/api/detailed_plan", json!({"career": "Electrician"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "studentProfile and career are required");
}

#[tokio::test]
async fn unreadable_bodies_get_json_errors() {
    let (app, _) = app_with(Some(Arc::new(RoadmapLlm))).await;

    let truncated = Request::post("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"message\": "))
        .unwrap();
    let (status, body) = send(&app, truncated).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let wrong_type = post_json(
        "/api/detailed_plan",
        json!({"studentProfile": {"grade": 10}, "career": "Electrician"}),
    );
    let (status, body) = send(&app, wrong_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let no_content_type = Request::post("/api/chat")
        .body(Body::from(json!({"message": "hi"}).to_string()))
        .unwrap();
    let (status, body) = send(&app, no_content_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn detailed_plan_returns_roadmap() {
    let (app, _) = app_with(Some(Arc::new(RoadmapLlm))).await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/detailed_plan",
            json!({
                "studentProfile": {"grade": "10th grade", "priority": "money"},
                "career": {"title": "Electrician", "why": "hands-on"}
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plan"]["career_title"], "Electrician");
    assert_eq!(body["plan"]["start_from"], "10th grade");
    assert_eq!(body["plan"]["college_targets"][0]["type"], "safety");
}

#[tokio::test]
async fn detailed_plan_without_model_is_server_error() {
    let (app, _) = app_with(None).await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/detailed_plan",
            json!({"studentProfile": {"grade": "9th"}, "career": "Electrician"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("No model credential"));
}

#[tokio::test]
async fn plan_history_is_scoped_to_bearer() {
    let (app, db) = app_with(None).await;
    let session = db
        .create_session("student", &[], 6)
        .await
        .unwrap();
    let sid = session.id.to_string();
    chat(&app, "token-student", Some(&sid), "go").await;
    chat(&app, "token-student", Some(&sid), "again").await;

    let request = Request::get("/api/plans")
        .header(header::AUTHORIZATION, "Bearer token-student")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plans"].as_array().unwrap().len(), 2);
    assert!(body["plans"][0].get("owner").is_none());

    let request = Request::get("/api/plans")
        .header(header::AUTHORIZATION, "Bearer token-someone-else")
        .body(Body::empty())
        .unwrap();
    let (_, body) = send(&app, request).await;
    assert!(body["plans"].as_array().unwrap().is_empty());

    let request = Request::get("/api/plans").body(Body::empty()).unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_over_real_socket() {
    let (app, _) = app_with(None).await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let body: Value = timeout(TEST_TIMEOUT, async {
        reqwest::get(format!("http://127.0.0.1:{port}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    })
    .await
    .expect("health check timed out");

    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "career-guide");
    assert!(body["version"].is_string());
}
