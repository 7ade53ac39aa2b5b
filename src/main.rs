use std::sync::Arc;

use career_guide::auth::HostedAuthVerifier;
use career_guide::config::AppConfig;
use career_guide::intake::ConversationEngine;
use career_guide::llm::create_provider;
use career_guide::plan::PlanGenerator;
use career_guide::routes::{AppState, build_router};
use career_guide::store::{Database, LibSqlBackend};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env()?;

    eprintln!("🎓 Career Guide v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Database: {}", config.db_path.display());
    match &config.llm {
        Some(llm) => eprintln!("   Model: {} ({:?})", llm.model, llm.backend),
        None => eprintln!("   Model: none configured, plans use the built-in fallback"),
    }
    eprintln!("   API: http://0.0.0.0:{}/api/chat\n", config.port);

    // ── Database ─────────────────────────────────────────────────────────
    let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_local(&config.db_path).await?);

    // ── Model ────────────────────────────────────────────────────────────
    let llm = match &config.llm {
        Some(llm_config) => Some(create_provider(llm_config)?),
        None => {
            tracing::warn!("No model credential set, summary plans will use the fallback");
            None
        }
    };

    let generator = Arc::new(PlanGenerator::new(llm, config.generator.clone()));
    let identity = Arc::new(HostedAuthVerifier::new(
        config.auth.url.clone(),
        config.auth.anon_key.clone(),
    ));
    let engine = Arc::new(ConversationEngine::new(db, identity, generator));

    // ── HTTP ─────────────────────────────────────────────────────────────
    let app = build_router(AppState::new(engine));
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "Career guide server started");
    axum::serve(listener, app).await?;

    Ok(())
}
