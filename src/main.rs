mod config;
mod contact_engine;
mod error;
mod routes;

use axum::{routing::get, Router, Json};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use crate::config::ServiceConfig;
use crate::contact_engine::ai_reviewer::OpenAiProvider;
use crate::contact_engine::store::ContactStore;
use crate::contact_engine::DuplicateEngine;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::from_env()?;

    let provider = match &config.openai_api_key {
        Some(key) if config.ai_review_available() => Some(OpenAiProvider::new(key.clone(), &config.engine)?),
        _ => None,
    };
    let engine = DuplicateEngine::new(config.engine.clone(), provider);
    if !engine.ai_review_active() {
        tracing::info!("No AI provider configured, duplicate detection is rule-based only");
    }

    let app = Router::new()
        .route("/health", get(health))
        .nest("/contacts", routes::contacts::contact_routes(engine, ContactStore::new()))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "Contact dedup service running");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "contact-dedup-service",
        "features": ["contacts", "duplicates", "merge_recommendations"]
    }))
}
