pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod inference;
pub mod mock;
pub mod model;
pub mod pipeline;
pub mod response;
pub mod store;

use crate::config::Config;
use crate::inference::OpenAiProvider;
use crate::pipeline::Pipeline;
use crate::store::GitHubStore;
use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Wires the GitHub store and OpenAI provider from the given configuration.
pub fn pipeline_from_config(config: &Config) -> anyhow::Result<Pipeline> {
    let http = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;

    let store = GitHubStore::new(http.clone(), config);
    let inference = OpenAiProvider::new(http, config);

    Ok(Pipeline::new(Arc::new(store), Arc::new(inference)))
}

pub fn router(pipeline: Arc<Pipeline>, config: Arc<Config>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/api/analyze-plant",
            post(handlers::analyze).layer(DefaultBodyLimit::max(handlers::MAX_UPLOAD_BYTES)),
        )
        .route("/api/config", get(handlers::config_status))
        .layer(Extension(pipeline))
        .layer(Extension(config))
        .layer(TraceLayer::new_for_http())
}
