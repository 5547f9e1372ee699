// Copyright 2025 DiseaseKG Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

pub mod api;
pub mod config;
pub mod llm;
pub mod store;

use std::sync::Arc;

use anyhow::Result;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{ask, ask_llm, health_check, AppState};
use config::ServerConfig;
use diseasekg_query::{QuestionAnalyzer, SparqlGenerator};
use llm::LlmDrafter;
use store::SparqlClient;

/// Build the application router over prepared state.
///
/// Split out of [`run_server`] so integration tests can drive the
/// routes without binding a socket.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ask", post(ask))
        .route("/ask/llm", post(ask_llm))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Assemble state from configuration.
pub fn build_state(config: &ServerConfig) -> Result<AppState> {
    let store = Arc::new(SparqlClient::new(&config.store)?);
    let drafter = LlmDrafter::from_config(&config.llm)?.map(Arc::new);
    Ok(AppState {
        analyzer: Arc::new(QuestionAnalyzer::new()),
        generator: SparqlGenerator::new(),
        store,
        drafter,
    })
}

pub async fn run_server(config: ServerConfig) -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diseasekg_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting DiseaseKG Server");
    tracing::info!("Configuration: {:#?}", config);

    config.validate()?;
    let addr = config.socket_addr()?;

    let state = build_state(&config)?;
    if state.drafter.is_none() {
        tracing::warn!("No HF_API_TOKEN configured, /ask/llm is disabled");
    }

    let app = router(state)
        .layer(cors_layer(&config)?)
        .layer(TraceLayer::new_for_http());

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// CORS policy from configuration.
///
/// With explicit origins the browser frontend is allowed to send
/// credentials; with an empty list every origin is accepted but
/// credentials must stay off, the two cannot combine.
fn cors_layer(config: &ServerConfig) -> Result<CorsLayer> {
    if !config.server.enable_cors {
        return Ok(CorsLayer::new());
    }

    if config.server.cors_origins.is_empty() {
        tracing::warn!("CORS: allowing all origins without credentials");
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    tracing::info!("CORS: allowing origins: {:?}", config.server.cors_origins);
    let origins = config
        .server
        .cors_origins
        .iter()
        .map(|o| Ok(o.parse::<HeaderValue>()?))
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true))
}
