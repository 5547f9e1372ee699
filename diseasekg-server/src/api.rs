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

//! HTTP handlers.
//!
//! Every answer endpoint replies with HTTP 200 and a JSON body. Clients
//! distinguish success from failure by the presence of an `error` key,
//! either at the top level (bad request, LLM failure) or inside
//! `result` (store failure). Status codes carry no signal here, the
//! envelope does.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use diseasekg_query::{QuestionAnalyzer, SparqlGenerator};

use crate::llm::{LlmDrafter, LlmError};
use crate::store::SparqlClient;

/// Shared application state, cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<QuestionAnalyzer>,
    pub generator: SparqlGenerator,
    pub store: Arc<SparqlClient>,
    pub drafter: Option<Arc<LlmDrafter>>,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// POST /ask - rule-based question answering
pub async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Json<Value> {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return Json(json!({ "error": rejection.body_text() }));
        }
    };

    tracing::info!(question = %req.question, "answering question");

    let analysis = state.analyzer.analyze(&req.question);
    let compiled = state.generator.generate(&analysis);

    let result = match state.store.select(&compiled.query).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(error = %e, "store query failed");
            e.to_body()
        }
    };

    Json(json!({
        "sparql": compiled.query,
        "result": result,
        "visualization": compiled.visualization,
        "analysis": analysis,
    }))
}

/// POST /ask/llm - LLM-drafted question answering
pub async fn ask_llm(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Json<Value> {
    let Json(req) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return Json(json!({ "error": rejection.body_text() }));
        }
    };

    let Some(drafter) = &state.drafter else {
        return Json(json!({ "error": "LLM drafting is not configured" }));
    };

    tracing::info!(question = %req.question, "drafting query via LLM");

    let draft = match drafter.draft(&req.question).await {
        Ok(draft) => draft,
        Err(LlmError::Unparsable { output }) => {
            return Json(json!({
                "error": "Could not parse SPARQL from LLM output",
                "llm_output": output,
            }));
        }
        Err(e @ LlmError::Api(_)) => {
            tracing::warn!(error = %e, "LLM call failed");
            return Json(json!({ "error": e.to_string() }));
        }
    };

    let result = match state.store.select(&draft.query).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(error = %e, "store query failed");
            e.to_body()
        }
    };

    Json(json!({
        "sparql": draft.query,
        "result": result,
        "visualization": draft.visualization,
    }))
}

/// GET /health - liveness check
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
