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

//! SPARQL protocol client for the triple store.
//!
//! Executes SELECT queries against a GraphDB-compatible endpoint and
//! returns the raw `application/sparql-results+json` document. Failures
//! are values, never panics, so the API layer can hand them to clients
//! verbatim.

use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;

use crate::config::StoreConfig;

/// A failed query execution, carrying the query that caused it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store returned HTTP {status}")]
    Http {
        status: u16,
        body: String,
        query: String,
    },

    #[error("store connection failed: {reason}")]
    Transport { reason: String, query: String },

    #[error("store returned an unreadable response: {reason}")]
    InvalidResponse { reason: String, query: String },
}

impl StoreError {
    /// JSON body handed to API clients.
    ///
    /// The shapes are part of the public contract: an HTTP failure
    /// carries the status and the endpoint's own error text, any other
    /// failure carries a single connection message. Both echo the query.
    pub fn to_body(&self) -> Value {
        match self {
            StoreError::Http {
                status,
                body,
                query,
            } => json!({
                "error": format!("GraphDB HTTP {status}"),
                "text": body,
                "query": query,
            }),
            StoreError::Transport { reason, query } => json!({
                "error": format!("GraphDB connection failed: {reason}"),
                "query": query,
            }),
            StoreError::InvalidResponse { reason, query } => json!({
                "error": format!("GraphDB connection failed: {reason}"),
                "query": query,
            }),
        }
    }
}

/// Thin client over one repository endpoint.
#[derive(Debug, Clone)]
pub struct SparqlClient {
    endpoint: String,
    http: reqwest::Client,
}

impl SparqlClient {
    pub fn new(config: &StoreConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.query_timeout_secs))
            .build()?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            http,
        })
    }

    /// Execute a SELECT query, returning the parsed results document.
    ///
    /// The query travels as a form field per the SPARQL protocol. Every
    /// failure mode, including a timeout, surfaces as a [`StoreError`].
    pub async fn select(&self, query: &str) -> Result<Value, StoreError> {
        tracing::debug!(endpoint = %self.endpoint, "executing SPARQL query");

        let response = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/sparql-results+json")
            .form(&[("query", query)])
            .send()
            .await
            .map_err(|e| StoreError::Transport {
                reason: e.to_string(),
                query: query.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "store rejected query");
            return Err(StoreError::Http {
                status: status.as_u16(),
                body,
                query: query.to_string(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| StoreError::InvalidResponse {
                reason: e.to_string(),
                query: query.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_body_keeps_status_text_and_query() {
        let err = StoreError::Http {
            status: 500,
            body: "MALFORMED QUERY".to_string(),
            query: "SELECT ?x WHERE { ?x ?p ?o }".to_string(),
        };
        let body = err.to_body();
        assert_eq!(body["error"], "GraphDB HTTP 500");
        assert_eq!(body["text"], "MALFORMED QUERY");
        assert_eq!(body["query"], "SELECT ?x WHERE { ?x ?p ?o }");
    }

    #[test]
    fn transport_error_body_has_no_text_field() {
        let err = StoreError::Transport {
            reason: "connection refused".to_string(),
            query: "SELECT 1".to_string(),
        };
        let body = err.to_body();
        assert_eq!(body["error"], "GraphDB connection failed: connection refused");
        assert!(body.get("text").is_none());
        assert_eq!(body["query"], "SELECT 1");
    }

    #[test]
    fn invalid_response_reads_as_connection_failure() {
        let err = StoreError::InvalidResponse {
            reason: "expected value at line 1".to_string(),
            query: "SELECT 1".to_string(),
        };
        let body = err.to_body();
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("GraphDB connection failed:"));
    }
}
