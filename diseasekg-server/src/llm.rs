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

//! LLM-drafted SPARQL, the experimental alternative to the rule-based
//! compiler.
//!
//! A chat-completion model is prompted with the HealthRecord schema and
//! asked to answer in a `SPARQL: ... VISUALIZATION: ...` format. Model
//! output is scraped, never trusted: the query is extracted from a code
//! fence or the tagged line, language tags are stripped, and trailing
//! prose after the closing brace is cut before anything reaches the
//! store.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::LlmConfig;

const HF_CHAT_URL: &str = "https://router.huggingface.co/v1/chat/completions";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Failed to call Hugging Face API: {0}")]
    Api(String),

    #[error("Could not parse SPARQL from LLM output")]
    Unparsable { output: String },
}

/// Drafts SPARQL queries through the Hugging Face inference API.
#[derive(Debug, Clone)]
pub struct LlmDrafter {
    model: String,
    token: String,
    max_tokens: u32,
    http: reqwest::Client,
}

/// A scraped draft ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct SparqlDraft {
    pub query: String,
    pub visualization: String,
}

impl LlmDrafter {
    /// Build a drafter, or None when no API token is configured.
    pub fn from_config(config: &LlmConfig) -> anyhow::Result<Option<Self>> {
        let Some(token) = config.hf_api_token.clone() else {
            return Ok(None);
        };
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Some(Self {
            model: config.model.clone(),
            token,
            max_tokens: config.max_tokens,
            http,
        }))
    }

    /// Ask the model for a query and scrape its answer.
    pub async fn draft(&self, question: &str) -> Result<SparqlDraft, LlmError> {
        let output = self.complete(&build_prompt(question)).await?;
        tracing::debug!(chars = output.len(), "received LLM output");

        let Some(query) = clean_sparql(&output) else {
            return Err(LlmError::Unparsable { output });
        };
        Ok(SparqlDraft {
            query,
            visualization: parse_visualization(&output),
        })
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": self.max_tokens,
        });

        let response = self
            .http
            .post(HF_CHAT_URL)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Api(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {status}: {text}")));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Api(e.to_string()))?;
        data.pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| LlmError::Api("completion had no message content".to_string()))
    }
}

fn build_prompt(question: &str) -> String {
    format!(
        r#"You are an expert in SPARQL and semantic knowledge graphs.
We have a knowledge graph with namespace dis: <http://diseases.org/disease-kg/> and snomed: <http://snomed.info/id/>.

The graph contains HealthRecord entities with the following structure:

dis:HealthRecord
  - dis:location           (string)  : e.g., "Europe"
  - dis:year               (integer) : e.g., 2015
  - dis:causeName          (string)  : e.g., "Tuberculosis"
  - dis:cause              (IRI)     : SNOMED URI for the cause
  - dis:measureId          (integer)
  - dis:metricId           (integer)
  - dis:sexId              (integer)
  - dis:ageId              (integer)
  - dis:sex                (string)
  - dis:age                (string)
  - dis:metric             (string)  : e.g., "Number"
  - dis:value              (float)   : the numeric value
  - dis:measure            (string)  : e.g., "Deaths", "Prevalence", "Incidence"
  - dis:measureDescription (string)  : textual description of the measure

All literals are simple types (string, integer, float) and do NOT contain language tags like @en. SNOMED IDs are used as IRIs.

Convert the following natural language question into a SPARQL query.
Return EXACTLY in this format:
SPARQL: <your query>
VISUALIZATION: <bar|line|pie|map>

Do NOT include @en or other language tags in the query.
Do NOT generate any other text in the SPARQL query, such as comments.

Question: {question}
"#
    )
}

static FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)```sparql\s*(.*?)```").unwrap());
static TAGGED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)SPARQL:\s*(.*?)(VISUALIZATION:|$)").unwrap());
static VIS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)VISUALIZATION:\s*(\w+)").unwrap());

/// Extract a usable query from raw model output, or None.
///
/// A fenced ```sparql block wins over a `SPARQL:` tagged section. The
/// extracted text then has stray fences removed, `"@en` tags reduced to
/// plain quotes, and everything after the line that balances the braces
/// dropped, models like to append explanations there.
pub fn clean_sparql(llm_output: &str) -> Option<String> {
    let raw = FENCE_RE
        .captures(llm_output)
        .or_else(|| TAGGED_RE.captures(llm_output))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())?;

    let query = raw.replace("```", "").replace("\"@en", "\"");

    let mut kept: Vec<&str> = Vec::new();
    let mut depth: i64 = 0;
    for line in query.lines() {
        depth += line.matches('{').count() as i64;
        depth -= line.matches('}').count() as i64;
        kept.push(line);
        if depth <= 0 && line.contains('}') {
            break;
        }
    }
    let query = kept.join("\n").trim().to_string();

    if query.is_empty() {
        None
    } else {
        Some(query)
    }
}

/// Scrape the visualization tag, defaulting to "bar".
///
/// The tag is matched case-insensitively but passed through verbatim;
/// clients receive whatever the model wrote.
pub fn parse_visualization(llm_output: &str) -> String {
    VIS_RE
        .captures(llm_output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "bar".to_string())
}
