use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::ai::prompts;
use crate::analysis::types::AnalysisReport;
use crate::config::Config;
use crate::entities::Listing;

const API_VERSION: &str = "2023-06-01";
const ANALYSIS_MAX_TOKENS: u32 = 4096;
const ONE_PAGER_MAX_TOKENS: u32 = 2048;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid engine base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("engine request failed: {0}")]
    Transport(String),

    #[error("engine returned http {status}")]
    Http { status: reqwest::StatusCode },

    #[error("malformed engine response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Client for the text-generation engine (Anthropic-style messages API).
pub struct EngineClient {
    http: Client,
    base: Url,
    api_key: String,
    model: String,
}

impl EngineClient {
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        Self::from_parts(
            Url::parse(config.engine_api_url())?,
            config.engine_api_key(),
            config.engine_model(),
        )
    }

    pub fn from_parts(
        base: Url,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, EngineError> {
        let http = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120)) // analysis generations are slow
            .build()
            .map_err(|e| EngineError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Score a listing, prompting with the full script when available and
    /// listing metadata otherwise.
    #[instrument(skip_all, fields(listing_id = %listing.id))]
    pub async fn analyze_listing(
        &self,
        listing: &Listing,
        script_text: Option<&str>,
    ) -> Result<AnalysisReport, EngineError> {
        let prompt = prompts::analysis_prompt(listing, script_text);
        let text = self.complete(prompt, ANALYSIS_MAX_TOKENS).await?;
        let json = extract_json(&text)
            .ok_or_else(|| EngineError::MalformedResponse("no JSON object in reply".to_string()))?;
        serde_json::from_str::<AnalysisReport>(json)
            .map_err(|e| EngineError::MalformedResponse(e.to_string()))
    }

    /// Produce a markdown pitch one-pager for a listing.
    #[instrument(skip_all, fields(listing_id = %listing.id))]
    pub async fn generate_one_pager(
        &self,
        listing: &Listing,
        report: Option<&AnalysisReport>,
    ) -> Result<String, EngineError> {
        let prompt = prompts::one_pager_prompt(listing, report);
        self.complete(prompt, ONE_PAGER_MAX_TOKENS).await
    }

    async fn complete(&self, prompt: String, max_tokens: u32) -> Result<String, EngineError> {
        let url = self.base.join("v1/messages")?;
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens,
            temperature: 0.7,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Http { status });
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| EngineError::MalformedResponse(e.to_string()))?;

        body.content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| EngineError::MalformedResponse("no text block in reply".to_string()))
    }
}

/// Pull the JSON object out of a model reply, tolerating markdown fences and
/// surrounding prose.
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}
