//! Web research delegate backed by the Tavily search API.
//!
//! This is an external collaborator: when no API key is configured the tool
//! stays in the registry but reports itself unavailable instead of failing
//! the turn.

use anyhow::{anyhow, Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct WebResearchParams {
    #[schemars(
        description = "What to research on the web, written in natural language"
    )]
    pub instruction: String,
}

const TAVILY_URL: &str = "https://api.tavily.com/search";

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    title: String,
    url: String,
    content: String,
}

pub struct TavilyResearcher {
    client: reqwest::Client,
    api_key: String,
}

impl TavilyResearcher {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            api_key,
        }
    }

    /// Run one search and render the findings as plain text for the model.
    pub async fn research(&self, instruction: &str) -> Result<String> {
        let body = json!({
            "api_key": self.api_key,
            "query": instruction,
            "max_results": 5,
            "include_answer": true,
        });

        let response = self
            .client
            .post(TAVILY_URL)
            .json(&body)
            .send()
            .await
            .context("web research request failed")?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(anyhow!("web research error {status}: {message}"));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .context("web research response malformed")?;

        debug!(results = parsed.results.len(), "web research complete");
        Ok(render(parsed))
    }
}

fn render(response: TavilyResponse) -> String {
    let mut out = String::new();
    if let Some(answer) = response.answer {
        if !answer.trim().is_empty() {
            out.push_str(&answer);
            out.push_str("\n\n");
        }
    }
    if response.results.is_empty() && out.is_empty() {
        return "No results found on the web.".into();
    }
    for (i, result) in response.results.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} ({})\n{}\n",
            i + 1,
            result.title,
            result.url,
            result.content
        ));
    }
    out.trim_end().to_string()
}
