use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::config::Endpoint;

/// The single message shown for any generation failure; the underlying
/// cause goes to the log, never to the screen.
pub const GENERATION_FAILED_MSG: &str = "An error occurred while generating the response.";

/// Bounded wait for the remote call. Expiry surfaces as a transport error.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

/// Client for the Gemini generateContent endpoint.
///
/// One POST per call, prompt as the sole content part, credential appended
/// as a query parameter to the configured base URL.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: Endpoint,
}

impl GeminiClient {
    pub fn new(endpoint: Endpoint) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, endpoint })
    }

    /// Sends one prompt and returns the extracted answer text.
    ///
    /// A reachable endpoint that answers with an unexpected shape yields an
    /// empty answer rather than an error; only transport problems and
    /// non-success statuses fail.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}?key={}", self.endpoint.url, self.endpoint.credential);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "generation request failed with status {}",
                response.status()
            ));
        }

        let body: Value = response.json().await?;
        Ok(extract_answer(&body))
    }
}

/// Pulls `candidates[0].content.parts[0].text` out of a response body.
///
/// Each lookup is explicit so a missing step reads as "no value" instead of
/// being coalesced away somewhere inside a deserialization schema.
pub fn extract_answer(body: &Value) -> String {
    body.get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .and_then(|parts| parts.first())
        .and_then(|part| part.get("text"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}
