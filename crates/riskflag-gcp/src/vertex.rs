//! Vertex AI `generateContent` client
//!
//! Calls the publisher-model REST endpoint with a bearer token. Only the
//! fields the drafting stage needs are modelled: one user turn, an optional
//! system instruction and the sampling temperature.

use crate::config::VertexConfig;
use crate::error::{classify_send_error, GcpError, Result};
use crate::generate::{GenerationRequest, TextGenerator};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Vertex AI client for text generation
pub struct VertexClient {
    config: VertexConfig,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for VertexClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexClient")
            .field("project_id", &self.config.project_id)
            .field("location", &self.config.location)
            .field("model_id", &self.config.model_id)
            .finish()
    }
}

impl VertexClient {
    /// Create a new client, validating the configuration first.
    pub fn new(config: VertexConfig) -> Result<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("riskflag-gcp/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(VertexClient {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(VertexConfig::from_env())
    }

    pub fn config(&self) -> &VertexConfig {
        &self.config
    }
}

/// Request body for `:generateContent`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

/// Response body from `:generateContent`
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

fn build_body(request: &GenerationRequest) -> GenerateContentRequest<'_> {
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user"),
            parts: vec![Part {
                text: &request.prompt,
            }],
        }],
        system_instruction: request.system_instruction.as_deref().map(|text| Content {
            role: None,
            parts: vec![Part { text }],
        }),
        generation_config: GenerationConfig {
            temperature: request.temperature,
        },
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Result<String> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| GcpError::MalformedResponse("no candidates in response".to_string()))?;

    let parts = candidate
        .content
        .ok_or_else(|| GcpError::MalformedResponse("candidate has no content".to_string()))?
        .parts;

    let text: String = parts.into_iter().filter_map(|p| p.text).collect();
    if text.trim().is_empty() {
        return Err(GcpError::EmptyResponse);
    }
    Ok(text)
}

#[async_trait]
impl TextGenerator for VertexClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let url = self.config.generate_content_url(&request.model);
        let body = build_body(request);
        debug!(model = %request.model, "Calling Vertex AI generateContent");

        let mut builder = self.http_client.post(&url).json(&body);
        if let Some(token) = &self.config.access_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify_send_error(e, &self.config.base_url(), self.config.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GcpError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GcpError::MalformedResponse(e.to_string()))?;

        extract_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_body_shape() {
        let request = GenerationRequest::new("gemini-2.0-flash", "Data: Audit_ID: A1")
            .with_system_instruction("You are a Senior Compliance Communication Agent.")
            .with_temperature(0.2);
        let value = serde_json::to_value(build_body(&request)).unwrap();

        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "Data: Audit_ID: A1");
        assert_eq!(
            value["systemInstruction"]["parts"][0]["text"],
            "You are a Senior Compliance Communication Agent."
        );
        assert!(value["systemInstruction"].get("role").is_none());
        let temperature = value["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_body_without_system_instruction() {
        let request = GenerationRequest::new("m", "Are we connected?");
        let value = serde_json::to_value(build_body(&request)).unwrap();
        assert!(value.get("systemInstruction").is_none());
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Subject: "}, {"text": "[URGENT] A1"}]}
            }]
        }))
        .unwrap();
        assert_eq!(extract_text(response).unwrap(), "Subject: [URGENT] A1");
    }

    #[test]
    fn test_extract_text_no_candidates() {
        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            extract_text(response),
            Err(GcpError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_extract_text_blank() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "   "}]}}]
        }))
        .unwrap();
        assert!(matches!(extract_text(response), Err(GcpError::EmptyResponse)));
    }

    #[test]
    fn test_debug_hides_token() {
        let client = VertexClient::new(
            VertexConfig::new("p", "us-central1", "m").with_token("ya29.secret"),
        )
        .unwrap();
        assert!(!format!("{client:?}").contains("ya29.secret"));
    }
}
