//! OpenAI-compatible HTTP client backing both capability traits.

use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;

use crate::llm::{Embedder, EmbeddingParams, ModelParams, TextGenerator};

pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiClient {
    pub fn for_generation(params: &ModelParams) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(params.timeout_secs))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base_url: params.base_url.clone(),
            api_key: params.api_key.clone(),
            model: params.model.clone(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        })
    }

    pub fn for_embedding(params: &EmbeddingParams) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(params.timeout_secs))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base_url: params.base_url.clone(),
            api_key: params.api_key.clone(),
            model: params.model.clone(),
            temperature: 0.0,
            max_tokens: 0,
        })
    }

    fn require_api_key(&self) -> anyhow::Result<&str> {
        if self.api_key.is_empty() {
            anyhow::bail!("API key is not set (NOVELSMITH_API_KEY or OPENAI_API_KEY)");
        }
        Ok(&self.api_key)
    }
}

pub fn responses_endpoint(base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    format!("{base_url}/responses")
}

pub fn embeddings_endpoint(base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    format!("{base_url}/embeddings")
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let api_key = self.require_api_key()?;
        let endpoint = responses_endpoint(&self.base_url);

        let mut body = serde_json::json!({
            "model": self.model,
            "input": prompt,
            "text": { "format": { "type": "text" } },
            "store": false,
        });
        if let Some(obj) = body.as_object_mut() {
            // NOTE: Some GPT-5 models reject sampling params like `temperature`.
            if !self.model.starts_with("gpt-5") {
                obj.insert(
                    "temperature".to_owned(),
                    serde_json::json!(self.temperature),
                );
            }
            if self.max_tokens > 0 {
                obj.insert(
                    "max_output_tokens".to_owned(),
                    serde_json::json!(self.max_tokens),
                );
            }
        }

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {endpoint}"))?;

        let status = response.status();
        let raw = response.text().await.context("read response body")?;
        if !status.is_success() {
            let message = parse_error_message(&raw).unwrap_or_else(|| raw.clone());
            anyhow::bail!("generation API error ({status}): {message}");
        }

        let value: serde_json::Value =
            serde_json::from_str(&raw).context("parse generation response")?;
        extract_output_text(&value).context("extract output text")
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let api_key = self.require_api_key()?;
        let endpoint = embeddings_endpoint(&self.base_url);

        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {endpoint}"))?;

        let status = response.status();
        let raw = response.text().await.context("read embeddings body")?;
        if !status.is_success() {
            let message = parse_error_message(&raw).unwrap_or_else(|| raw.clone());
            anyhow::bail!("embedding API error ({status}): {message}");
        }

        let value: serde_json::Value =
            serde_json::from_str(&raw).context("parse embeddings response")?;
        extract_embeddings(&value, texts.len()).context("extract embeddings")
    }
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    let message = value.get("error")?.get("message")?.as_str()?.to_owned();
    Some(message)
}

fn extract_output_text(value: &serde_json::Value) -> anyhow::Result<String> {
    let output = value
        .get("output")
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow::anyhow!("missing `output` array in response"))?;

    let mut text = String::new();
    for item in output {
        if item.get("type").and_then(|v| v.as_str()) != Some("message") {
            continue;
        }
        let content = match item.get("content").and_then(|v| v.as_array()) {
            Some(content) => content,
            None => continue,
        };
        for part in content {
            if part.get("type").and_then(|v| v.as_str()) != Some("output_text") {
                continue;
            }
            let Some(part_text) = part.get("text").and_then(|v| v.as_str()) else {
                continue;
            };
            text.push_str(part_text);
        }
    }

    Ok(text)
}

fn extract_embeddings(value: &serde_json::Value, expected: usize) -> anyhow::Result<Vec<Vec<f32>>> {
    let data = value
        .get("data")
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow::anyhow!("missing `data` array in response"))?;

    let mut embeddings = Vec::with_capacity(data.len());
    for item in data {
        let vector = item
            .get("embedding")
            .and_then(|v| v.as_array())
            .ok_or_else(|| anyhow::anyhow!("missing `embedding` array in data item"))?;
        let mut parsed = Vec::with_capacity(vector.len());
        for component in vector {
            let component = component
                .as_f64()
                .ok_or_else(|| anyhow::anyhow!("embedding component is not a number"))?;
            parsed.push(component as f32);
        }
        embeddings.push(parsed);
    }

    if embeddings.len() != expected {
        anyhow::bail!(
            "embedding count mismatch: expected {expected}, got {}",
            embeddings.len()
        );
    }
    Ok(embeddings)
}
