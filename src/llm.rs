//! Capability seams for text generation and embedding.
//!
//! The pipeline only ever talks to these traits; the concrete
//! OpenAI-compatible client lives in [`crate::openai`] and tests substitute
//! counting doubles.

use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct ModelParams {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct EmbeddingParams {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// One blocking, unbounded-latency call; provider errors propagate.
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Invoke the generator and collapse provider formatting artifacts.
/// An empty cleaned response is returned as-is; emptiness is the caller's
/// call to judge.
pub async fn generate_cleaned(
    generator: &dyn TextGenerator,
    prompt: &str,
) -> anyhow::Result<String> {
    let raw = generator.generate(prompt).await?;
    Ok(clean_response(&raw))
}

/// Strips `<think>…</think>` reasoning blocks some providers interleave with
/// the answer, then trims surrounding whitespace.
pub fn clean_response(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(start) = rest.find("<think>") {
        out.push_str(&rest[..start]);
        match rest[start..].find("</think>") {
            Some(rel_end) => {
                rest = &rest[start + rel_end + "</think>".len()..];
            }
            None => {
                // Unclosed reasoning block: drop everything after the marker.
                rest = "";
            }
        }
    }
    out.push_str(rest);

    out.trim().to_owned()
}
