//! Retrieval gateway: turns the short-term memory pair into a semantic
//! query against the project's vector index and guarantees the prompt
//! builder always receives non-empty context material.

use std::path::Path;

use anyhow::Context as _;

use crate::llm::Embedder;
use crate::vectorstore::VectorStore;

pub const EMPTY_CONTEXT_PLACEHOLDER: &str = "（无检索到的上下文）";

pub fn build_retrieval_query(short_summary: &str, next_keywords: &str) -> String {
    format!("{short_summary} \n关键词：{next_keywords}")
}

/// Fetches up to `k` relevant passages and concatenates them into one
/// context block. An empty index short-circuits without an embedding call.
pub async fn retrieve_relevant_context(
    embedder: &dyn Embedder,
    project: &Path,
    query: &str,
    k: usize,
) -> anyhow::Result<String> {
    let store = VectorStore::open(project);
    if store.load()?.is_empty() {
        tracing::debug!("vector index is empty; skipping retrieval");
        return Ok(String::new());
    }

    let embeddings = embedder
        .embed(&[query.to_owned()])
        .await
        .context("embed retrieval query")?;
    let query_vector = embeddings
        .first()
        .ok_or_else(|| anyhow::anyhow!("embedder returned no vector for the query"))?;

    let hits = store.search(query_vector, k)?;
    tracing::debug!(hits = hits.len(), k, "retrieval query done");

    let block = hits
        .iter()
        .map(|hit| hit.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    Ok(block)
}

/// Blank retrieval results fall back to the query itself, and a blank query
/// falls back to a placeholder literal.
pub fn effective_context(retrieved: &str, query: &str) -> String {
    if !retrieved.trim().is_empty() {
        return retrieved.to_owned();
    }
    if !query.trim().is_empty() {
        return query.to_owned();
    }
    EMPTY_CONTEXT_PLACEHOLDER.to_owned()
}
