//! Per-project vector index backed by a JSONL file
//! (`vectorstore/index.jsonl`). Small enough to scan in full on every query;
//! a novel's worth of chapters and imported knowledge stays in the thousands
//! of records.

use std::fs::OpenOptions;
use std::io::{BufRead as _, BufReader, Write as _};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::llm::Embedder;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub stored_at: String,
}

pub struct VectorStore {
    path: PathBuf,
}

impl VectorStore {
    pub fn open(project: &Path) -> Self {
        Self {
            path: project.join("vectorstore").join("index.jsonl"),
        }
    }

    /// An index that was never written reads as empty.
    pub fn load(&self) -> anyhow::Result<Vec<VectorRecord>> {
        let file = match OpenOptions::new().read(true).open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("open vector index: {}", self.path.display()));
            }
        };

        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.context("read vector index line")?;
            if line.trim().is_empty() {
                continue;
            }
            let record: VectorRecord =
                serde_json::from_str(&line).context("parse vector record")?;
            records.push(record);
        }
        Ok(records)
    }

    pub fn append(&self, records: &[VectorRecord]) -> anyhow::Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("vector index path has no parent"))?;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create vector store dir: {}", parent.display()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open vector index: {}", self.path.display()))?;
        for record in records {
            serde_json::to_writer(&mut file, record).context("serialize vector record")?;
            file.write_all(b"\n").context("write vector index newline")?;
        }
        file.flush().context("flush vector index")?;
        Ok(())
    }

    /// Returns false when there was nothing to clear.
    pub fn clear(&self) -> anyhow::Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => {
                Err(err).with_context(|| format!("remove vector index: {}", self.path.display()))
            }
        }
    }

    /// Top-`k` records by cosine similarity, best first.
    pub fn search(&self, query: &[f32], k: usize) -> anyhow::Result<Vec<VectorRecord>> {
        let mut scored: Vec<(f32, VectorRecord)> = self
            .load()?
            .into_iter()
            .map(|record| (cosine_similarity(query, &record.embedding), record))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, record)| record)
            .collect())
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn record_id(text: &str) -> String {
    use sha2::Digest as _;
    let mut hasher = sha2::Sha256::new();
    hasher.update(text.as_bytes());
    format!("d_{}", hex::encode(hasher.finalize()))
}

/// Embeds the texts in one batch and appends them to the project index.
pub async fn insert_texts(
    embedder: &dyn Embedder,
    project: &Path,
    texts: &[String],
) -> anyhow::Result<()> {
    let texts: Vec<String> = texts
        .iter()
        .filter(|text| !text.trim().is_empty())
        .cloned()
        .collect();
    if texts.is_empty() {
        return Ok(());
    }

    let embeddings = embedder.embed(&texts).await.context("embed texts")?;
    if embeddings.len() != texts.len() {
        anyhow::bail!(
            "embedder returned {} vectors for {} texts",
            embeddings.len(),
            texts.len()
        );
    }

    let stored_at = Utc::now().to_rfc3339();
    let records: Vec<VectorRecord> = texts
        .into_iter()
        .zip(embeddings)
        .map(|(text, embedding)| VectorRecord {
            id: record_id(&text),
            text,
            embedding,
            stored_at: stored_at.clone(),
        })
        .collect();

    let store = VectorStore::open(project);
    store.append(&records)?;
    tracing::debug!(records = records.len(), "vector index updated");
    Ok(())
}

/// Splits an external knowledge file on blank lines and indexes each
/// paragraph as its own passage.
pub async fn import_knowledge_file(
    embedder: &dyn Embedder,
    project: &Path,
    file: &Path,
) -> anyhow::Result<usize> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("read knowledge file: {}", file.display()))?;

    let paragraphs: Vec<String> = contents
        .split("\n\n")
        .map(|paragraph| paragraph.trim().to_owned())
        .filter(|paragraph| !paragraph.is_empty())
        .collect();
    if paragraphs.is_empty() {
        anyhow::bail!("knowledge file has no content: {}", file.display());
    }

    let count = paragraphs.len();
    insert_texts(embedder, project, &paragraphs).await?;
    tracing::info!(file = %file.display(), passages = count, "knowledge file imported");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::doubles::FixedEmbedder;

    #[test]
    fn cosine_similarity_orders_by_angle() {
        let query = [1.0, 0.0];
        let same = cosine_similarity(&query, &[2.0, 0.0]);
        let diagonal = cosine_similarity(&query, &[1.0, 1.0]);
        let orthogonal = cosine_similarity(&query, &[0.0, 3.0]);
        assert!(same > diagonal && diagonal > orthogonal);
        assert_eq!(cosine_similarity(&query, &[0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&query, &[1.0]), 0.0);
    }

    #[test]
    fn search_returns_best_first_and_respects_k() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let store = VectorStore::open(temp.path());
        store.append(&[
            record("远", vec![0.0, 1.0]),
            record("近", vec![1.0, 0.1]),
            record("中", vec![1.0, 1.0]),
        ])?;

        let hits = store.search(&[1.0, 0.0], 2)?;
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "近");
        assert_eq!(hits[1].text, "中");
        Ok(())
    }

    #[test]
    fn missing_index_loads_as_empty() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let store = VectorStore::open(temp.path());
        assert!(store.load()?.is_empty());
        assert!(!store.clear()?);
        Ok(())
    }

    #[tokio::test]
    async fn import_knowledge_file_indexes_paragraphs() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let knowledge = temp.path().join("lore.txt");
        std::fs::write(&knowledge, "设定一。\n\n设定二。\n\n\n")?;

        let embedder = FixedEmbedder::new();
        let count = import_knowledge_file(&embedder, temp.path(), &knowledge).await?;
        assert_eq!(count, 2);
        assert_eq!(embedder.call_count(), 1);

        let records = VectorStore::open(temp.path()).load()?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text, "设定一。");
        Ok(())
    }

    fn record(text: &str, embedding: Vec<f32>) -> VectorRecord {
        VectorRecord {
            id: record_id(text),
            text: text.to_owned(),
            embedding,
            stored_at: "2026-01-01T00:00:00Z".to_owned(),
        }
    }
}
