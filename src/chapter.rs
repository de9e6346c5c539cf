//! Chapter pipeline core: prompt builder and draft generator.
//!
//! `build_chapter_prompt` is a pure function of on-disk project state (plus
//! whatever the capabilities return); it performs no writes so a caller can
//! build, let a human edit, and only then generate.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::llm::{self, Embedder, TextGenerator};
use crate::summary::{self, SummaryMarkers};
use crate::{blueprint, history, prompts, retrieval};

/// Prior chapters fed to the summarizer and excerpt selection.
const RECENT_WINDOW: u32 = 5;
/// The continuation prompt carries at most this many trailing characters of
/// the previous chapter; recent narrative events weigh more than early
/// exposition.
const EXCERPT_MAX_CHARS: usize = 500;

/// Per-chapter authoring constraints, passed by value into every entry
/// point. Nothing in the pipeline reads ambient state.
#[derive(Debug, Clone, Default)]
pub struct ChapterInputs {
    pub user_guidance: String,
    pub characters_involved: String,
    pub key_items: String,
    pub scene_location: String,
    pub time_constraint: String,
    pub word_target: usize,
}

/// Where the generation prompt comes from: built from project state, or
/// supplied verbatim after human editing.
#[derive(Debug, Clone)]
pub enum PromptSource {
    Build,
    Verbatim(String),
}

pub struct ChapterPipeline<'a> {
    pub(crate) generator: &'a dyn TextGenerator,
    pub(crate) embedder: &'a dyn Embedder,
    pub(crate) project: PathBuf,
    pub(crate) retrieval_k: usize,
    pub(crate) markers: SummaryMarkers,
}

impl<'a> ChapterPipeline<'a> {
    pub fn new(
        generator: &'a dyn TextGenerator,
        embedder: &'a dyn Embedder,
        project: &Path,
        retrieval_k: usize,
    ) -> Self {
        Self {
            generator,
            embedder,
            project: project.to_owned(),
            retrieval_k,
            markers: SummaryMarkers::default(),
        }
    }

    pub fn with_markers(mut self, markers: SummaryMarkers) -> Self {
        self.markers = markers;
        self
    }

    /// Assembles the generation prompt for `index`. The first chapter is
    /// grounded directly in the architecture document; later chapters run
    /// summarization and retrieval first.
    pub async fn build_chapter_prompt(
        &self,
        index: u32,
        inputs: &ChapterInputs,
    ) -> anyhow::Result<String> {
        if index == 0 {
            anyhow::bail!("chapter indices are 1-based");
        }

        let entry = blueprint::lookup_in_project(&self.project, index)?;
        let novel_setting = history::read_architecture(&self.project)?;

        if index == 1 {
            return Ok(prompts::first_chapter(index, &entry, inputs, &novel_setting));
        }

        let window = history::recent_chapters(&self.project, index, RECENT_WINDOW)?;
        let (short_summary, next_keywords) =
            summary::summarize_recent_chapters(self.generator, &window, &self.markers)
                .await
                .context("summarize recent chapters")?;
        let previous_chapter_excerpt = previous_chapter_excerpt(&window);

        let query = retrieval::build_retrieval_query(&short_summary, &next_keywords);
        let retrieved = retrieval::retrieve_relevant_context(
            self.embedder,
            &self.project,
            &query,
            self.retrieval_k,
        )
        .await
        .context("retrieve relevant context")?;
        let context_excerpt = retrieval::effective_context(&retrieved, &query);

        let global_summary = history::read_global_summary(&self.project)?;
        let character_state = history::read_character_state(&self.project)?;

        Ok(prompts::next_chapter(
            index,
            &entry,
            inputs,
            &novel_setting,
            &global_summary,
            &character_state,
            &context_excerpt,
            &previous_chapter_excerpt,
        ))
    }

    /// Resolves the prompt, invokes generation once, and persists the draft.
    /// An empty cleaned result is logged and still written; the pipeline
    /// never silently skips a chapter.
    pub async fn generate_chapter_draft(
        &self,
        index: u32,
        inputs: &ChapterInputs,
        source: PromptSource,
    ) -> anyhow::Result<String> {
        let prompt = match source {
            PromptSource::Build => self
                .build_chapter_prompt(index, inputs)
                .await
                .context("build chapter prompt")?,
            PromptSource::Verbatim(prompt) => prompt,
        };

        let draft = llm::generate_cleaned(self.generator, &prompt)
            .await
            .with_context(|| format!("generate chapter {index}"))?;
        if draft.trim().is_empty() {
            tracing::warn!(chapter = index, "generated chapter draft is empty");
        }

        history::write_chapter(&self.project, index, &draft)?;
        tracing::info!(chapter = index, chars = draft.chars().count(), "draft written");
        Ok(draft)
    }
}

/// Newest-first scan for the first non-blank chapter in the window, clipped
/// to the trailing [`EXCERPT_MAX_CHARS`] characters.
pub fn previous_chapter_excerpt(window: &[String]) -> String {
    for text in window.iter().rev() {
        if text.trim().is_empty() {
            continue;
        }
        let total = text.chars().count();
        if total > EXCERPT_MAX_CHARS {
            return text.chars().skip(total - EXCERPT_MAX_CHARS).collect();
        }
        return text.clone();
    }
    String::new()
}
