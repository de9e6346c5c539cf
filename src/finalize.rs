//! Finalize step: folds a finished draft back into the durable project
//! state consumed by the next chapter's prompt builder — global summary,
//! character state, and the vector index. A draft noticeably short of the
//! word target is enriched first and rewritten in place.

use anyhow::Context as _;

use crate::chapter::ChapterPipeline;
use crate::{history, llm, prompts, vectorstore};

impl ChapterPipeline<'_> {
    pub async fn finalize_chapter(&self, index: u32, word_target: usize) -> anyhow::Result<()> {
        let mut chapter_text = history::read_chapter(&self.project, index)?;
        if chapter_text.trim().is_empty() {
            tracing::warn!(chapter = index, "draft is empty; skipping finalize");
            return Ok(());
        }

        // Below 60% of the target the draft gets one enrichment pass.
        let chars = chapter_text.chars().count();
        if chars * 5 < word_target * 3 {
            tracing::info!(
                chapter = index,
                chars,
                word_target,
                "draft is short; enriching"
            );
            let enriched = llm::generate_cleaned(
                self.generator,
                &prompts::enrich_chapter(&chapter_text, word_target),
            )
            .await
            .context("enrich chapter")?;
            if enriched.trim().is_empty() {
                tracing::warn!(chapter = index, "enrichment came back empty; keeping draft");
            } else {
                chapter_text = enriched;
                history::write_chapter(&self.project, index, &chapter_text)?;
            }
        }

        let global_summary = history::read_global_summary(&self.project)?;
        let updated_summary = llm::generate_cleaned(
            self.generator,
            &prompts::update_global_summary(&chapter_text, &global_summary),
        )
        .await
        .context("update global summary")?;
        if updated_summary.trim().is_empty() {
            tracing::warn!(chapter = index, "global summary update came back empty; keeping old");
        } else {
            history::write_global_summary(&self.project, &updated_summary)?;
        }

        let character_state = history::read_character_state(&self.project)?;
        let updated_state = llm::generate_cleaned(
            self.generator,
            &prompts::update_character_state(&chapter_text, &character_state),
        )
        .await
        .context("update character state")?;
        if updated_state.trim().is_empty() {
            tracing::warn!(chapter = index, "character state update came back empty; keeping old");
        } else {
            history::write_character_state(&self.project, &updated_state)?;
        }

        vectorstore::insert_texts(self.embedder, &self.project, &[chapter_text])
            .await
            .context("index chapter text")?;

        tracing::info!(chapter = index, "chapter finalized");
        Ok(())
    }
}
