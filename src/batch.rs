//! Batch orchestrator: drives draft → consistency check → finalize across a
//! closed range of chapter indices, strictly in order. Each step's input
//! depends on the previous step's committed output (finalize mutates the
//! global summary and character state consumed by the next chapter's prompt
//! builder), so no two chapters ever run concurrently.

use anyhow::Context as _;

use crate::chapter::{ChapterInputs, ChapterPipeline, PromptSource};
use crate::{consistency, history};

impl ChapterPipeline<'_> {
    /// Runs chapters `start..=end`. On failure the remaining range is
    /// aborted and the error names the chapter it occurred at; chapters
    /// already finalized stay on disk.
    pub async fn run_batch(
        &self,
        start: u32,
        end: u32,
        base_inputs: &ChapterInputs,
    ) -> anyhow::Result<()> {
        if start == 0 {
            anyhow::bail!("chapter indices are 1-based");
        }
        if start > end {
            anyhow::bail!("batch range is empty: start {start} > end {end}");
        }

        for index in start..=end {
            tracing::info!(chapter = index, "batch: starting chapter");
            self.run_chapter(index, base_inputs)
                .await
                .with_context(|| format!("batch aborted at chapter {index}"))?;
            tracing::info!(chapter = index, "batch: chapter finished");
        }

        tracing::info!(start, end, "batch finished");
        Ok(())
    }

    async fn run_chapter(&self, index: u32, base_inputs: &ChapterInputs) -> anyhow::Result<()> {
        let mut inputs = base_inputs.clone();

        // Every third chapter folds accumulated review findings back into
        // the guidance as a course correction.
        let plot_arcs = history::read_plot_arcs(&self.project)?;
        if !plot_arcs.trim().is_empty() && index % 3 == 0 {
            tracing::info!(chapter = index, "injecting plot-arc findings into guidance");
            if !inputs.user_guidance.trim().is_empty() {
                inputs.user_guidance.push('\n');
            }
            inputs.user_guidance.push_str(plot_arcs.trim());
        }

        let draft = self
            .generate_chapter_draft(index, &inputs, PromptSource::Build)
            .await
            .context("draft")?;

        let novel_setting = history::read_architecture(&self.project)?;
        let character_state = history::read_character_state(&self.project)?;
        let global_summary = history::read_global_summary(&self.project)?;
        let findings = consistency::check_consistency(
            self.generator,
            &novel_setting,
            &character_state,
            &global_summary,
            &draft,
            &plot_arcs,
        )
        .await
        .context("consistency check")?;
        history::append_plot_arcs(&self.project, index, &findings)?;

        self.finalize_chapter(index, inputs.word_target)
            .await
            .context("finalize")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history;
    use crate::llm::doubles::{FixedEmbedder, ScriptedGenerator};

    const BLUEPRINT: &str = "\
第1章 - 开端
本章简述：开端。
第2章 - 发展
本章简述：发展。
第3章 - 转折
本章简述：转折。
第4章 - 余波
本章简述：余波。
";

    fn project() -> tempfile::TempDir {
        let temp = tempfile::TempDir::new().expect("tempdir");
        std::fs::write(temp.path().join(history::BLUEPRINT_FILE), BLUEPRINT).expect("blueprint");
        std::fs::write(temp.path().join(history::ARCHITECTURE_FILE), "设定。")
            .expect("architecture");
        temp
    }

    fn inputs() -> ChapterInputs {
        ChapterInputs {
            word_target: 1,
            ..ChapterInputs::default()
        }
    }

    #[tokio::test]
    async fn failure_at_consistency_halts_before_the_next_draft() -> anyhow::Result<()> {
        let temp = project();
        // Chapter 1: draft, consistency, summary update, state update.
        // Chapter 2: summarize window, draft, consistency -> provider error.
        let generator = ScriptedGenerator::new([
            Ok("第一章正文。"),
            Ok("无明显冲突"),
            Ok("全局摘要v1"),
            Ok("角色状态v1"),
            Ok("短期摘要: S\n下一章关键字: K"),
            Ok("第二章正文。"),
            Err("provider exploded"),
        ]);
        let embedder = FixedEmbedder::new();
        let pipeline = ChapterPipeline::new(&generator, &embedder, temp.path(), 2);

        let err = pipeline.run_batch(1, 4, &inputs()).await.unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("batch aborted at chapter 2"), "chain: {chain}");
        assert!(chain.contains("provider exploded"), "chain: {chain}");

        // Chapter 1 stayed finalized; chapter 2's draft was written before
        // the failing step; chapter 3 was never drafted.
        assert_eq!(history::read_global_summary(temp.path())?, "全局摘要v1");
        assert_eq!(history::read_chapter(temp.path(), 2)?, "第二章正文。");
        assert!(!history::chapter_path(temp.path(), 3).exists());
        assert_eq!(generator.call_count(), 7);
        Ok(())
    }

    #[tokio::test]
    async fn plot_arcs_are_injected_for_every_third_chapter() -> anyhow::Result<()> {
        let temp = project();
        std::fs::write(temp.path().join(history::PLOT_ARCS_FILE), "ARC-FINDING-伏笔A")?;

        // Chapters 1 and 2 missing -> empty window -> no summarizer call.
        // Stop right after the draft to inspect its prompt.
        let generator = ScriptedGenerator::new([Ok("第三章正文。"), Err("stop")]);
        let embedder = FixedEmbedder::new();
        let pipeline = ChapterPipeline::new(&generator, &embedder, temp.path(), 2);

        let _ = pipeline.run_batch(3, 3, &inputs()).await;
        assert!(generator.prompt(0).contains("ARC-FINDING-伏笔A"));
        Ok(())
    }

    #[tokio::test]
    async fn plot_arcs_are_not_injected_off_cycle() -> anyhow::Result<()> {
        let temp = project();
        std::fs::write(temp.path().join(history::PLOT_ARCS_FILE), "ARC-FINDING-伏笔A")?;

        let generator = ScriptedGenerator::new([Ok("第四章正文。"), Err("stop")]);
        let embedder = FixedEmbedder::new();
        let pipeline = ChapterPipeline::new(&generator, &embedder, temp.path(), 2);

        let _ = pipeline.run_batch(4, 4, &inputs()).await;
        assert!(!generator.prompt(0).contains("ARC-FINDING-伏笔A"));
        Ok(())
    }

    #[tokio::test]
    async fn consistency_findings_land_in_the_plot_arc_log() -> anyhow::Result<()> {
        let temp = project();
        let generator = ScriptedGenerator::new([
            Ok("第一章正文。"),
            Ok("时间线冲突：第三天与第五天矛盾"),
            Ok("摘要"),
            Ok("状态"),
        ]);
        let embedder = FixedEmbedder::new();
        let pipeline = ChapterPipeline::new(&generator, &embedder, temp.path(), 2);

        pipeline.run_batch(1, 1, &inputs()).await?;
        let log = history::read_plot_arcs(temp.path())?;
        assert!(log.contains("第1章一致性审校结果如下：\n时间线冲突"));
        Ok(())
    }

    #[tokio::test]
    async fn empty_and_inverted_ranges_are_rejected() {
        let temp = project();
        let generator = ScriptedGenerator::new([]);
        let embedder = FixedEmbedder::new();
        let pipeline = ChapterPipeline::new(&generator, &embedder, temp.path(), 2);

        assert!(pipeline.run_batch(0, 1, &inputs()).await.is_err());
        assert!(pipeline.run_batch(3, 2, &inputs()).await.is_err());
    }
}
