//! Consistency review of a finished draft against the project's standing
//! state. The heuristics live entirely in the model; this module only owns
//! the input/output contract.

use crate::llm::{self, TextGenerator};
use crate::prompts;

/// Returns the review findings as free text. The caller decides what to do
/// with them (the batch orchestrator appends them to the plot arc log).
pub async fn check_consistency(
    generator: &dyn TextGenerator,
    novel_setting: &str,
    character_state: &str,
    global_summary: &str,
    chapter_text: &str,
    prior_findings: &str,
) -> anyhow::Result<String> {
    let prompt = prompts::consistency_check(
        novel_setting,
        character_state,
        global_summary,
        chapter_text,
        prior_findings,
    );
    llm::generate_cleaned(generator, &prompt).await
}
