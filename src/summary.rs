//! Condenses the most recent chapters into a short-term memory pair:
//! a one-paragraph summary plus forward-looking keywords used to seed
//! retrieval for the next chapter.

use crate::llm::{self, TextGenerator};
use crate::prompts;

/// Marker literals agreed upon with the prompt template. Isolated here so a
/// locale or template change swaps the literals without touching pipeline
/// logic.
#[derive(Debug, Clone)]
pub struct SummaryMarkers {
    pub short_summary: String,
    pub next_keywords: String,
}

impl Default for SummaryMarkers {
    fn default() -> Self {
        Self {
            short_summary: "短期摘要:".to_owned(),
            next_keywords: "下一章关键字:".to_owned(),
        }
    }
}

/// Returns `(short_summary, next_chapter_keywords)`.
///
/// An entirely empty window returns `("", "")` without invoking the
/// generator; there is nothing to summarize at the start of a book.
/// Generator errors propagate to the caller.
pub async fn summarize_recent_chapters(
    generator: &dyn TextGenerator,
    chapter_texts: &[String],
    markers: &SummaryMarkers,
) -> anyhow::Result<(String, String)> {
    let combined = chapter_texts.join("\n");
    let combined = combined.trim();
    if combined.is_empty() {
        return Ok((String::new(), String::new()));
    }

    let prompt = prompts::summarize_recent(combined);
    let response = llm::generate_cleaned(generator, &prompt).await?;
    Ok(parse_summary_response(&response, markers))
}

/// Tolerant line-based parse. When neither marker is present the whole
/// response becomes the short summary; the retrieval query downstream still
/// gets useful signal.
pub fn parse_summary_response(response: &str, markers: &SummaryMarkers) -> (String, String) {
    let mut short_summary = String::new();
    let mut next_keywords = String::new();

    for line in response.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix(markers.short_summary.as_str()) {
            short_summary = rest.trim().to_owned();
        } else if let Some(rest) = line.strip_prefix(markers.next_keywords.as_str()) {
            next_keywords = rest.trim().to_owned();
        }
    }

    if short_summary.is_empty() && next_keywords.is_empty() {
        short_summary = response.to_owned();
    }
    (short_summary, next_keywords)
}
