//! Per-project persistence: chapter drafts and the auxiliary state files
//! (`Novel_architecture.txt`, `Novel_directory.txt`, `global_summary.txt`,
//! `character_state.txt`, `plot_arcs.txt`). The file names are an external
//! contract; other tooling reads them.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

pub const ARCHITECTURE_FILE: &str = "Novel_architecture.txt";
pub const BLUEPRINT_FILE: &str = "Novel_directory.txt";
pub const GLOBAL_SUMMARY_FILE: &str = "global_summary.txt";
pub const CHARACTER_STATE_FILE: &str = "character_state.txt";
pub const PLOT_ARCS_FILE: &str = "plot_arcs.txt";

pub fn chapters_dir(project: &Path) -> PathBuf {
    project.join("chapters")
}

pub fn chapter_path(project: &Path, index: u32) -> PathBuf {
    chapters_dir(project).join(format!("chapter_{index}.txt"))
}

/// Missing files read as empty string; a chapter that was never generated is
/// "no prior content", not an error.
fn read_optional(path: &Path) -> anyhow::Result<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(err).with_context(|| format!("read {}", path.display())),
    }
}

pub fn read_chapter(project: &Path, index: u32) -> anyhow::Result<String> {
    read_optional(&chapter_path(project, index))
}

/// Overwrites any existing draft (clear-then-write); regeneration and
/// finalize-driven rewrites go through the same path.
pub fn write_chapter(project: &Path, index: u32, text: &str) -> anyhow::Result<()> {
    let dir = chapters_dir(project);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("create chapters dir: {}", dir.display()))?;

    let path = chapter_path(project, index);
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path)
        .with_context(|| format!("open chapter file: {}", path.display()))?;
    file.write_all(text.as_bytes())
        .with_context(|| format!("write chapter file: {}", path.display()))?;
    file.flush()
        .with_context(|| format!("flush chapter file: {}", path.display()))?;
    Ok(())
}

pub fn read_architecture(project: &Path) -> anyhow::Result<String> {
    read_optional(&project.join(ARCHITECTURE_FILE))
}

pub fn read_blueprint_document(project: &Path) -> anyhow::Result<String> {
    read_optional(&project.join(BLUEPRINT_FILE))
}

pub fn read_global_summary(project: &Path) -> anyhow::Result<String> {
    read_optional(&project.join(GLOBAL_SUMMARY_FILE))
}

pub fn write_global_summary(project: &Path, text: &str) -> anyhow::Result<()> {
    std::fs::write(project.join(GLOBAL_SUMMARY_FILE), text).context("write global summary")
}

pub fn read_character_state(project: &Path) -> anyhow::Result<String> {
    read_optional(&project.join(CHARACTER_STATE_FILE))
}

pub fn write_character_state(project: &Path, text: &str) -> anyhow::Result<()> {
    std::fs::write(project.join(CHARACTER_STATE_FILE), text).context("write character state")
}

pub fn read_plot_arcs(project: &Path) -> anyhow::Result<String> {
    read_optional(&project.join(PLOT_ARCS_FILE))
}

/// Append-only record of consistency-check findings, keyed by append order.
pub fn append_plot_arcs(project: &Path, index: u32, findings: &str) -> anyhow::Result<()> {
    let path = project.join(PLOT_ARCS_FILE);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open plot arc log: {}", path.display()))?;
    writeln!(file, "第{index}章一致性审校结果如下：\n{findings}")
        .with_context(|| format!("append plot arc log: {}", path.display()))?;
    Ok(())
}

/// Up to `n` prior chapter texts ending just before `current`, oldest first.
/// Missing chapters yield empty strings so positional alignment with the
/// chapter index is preserved.
pub fn recent_chapters(project: &Path, current: u32, n: u32) -> anyhow::Result<Vec<String>> {
    let start = current.saturating_sub(n).max(1);
    let mut texts = Vec::new();
    for index in start..current {
        texts.push(read_chapter(project, index)?.trim().to_owned());
    }
    Ok(texts)
}
