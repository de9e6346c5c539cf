//! Parser for the chapter blueprint document (`Novel_directory.txt`).
//!
//! The document lists one block per chapter:
//!
//! ```text
//! 第1章 - 暗潮初起
//! 本章定位：角色引入
//! 核心作用：建立主线冲突
//! 悬念密度：中
//! 伏笔操作：埋设伏笔A
//! 认知颠覆：Lv.1
//! 本章简述：主角在雨夜接到一通陌生来电。
//! ```

use anyhow::Context as _;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterBlueprint {
    pub title: String,
    pub role: String,
    pub purpose: String,
    pub suspense_level: String,
    pub foreshadowing: String,
    pub plot_twist_level: String,
    pub summary: String,
}

/// A chapter index absent from the blueprint is a hard error: building a
/// prompt from blank metadata would be worse than failing.
pub fn lookup(document: &str, index: u32) -> anyhow::Result<ChapterBlueprint> {
    let mut current: Option<(u32, ChapterBlueprint)> = None;

    for line in document.lines() {
        let line = line.trim();
        if let Some((number, title)) = parse_chapter_heading(line) {
            if let Some((found, entry)) = current.take()
                && found == index
            {
                return Ok(entry);
            }
            current = Some((
                number,
                ChapterBlueprint {
                    title,
                    ..ChapterBlueprint::default()
                },
            ));
            continue;
        }

        let Some((_, entry)) = current.as_mut() else {
            continue;
        };
        if let Some(value) = labeled_value(line, "本章定位") {
            entry.role = value;
        } else if let Some(value) = labeled_value(line, "核心作用") {
            entry.purpose = value;
        } else if let Some(value) = labeled_value(line, "悬念密度") {
            entry.suspense_level = value;
        } else if let Some(value) = labeled_value(line, "伏笔操作") {
            entry.foreshadowing = value;
        } else if let Some(value) = labeled_value(line, "认知颠覆") {
            entry.plot_twist_level = value;
        } else if let Some(value) = labeled_value(line, "本章简述") {
            entry.summary = value;
        }
    }

    if let Some((found, entry)) = current
        && found == index
    {
        return Ok(entry);
    }

    anyhow::bail!("chapter {index} not found in blueprint document");
}

pub fn lookup_in_project(project: &std::path::Path, index: u32) -> anyhow::Result<ChapterBlueprint> {
    let document = crate::history::read_blueprint_document(project)?;
    lookup(&document, index).with_context(|| {
        format!(
            "blueprint lookup in {}",
            project.join(crate::history::BLUEPRINT_FILE).display()
        )
    })
}

/// `第12章 - 标题` or `第12章`; the title falls back to the heading itself.
fn parse_chapter_heading(line: &str) -> Option<(u32, String)> {
    let rest = line.strip_prefix("第")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let after = &rest[digits.len()..];
    let after = after.strip_prefix("章")?;
    let number: u32 = digits.parse().ok()?;

    let title = after
        .trim_start()
        .trim_start_matches(['-', '－', '—', '·', ' '])
        .trim()
        .to_owned();
    let title = if title.is_empty() {
        format!("第{number}章")
    } else {
        title
    };
    Some((number, title))
}

fn labeled_value(line: &str, label: &str) -> Option<String> {
    let rest = line.strip_prefix(label)?;
    let rest = rest.strip_prefix('：').or_else(|| rest.strip_prefix(':'))?;
    Some(rest.trim().to_owned())
}
