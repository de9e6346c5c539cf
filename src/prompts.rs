//! Prompt templates. All templates are Chinese; the marker literals parsed
//! by [`crate::summary`] must stay in sync with [`summarize_recent`].

use crate::blueprint::ChapterBlueprint;
use crate::chapter::ChapterInputs;

pub fn summarize_recent(combined_text: &str) -> String {
    format!(
        "请根据以下最近几章的内容完成两件事：\n\
1. 用一段话概括当前剧情进展（不超过200字）；\n\
2. 预测下一章最可能涉及的关键字（用逗号分隔）。\n\
\n\
输出格式（必须严格使用以下两行前缀，各占一行）：\n\
短期摘要: <剧情概括>\n\
下一章关键字: <关键字列表>\n\
\n\
最近章节内容：\n\
{combined_text}\n"
    )
}

pub fn first_chapter(
    index: u32,
    entry: &ChapterBlueprint,
    inputs: &ChapterInputs,
    novel_setting: &str,
) -> String {
    format!(
        "即将创作：第{index}章《{title}》\n\
本章定位：{role}\n\
核心作用：{purpose}\n\
悬念密度：{suspense}\n\
伏笔操作：{foreshadowing}\n\
认知颠覆：{plot_twist}\n\
本章简述：{summary}\n\
\n\
小说设定：\n\
{novel_setting}\n\
\n\
本章目标字数：约{word_target}字。\n\
核心人物：{characters}\n\
关键道具：{key_items}\n\
空间坐标：{scene_location}\n\
时间压力：{time_constraint}\n\
\n\
内容指导：\n\
{user_guidance}\n\
\n\
请创作本书的开篇章节：交代核心人物与世界观，并在结尾留下第一个悬念。\n\
只输出第{index}章的正文文字，不要标题，不要解释。\n",
        title = entry.title,
        role = entry.role,
        purpose = entry.purpose,
        suspense = entry.suspense_level,
        foreshadowing = entry.foreshadowing,
        plot_twist = entry.plot_twist_level,
        summary = entry.summary,
        word_target = inputs.word_target,
        characters = inputs.characters_involved,
        key_items = inputs.key_items,
        scene_location = inputs.scene_location,
        time_constraint = inputs.time_constraint,
        user_guidance = inputs.user_guidance,
    )
}

#[allow(clippy::too_many_arguments)]
pub fn next_chapter(
    index: u32,
    entry: &ChapterBlueprint,
    inputs: &ChapterInputs,
    novel_setting: &str,
    global_summary: &str,
    character_state: &str,
    context_excerpt: &str,
    previous_chapter_excerpt: &str,
) -> String {
    format!(
        "即将创作：第{index}章《{title}》\n\
本章定位：{role}\n\
核心作用：{purpose}\n\
悬念密度：{suspense}\n\
伏笔操作：{foreshadowing}\n\
认知颠覆：{plot_twist}\n\
本章简述：{summary}\n\
\n\
小说设定：\n\
{novel_setting}\n\
\n\
全局摘要：\n\
{global_summary}\n\
\n\
角色状态：\n\
{character_state}\n\
\n\
检索到的相关上下文：\n\
{context_excerpt}\n\
\n\
上一章结尾片段：\n\
{previous_chapter_excerpt}\n\
\n\
本章目标字数：约{word_target}字。\n\
核心人物：{characters}\n\
关键道具：{key_items}\n\
空间坐标：{scene_location}\n\
时间压力：{time_constraint}\n\
\n\
内容指导：\n\
{user_guidance}\n\
\n\
请紧接上一章结尾继续创作，保持人物、情节与设定的连贯。\n\
只输出第{index}章的正文文字，不要标题，不要解释。\n",
        title = entry.title,
        role = entry.role,
        purpose = entry.purpose,
        suspense = entry.suspense_level,
        foreshadowing = entry.foreshadowing,
        plot_twist = entry.plot_twist_level,
        summary = entry.summary,
        word_target = inputs.word_target,
        characters = inputs.characters_involved,
        key_items = inputs.key_items,
        scene_location = inputs.scene_location,
        time_constraint = inputs.time_constraint,
        user_guidance = inputs.user_guidance,
    )
}

pub fn update_global_summary(chapter_text: &str, global_summary: &str) -> String {
    format!(
        "以下是新完成章节的正文：\n\
{chapter_text}\n\
\n\
这是当前的全局摘要（可为空）：\n\
{global_summary}\n\
\n\
请将新章节的情节要点融入全局摘要，输出更新后的完整全局摘要。\n\
只输出摘要文字，不要解释。\n"
    )
}

pub fn update_character_state(chapter_text: &str, character_state: &str) -> String {
    format!(
        "以下是新完成章节的正文：\n\
{chapter_text}\n\
\n\
这是当前的角色状态文档（可为空）：\n\
{character_state}\n\
\n\
请根据新章节更新每个角色的位置、处境、物品与人物关系，输出更新后的完整角色状态文档。\n\
只输出文档内容，不要解释。\n"
    )
}

pub fn consistency_check(
    novel_setting: &str,
    character_state: &str,
    global_summary: &str,
    chapter_text: &str,
    prior_findings: &str,
) -> String {
    format!(
        "请审校下面的章节文本是否与既有设定冲突（时间线、人物行为、伏笔、世界观）。\n\
\n\
小说设定：\n\
{novel_setting}\n\
\n\
角色状态：\n\
{character_state}\n\
\n\
全局摘要：\n\
{global_summary}\n\
\n\
此前审校发现的问题：\n\
{prior_findings}\n\
\n\
待审校章节：\n\
{chapter_text}\n\
\n\
请逐条列出发现的冲突与尚未回收的剧情要点；若没有明显冲突，输出“无明显冲突”。\n"
    )
}

pub fn enrich_chapter(chapter_text: &str, word_target: usize) -> String {
    format!(
        "以下章节正文篇幅不足，请在不改变剧情走向与叙事风格的前提下扩写至约{word_target}字，\
补充细节描写与人物对话。\n\
\n\
原文：\n\
{chapter_text}\n\
\n\
只输出扩写后的完整正文，不要解释。\n"
    )
}
