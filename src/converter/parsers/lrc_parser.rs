//! # LRC 格式解析器
//!
//! 解析普通逐行 LRC。相同时间戳的多行文本按出现顺序分组：
//! 第一行作为主歌词，第二行作为翻译，第三行作为音译，
//! 之后的行作为同一时间戳上的独立歌词行。

use std::sync::LazyLock;

use lyric_engine_core::{LrcFormat, LyricDocument, LyricLine};
use regex::Regex;
use tracing::trace;

use crate::converter::time_codec::parse_timestamp;

/// 行时间戳，允许 `[m:s]`、`[mm:ss.xx]` 以及 `[mm:ss:xx]`
static LRC_TIMESTAMP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(\d{1,2}):(\d{1,2})(?:[.:](\d{1,3}))?]").expect("编译 LRC_TIMESTAMP_REGEX 失败")
});

/// 最后一行没有下一个时间戳可以作为结束时间，使用这个默认时长。
pub const DEFAULT_LAST_LINE_DURATION_MS: u64 = 10000;

struct TempLrcEntry {
    timestamp_ms: u64,
    text: String,
}

/// 解析 LRC 格式内容。
///
/// 无法识别的行会被忽略，不会返回错误。
#[must_use]
pub fn parse_lrc(content: &str) -> LyricDocument {
    let mut entries = parse_lines_to_temp_entries(content);

    // 稳定排序，保持同一时间戳下的原始顺序
    entries.sort_by_key(|e| e.timestamp_ms);

    let lines = process_timestamp_groups(&entries);
    LyricDocument::new(LrcFormat::Line, lines)
}

fn parse_lines_to_temp_entries(content: &str) -> Vec<TempLrcEntry> {
    let mut entries = Vec::new();

    for line_str in content.lines() {
        if !LRC_TIMESTAMP_REGEX.is_match(line_str) {
            continue;
        }

        let text = LRC_TIMESTAMP_REGEX.replace_all(line_str, "");
        let text = text.trim();

        for ts_cap in LRC_TIMESTAMP_REGEX.captures_iter(line_str) {
            let fraction = ts_cap.get(3).map_or("", |m| m.as_str());
            let Some(timestamp_ms) = parse_timestamp(&ts_cap[1], &ts_cap[2], fraction) else {
                trace!("[LrcParser] 跳过无法解析的时间戳: {}", &ts_cap[0]);
                continue;
            };

            entries.push(TempLrcEntry {
                timestamp_ms,
                text: text.to_string(),
            });
        }
    }

    entries
}

fn process_timestamp_groups(entries: &[TempLrcEntry]) -> Vec<LyricLine> {
    let mut lines = Vec::new();
    let mut groups = entries
        .chunk_by(|a, b| a.timestamp_ms == b.timestamp_ms)
        .peekable();

    while let Some(group) = groups.next() {
        let start_ms = group[0].timestamp_ms;
        // 空文本的时间戳同样作为上一行的结束时间
        let end_ms = groups.peek().map_or(start_ms + DEFAULT_LAST_LINE_DURATION_MS, |next| {
            next[0].timestamp_ms
        });

        let mut texts = group
            .iter()
            .map(|e| e.text.as_str())
            .filter(|t| !t.is_empty());

        let Some(main_text) = texts.next() else {
            continue;
        };

        let mut main_line = LyricLine::with_text(main_text, start_ms, end_ms);
        if let Some(translation) = texts.next() {
            main_line.translated_lyric = translation.to_string();
        }
        if let Some(romanization) = texts.next() {
            main_line.roman_lyric = romanization.to_string();
        }
        lines.push(main_line);

        for extra in texts {
            lines.push(LyricLine::with_text(extra, start_ms, end_ms));
        }
    }

    lines
}
