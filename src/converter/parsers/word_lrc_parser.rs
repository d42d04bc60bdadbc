//! # 逐字 LRC 解析器
//!
//! 格式：`[00:28.850]曲[00:32.455]：[00:36.060]钱`
//!
//! 每个字的结束时间取自下一个时间标签，行内最后一个字使用默认时长。
//! 行的开始时间取行内最早的时间标签，可能早于第一个字的开始时间。

use std::sync::LazyLock;

use lyric_engine_core::{LrcFormat, LyricDocument, LyricLine, LyricWord};
use regex::Regex;

use super::format_detector::is_meta_line;
use crate::converter::time_codec::parse_timestamp;

static WORD_BY_WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(\d{2}):(\d{2})\.(\d+)]([^\[\]]*)").expect("编译 WORD_BY_WORD_REGEX 失败")
});

/// 行内最后一个字没有后续时间标签时使用的时长。
pub const DEFAULT_WORD_DURATION_MS: u64 = 1000;

/// 解析逐字 LRC 格式内容。
#[must_use]
pub fn parse_word_by_word_lrc(content: &str) -> LyricDocument {
    let mut lines: Vec<LyricLine> = Vec::new();

    for raw_line in content.lines() {
        let line_str = raw_line.trim();
        if line_str.is_empty() || is_meta_line(line_str) {
            continue;
        }

        if let Some(line) = parse_word_line(line_str) {
            push_with_clamp(&mut lines, line);
        }
    }

    LyricDocument::new(LrcFormat::WordByWord, lines)
}

fn parse_word_line(line_str: &str) -> Option<LyricLine> {
    let mut words: Vec<LyricWord> = Vec::new();
    let mut line_start_ms: Option<u64> = None;

    for caps in WORD_BY_WORD_REGEX.captures_iter(line_str) {
        let Some(start_ms) = parse_timestamp(&caps[1], &caps[2], &caps[3]) else {
            continue;
        };
        let text = &caps[4];

        // 行首的空标签不参与计时
        if text.is_empty() && words.is_empty() {
            continue;
        }

        line_start_ms = Some(line_start_ms.map_or(start_ms, |s| s.min(start_ms)));

        if let Some(prev_word) = words.last_mut() {
            prev_word.end_ms = start_ms;
        }

        if !text.is_empty() {
            words.push(LyricWord::open(text, start_ms));
        }
    }

    close_last_word(&mut words);

    let mut line = LyricLine::from_words(words)?;
    line.start_ms = line_start_ms.unwrap_or(line.start_ms);
    Some(line)
}

/// 给行内最后一个字设置默认时长。
pub(super) fn close_last_word(words: &mut [LyricWord]) {
    if let Some(last_word) = words.last_mut() {
        last_word.end_ms = last_word.start_ms + DEFAULT_WORD_DURATION_MS;
    }
}

/// 追加新行，并在新行开始于上一行最后一个字之后时，
/// 把上一行最后一个字（以及上一行）的结束时间截断到新行的开始时间。
pub(super) fn push_with_clamp(lines: &mut Vec<LyricLine>, line: LyricLine) {
    if let Some(prev_line) = lines.last_mut()
        && let Some(prev_last_word) = prev_line.words.last_mut()
        && line.start_ms > prev_last_word.start_ms
    {
        prev_last_word.end_ms = prev_last_word.end_ms.min(line.start_ms);
        prev_line.end_ms = prev_last_word.end_ms;
    }

    lines.push(line);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_back_patching() {
        let doc = parse_word_by_word_lrc("[00:01.000]A[00:02.000]B[00:03.000]C");
        assert_eq!(doc.format, LrcFormat::WordByWord);
        assert_eq!(doc.lines.len(), 1);

        let words = &doc.lines[0].words;
        assert_eq!(words.len(), 3);
        assert_eq!((words[0].start_ms, words[0].end_ms), (1000, 2000));
        assert_eq!((words[1].start_ms, words[1].end_ms), (2000, 3000));
        assert_eq!((words[2].start_ms, words[2].end_ms), (3000, 4000));
        assert_eq!(doc.lines[0].start_ms, 1000);
        assert_eq!(doc.lines[0].end_ms, 4000);
    }

    #[test]
    fn test_closing_tag_patches_previous_word_then_default_tail() {
        // 末尾的空标签只会修正上一个字，随后最后一个字仍使用默认时长
        let doc = parse_word_by_word_lrc("[00:00.50][00:01.00]A[00:01.50]B[00:01.80]");
        let words = &doc.lines[0].words;
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].end_ms, 1500);
        assert_eq!(words[1].end_ms, 2500);
        assert_eq!(doc.lines[0].start_ms, 1000);
    }

    #[test]
    fn test_line_start_is_earliest_tag() {
        let doc = parse_word_by_word_lrc("[00:02.000]A[00:01.000]B");
        let line = &doc.lines[0];
        assert_eq!(line.start_ms, 1000);
        assert_eq!(line.words[0].start_ms, 2000);
    }

    #[test]
    fn test_previous_line_is_clamped() {
        let content = "[00:01.000]A[00:02.000]B\n[00:02.500]C[00:03.000]D";
        let doc = parse_word_by_word_lrc(content);

        assert_eq!(doc.lines.len(), 2);
        assert_eq!(doc.lines[0].words[1].end_ms, 2500);
        assert_eq!(doc.lines[0].end_ms, 2500);
        assert_eq!(doc.lines[1].end_ms, 4000);
    }

    #[test]
    fn test_overlapping_line_is_not_clamped() {
        let content = "[00:05.000]A[00:06.000]B\n[00:05.500]C[00:07.000]D";
        let doc = parse_word_by_word_lrc(content);
        assert_eq!(doc.lines[0].end_ms, 7000);
    }

    #[test]
    fn test_meta_and_empty_lines_skipped() {
        let doc = parse_word_by_word_lrc("[ti:x]\n\n[00:01.00][00:02.00]\n[00:03.00]Z[00:04.00]Y");
        assert_eq!(doc.lines.len(), 1);
        assert_eq!(doc.lines[0].text(), "ZY");
    }
}
