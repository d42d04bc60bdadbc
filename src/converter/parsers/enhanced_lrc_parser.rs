//! # 增强型 LRC (ESLyric) 解析器
//!
//! 格式：`[01:37.305]<01:37.624>怕<01:37.943>你`
//!
//! 行的开始时间取行首的时间标签，不一定等于第一个字的开始时间。

use std::sync::LazyLock;

use lyric_engine_core::{LrcFormat, LyricDocument, LyricLine, LyricWord};
use regex::Regex;

use super::{
    format_detector::{ENHANCED_TIME_TAG_REGEX, is_meta_line},
    word_lrc_parser::{DEFAULT_WORD_DURATION_MS, close_last_word, push_with_clamp},
};
use crate::converter::time_codec::parse_timestamp;

static LINE_TIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(\d{2}):(\d{2})\.(\d+)]").expect("编译 LINE_TIME_REGEX 失败")
});

static ENHANCED_WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(\d{2}):(\d{2})\.(\d+)>([^<]*)").expect("编译 ENHANCED_WORD_REGEX 失败")
});

/// 解析增强型 LRC 格式内容。
///
/// 没有行时间标签的行会被忽略。只有行时间标签而没有 `<...>` 标签的行，
/// 整行文本作为一个字，时长为默认值。
#[must_use]
pub fn parse_enhanced_lrc(content: &str) -> LyricDocument {
    let mut lines: Vec<LyricLine> = Vec::new();

    for raw_line in content.lines() {
        let line_str = raw_line.trim();
        if line_str.is_empty() || is_meta_line(line_str) {
            continue;
        }

        let Some(line_caps) = LINE_TIME_REGEX.captures(line_str) else {
            continue;
        };
        let Some(line_start_ms) = parse_timestamp(&line_caps[1], &line_caps[2], &line_caps[3])
        else {
            continue;
        };
        let content_after_time = &line_str[line_caps[0].len()..];

        let words = if ENHANCED_TIME_TAG_REGEX.is_match(content_after_time) {
            parse_inline_words(content_after_time)
        } else {
            let text = content_after_time.trim();
            if text.is_empty() {
                Vec::new()
            } else {
                vec![LyricWord::new(
                    text,
                    line_start_ms,
                    line_start_ms + DEFAULT_WORD_DURATION_MS,
                )]
            }
        };

        if let Some(mut line) = LyricLine::from_words(words) {
            line.start_ms = line_start_ms;
            push_with_clamp(&mut lines, line);
        }
    }

    LyricDocument::new(LrcFormat::Enhanced, lines)
}

fn parse_inline_words(content: &str) -> Vec<LyricWord> {
    let mut words: Vec<LyricWord> = Vec::new();

    for caps in ENHANCED_WORD_REGEX.captures_iter(content) {
        let Some(start_ms) = parse_timestamp(&caps[1], &caps[2], &caps[3]) else {
            continue;
        };
        let text = &caps[4];

        if let Some(prev_word) = words.last_mut() {
            prev_word.end_ms = start_ms;
        }

        if !text.is_empty() {
            words.push(LyricWord::open(text, start_ms));
        }
    }

    close_last_word(&mut words);
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_tags() {
        let doc = parse_enhanced_lrc("[01:37.305]<01:37.624>怕<01:37.943>你");
        assert_eq!(doc.format, LrcFormat::Enhanced);

        let line = &doc.lines[0];
        assert_eq!(line.start_ms, 97_305);
        assert_eq!(line.words.len(), 2);
        assert_eq!(line.words[0].word, "怕");
        assert_eq!(line.words[0].start_ms, 97_624);
        assert_eq!(line.words[0].end_ms, 97_943);
        assert_eq!(line.words[1].end_ms, 98_943);
        assert_eq!(line.end_ms, 98_943);
    }

    #[test]
    fn test_line_without_inline_tags() {
        let doc = parse_enhanced_lrc("[00:10.00]  整行歌词  \n[00:20.00]<00:20.00>A");
        assert_eq!(doc.lines.len(), 2);
        assert_eq!(doc.lines[0].text(), "整行歌词");
        assert_eq!(doc.lines[0].words[0].start_ms, 10_000);
        assert_eq!(doc.lines[0].end_ms, 11_000);
    }

    #[test]
    fn test_lines_without_leading_timestamp_are_skipped() {
        let doc = parse_enhanced_lrc("<00:01.00>A\n[ar:x]\n[00:02.00]");
        assert!(doc.is_empty());
    }

    #[test]
    fn test_previous_line_clamp() {
        let content = "[00:01.00]<00:01.00>A<00:01.50>B\n[00:02.00]<00:02.00>C";
        let doc = parse_enhanced_lrc(content);
        assert_eq!(doc.lines[0].words[1].end_ms, 2000);
        assert_eq!(doc.lines[0].end_ms, 2000);
    }
}
