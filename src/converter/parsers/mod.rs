//! LRC 家族与 QRC 歌词的解析器。

pub mod enhanced_lrc_parser;
pub mod format_detector;
pub mod lrc_parser;
pub mod qrc_content;
pub mod qrc_parser;
pub mod word_lrc_parser;

use lyric_engine_core::{LrcFormat, LyricDocument};
use tracing::debug;

use self::{
    enhanced_lrc_parser::parse_enhanced_lrc, format_detector::detect_lrc_format,
    lrc_parser::parse_lrc, word_lrc_parser::parse_word_by_word_lrc,
};

/// 自动检测 LRC 的具体格式并解析。
///
/// QRC 不会被检测到，需要直接使用 [`qrc_parser::QrcParser`]。
#[must_use]
pub fn parse_smart_lrc(content: &str) -> LyricDocument {
    let format = detect_lrc_format(content);

    let document = match format {
        LrcFormat::WordByWord => parse_word_by_word_lrc(content),
        LrcFormat::Enhanced => parse_enhanced_lrc(content),
        LrcFormat::Line | LrcFormat::Qrc => parse_lrc(content),
    };

    debug!(
        "[LyricParser] 检测到歌词格式: {}, 共 {} 行",
        format,
        document.len()
    );
    document
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smart_parse_dispatches_by_format() {
        let line = parse_smart_lrc("[00:01.00]Hello\n[00:03.00]World");
        assert_eq!(line.format, LrcFormat::Line);
        assert_eq!(line.len(), 2);

        let word = parse_smart_lrc("[00:01.000]He[00:01.500]llo");
        assert_eq!(word.format, LrcFormat::WordByWord);
        assert_eq!(word.lines[0].words.len(), 2);

        let enhanced = parse_smart_lrc("[00:01.000]<00:01.000>He<00:01.500>llo");
        assert_eq!(enhanced.format, LrcFormat::Enhanced);
        assert_eq!(enhanced.lines[0].text(), "Hello");
    }

    #[test]
    fn test_smart_parse_empty_input() {
        let doc = parse_smart_lrc("");
        assert_eq!(doc.format, LrcFormat::Line);
        assert!(doc.is_empty());
    }
}
