//! # QRC 格式解析器
//!
//! 行格式为 `[行开始,行时长]字(字开始,字时长)字(字开始,字时长)...`，
//! 时间均为毫秒。整体通常包在一个 XML 外壳的 `LyricContent` 属性中。

use std::sync::LazyLock;

use lyric_engine_core::{AlignTarget, LrcFormat, LyricDocument, LyricLine, LyricWord};
use regex::Regex;
use tracing::debug;

use super::{
    format_detector::is_meta_line,
    lrc_parser::parse_lrc,
    qrc_content::{LyricContentExtractor, XmlContentExtractor},
};
use crate::converter::processors::aligner::align_lyrics;

static QRC_LINE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(\d+),(\d+)](.*)$").expect("编译 QRC_LINE_REGEX 失败"));

static QRC_WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([^(]*)\((\d+),(\d+)\)").expect("编译 QRC_WORD_REGEX 失败")
});

/// 翻译中需要丢弃的行所包含的文本
const TRANSLATION_NOISE_MARKERS: [&str; 2] = ["//", "作品的著作权"];

/// QRC 解析器。
///
/// 内容提取策略在构造时注入，`QrcParser::default()` 使用 XML 解析并以正则作为后备。
pub struct QrcParser {
    extractor: Box<dyn LyricContentExtractor>,
}

impl Default for QrcParser {
    fn default() -> Self {
        Self::new(Box::new(XmlContentExtractor::default()))
    }
}

impl QrcParser {
    #[must_use]
    pub fn new(extractor: Box<dyn LyricContentExtractor>) -> Self {
        Self { extractor }
    }

    /// 解析 QRC 主歌词，并可选地合并翻译（LRC）和音译（QRC）。
    #[must_use]
    pub fn parse(
        &self,
        qrc_content: &str,
        translation: Option<&str>,
        romanization: Option<&str>,
    ) -> LyricDocument {
        let mut lines = self.parse_qrc_lines(qrc_content);

        if let Some(trans) = translation.filter(|t| !t.is_empty()) {
            let trans_lines: Vec<LyricLine> = parse_lrc(trans)
                .lines
                .into_iter()
                .filter(|line| {
                    let text = line.text();
                    !TRANSLATION_NOISE_MARKERS.iter().any(|m| text.contains(m))
                })
                .collect();
            lines = align_lyrics(&lines, &trans_lines, AlignTarget::Translation);
        }

        if let Some(roma) = romanization.filter(|r| !r.is_empty()) {
            let roma_lines: Vec<LyricLine> = self
                .parse_qrc_lines(roma)
                .into_iter()
                .map(|line| LyricLine::with_text(line.text(), line.start_ms, line.end_ms))
                .collect();
            lines = align_lyrics(&lines, &roma_lines, AlignTarget::Romanization);
        }

        debug!("[QrcParser] 解析完成，共 {} 行", lines.len());
        LyricDocument::new(LrcFormat::Qrc, lines)
    }

    /// 只解析 QRC 主歌词。
    #[must_use]
    pub fn parse_qrc_lines(&self, raw_content: &str) -> Vec<LyricLine> {
        let extracted = self.extractor.extract_content(raw_content);
        let content = extracted.as_deref().unwrap_or(raw_content);

        content.lines().filter_map(parse_qrc_line).collect()
    }
}

/// 判断文本是否为带 XML 外壳的 QRC。
#[must_use]
pub fn looks_like_qrc(content: &str) -> bool {
    content.trim_start().starts_with('<') || content.contains("<QrcInfos>")
}

fn parse_qrc_line(raw_line: &str) -> Option<LyricLine> {
    let line_str = raw_line.trim();
    if line_str.is_empty() || is_meta_line(line_str) {
        return None;
    }

    let caps = QRC_LINE_REGEX.captures(line_str)?;
    let line_start_ms: u64 = caps[1].parse().ok()?;
    let line_duration_ms: u64 = caps[2].parse().ok()?;
    let line_content = caps.get(3).map_or("", |m| m.as_str());

    let words: Vec<LyricWord> = QRC_WORD_REGEX
        .captures_iter(line_content)
        .filter_map(|word_caps| {
            let text = &word_caps[1];
            if text.is_empty() {
                return None;
            }
            let start_ms: u64 = word_caps[2].parse().ok()?;
            let duration_ms: u64 = word_caps[3].parse().ok()?;
            // 时间溢出的字直接跳过
            let end_ms = start_ms.checked_add(duration_ms)?;
            Some(LyricWord::new(text, start_ms, end_ms))
        })
        .collect();

    if words.is_empty() {
        return None;
    }

    let line_end_ms = line_start_ms.checked_add(line_duration_ms)?;

    Some(LyricLine {
        words,
        start_ms: line_start_ms,
        end_ms: line_end_ms,
        ..Default::default()
    })
}
