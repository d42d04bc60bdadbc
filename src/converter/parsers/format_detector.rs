//! LRC 家族歌词的格式检测。

use std::sync::LazyLock;

use lyric_engine_core::LrcFormat;
use regex::Regex;

/// 元数据标签，例如 `[ti:标题]`、`[offset:0]`
pub(crate) static META_TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\[[a-z]+:").expect("编译 META_TAG_REGEX 失败"));

/// 增强型 LRC 的行内时间标签 `<mm:ss.f+>`
pub(crate) static ENHANCED_TIME_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(\d{2}):(\d{2})\.(\d+)>").expect("编译 ENHANCED_TIME_TAG_REGEX 失败")
});

/// 行时间标签 `[mm:ss.f+]`
static TIME_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(\d{2}):(\d{2})\.(\d+)]").expect("编译 TIME_TAG_REGEX 失败")
});

/// 判断一行（已去除首尾空白）是否为元数据标签行。
pub(crate) fn is_meta_line(line: &str) -> bool {
    META_TAG_REGEX.is_match(line)
}

/// 检测 LRC 文本的格式。
///
/// 跳过空行和元数据行，由第一个能说明问题的行决定结果：
/// 含有 `<mm:ss.f+>` 为增强型，含有多个 `[mm:ss.f+]` 为逐字，
/// 否则继续看下一行。没有任何信号时返回逐行格式。
#[must_use]
pub fn detect_lrc_format(content: &str) -> LrcFormat {
    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() || is_meta_line(line) {
            continue;
        }

        if ENHANCED_TIME_TAG_REGEX.is_match(line) {
            return LrcFormat::Enhanced;
        }

        if TIME_TAG_REGEX.find_iter(line).nth(1).is_some() {
            return LrcFormat::WordByWord;
        }
    }

    LrcFormat::Line
}
