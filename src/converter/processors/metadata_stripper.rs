//! 元数据行清理器。
//!
//! 移除歌词开头和结尾的制作信息行，例如：
//!
//! ```text
//! 歌曲名 - 歌手名
//! 词：...
//! 曲：...
//! 编曲：...
//! 真正的歌词行 1
//! 真正的歌词行 2
//! 监制：...
//! ```

use regex::{Regex, RegexBuilder};
use tracing::{debug, trace, warn};

use lyric_engine_core::{
    LyricLine, MetadataStripperFlags, ScanLimitConfig, SongMetadataHint, StripOptions,
};

mod default_rules {
    use std::sync::OnceLock;

    use serde::Deserialize;
    use tracing::error;

    #[derive(Deserialize, Default)]
    struct DefaultStripperConfig {
        keywords: Vec<String>,
        regex_patterns: Vec<String>,
        #[serde(default)]
        soft_regex_patterns: Vec<String>,
    }

    fn get_config() -> &'static DefaultStripperConfig {
        static CONFIG: OnceLock<DefaultStripperConfig> = OnceLock::new();
        CONFIG.get_or_init(|| {
            let config_str = include_str!("../../../assets/default_stripper_config.toml");
            toml::from_str(config_str).unwrap_or_else(|e| {
                error!("[MetadataStripper] 解析默认规则失败: {}", e);
                DefaultStripperConfig::default()
            })
        })
    }

    pub(super) fn keywords() -> Vec<String> {
        get_config().keywords.clone()
    }

    pub(super) fn regex_patterns() -> Vec<String> {
        get_config().regex_patterns.clone()
    }

    pub(super) fn soft_regex_patterns() -> Vec<String> {
        get_config().soft_regex_patterns.clone()
    }
}

/// 关键词之后允许出现的分隔符
const STRICT_MATCH_SEPARATORS: [char; 17] = [
    ':', '：', ',', '，', '.', '。', '!', '！', '-', '_', '(', '（', '[', '【', '{', '『', '「',
];

const BRACKET_PAIRS: [(char, char); 7] = [
    ('(', ')'),
    ('（', '）'),
    ('【', '】'),
    ('[', ']'),
    ('{', '}'),
    ('『', '』'),
    ('「', '」'),
];

const MAX_BRACKET_CLEANUP_ROUNDS: usize = 5;

/// 返回带有内置默认规则的清理选项。
#[must_use]
pub fn default_strip_options() -> StripOptions {
    StripOptions {
        keywords: default_rules::keywords(),
        regex_patterns: default_rules::regex_patterns(),
        soft_regex_patterns: default_rules::soft_regex_patterns(),
        ..Default::default()
    }
}

/// 把内置默认规则与 `user` 中的规则合并，默认规则在前，重复的规则只保留一份。
///
/// 开关、歌曲元数据和扫描范围使用 `user` 中的设置。
#[must_use]
pub fn merge_with_default_rules(user: &StripOptions) -> StripOptions {
    let mut merged = StripOptions {
        keywords: default_rules::keywords(),
        regex_patterns: default_rules::regex_patterns(),
        soft_regex_patterns: default_rules::soft_regex_patterns(),
        ..user.clone()
    };
    merged.merge_rules(user);
    merged
}

/// 编译好的清理规则。
///
/// 构造时编译一次正则表达式，之后可以对多份歌词重复使用。
#[derive(Debug, Clone)]
pub struct MetadataStripper {
    enabled: bool,
    keywords: Vec<String>,
    strict_regexes: Vec<Regex>,
    soft_regexes: Vec<Regex>,
    match_metadata: Option<SongMetadataHint>,
    header_scan_limit: ScanLimitConfig,
    footer_scan_limit: ScanLimitConfig,
}

impl MetadataStripper {
    /// 根据选项构造清理器。无效的正则表达式会被记录并跳过。
    #[must_use]
    pub fn new(options: &StripOptions) -> Self {
        let regex_enabled = options
            .flags
            .contains(MetadataStripperFlags::ENABLE_REGEX_STRIPPING);

        let (strict_regexes, soft_regexes) = if regex_enabled {
            (
                compile_patterns(&options.regex_patterns),
                compile_patterns(&options.soft_regex_patterns),
            )
        } else {
            (Vec::new(), Vec::new())
        };

        Self {
            enabled: options.flags.contains(MetadataStripperFlags::ENABLED),
            keywords: options
                .keywords
                .iter()
                .map(|k| normalize_for_keyword(k))
                .filter(|k| !k.is_empty())
                .collect(),
            strict_regexes,
            soft_regexes,
            match_metadata: options.match_metadata.clone(),
            header_scan_limit: options.header_scan_limit,
            footer_scan_limit: options.footer_scan_limit,
        }
    }

    fn has_rules(&self) -> bool {
        !self.keywords.is_empty() || !self.strict_regexes.is_empty() || !self.soft_regexes.is_empty()
    }

    /// 强匹配：关键词后紧跟分隔符或行尾，或者匹配任一强匹配正则。
    fn is_strict_match(&self, text: &str) -> bool {
        let normalized = normalize_for_keyword(clean_text_for_check(text));

        let keyword_hit = self.keywords.iter().any(|keyword| {
            normalized.strip_prefix(keyword.as_str()).is_some_and(|remainder| {
                remainder.is_empty() || remainder.starts_with(STRICT_MATCH_SEPARATORS)
            })
        });

        keyword_hit || self.strict_regexes.iter().any(|r| r.is_match(text))
    }

    /// 弱匹配：看起来像元数据，但没有对应的规则。
    ///
    /// 只有夹在强匹配行之间时才会被一起移除。
    fn looks_like_metadata(&self, text: &str) -> bool {
        let cleaned = clean_text_for_check(text);
        cleaned.contains([':', '：', '-']) || self.soft_regexes.iter().any(|r| r.is_match(text))
    }

    /// 第一行是否为 "歌曲名 - 歌手名"。
    fn first_line_matches_song(&self, first_line: &str) -> bool {
        let Some(hint) = &self.match_metadata else {
            return false;
        };
        if hint.title.is_empty() || hint.artists.is_empty() || first_line.is_empty() {
            return false;
        }

        let lower_text = first_line.to_lowercase();
        lower_text.contains(&hint.title.to_lowercase())
            && hint
                .artists
                .iter()
                .any(|artist| lower_text.contains(&artist.to_lowercase()))
    }

    /// 从头部扫描，返回正文开始的下标。
    fn find_header_cutoff(&self, texts: &[String], start_index: usize, limit: usize) -> usize {
        let mut last_valid_metadata_index: Option<usize> = None;

        for (i, text) in texts.iter().enumerate().take(limit).skip(start_index) {
            if text.is_empty() {
                continue;
            }

            let is_strict_match = self.is_strict_match(text);
            let is_weak_match = self.looks_like_metadata(text);
            trace!(
                "[MetadataStripper] 头部 [{}] \"{}\" 强匹配={} 弱匹配={}",
                i, text, is_strict_match, is_weak_match
            );

            if !is_strict_match && !is_weak_match {
                break;
            }
            if is_strict_match {
                last_valid_metadata_index = Some(i);
            }
        }

        last_valid_metadata_index.map_or(start_index, |idx| idx + 1)
    }

    /// 从尾部向前扫描，返回正文结束的下标（不含）。
    fn find_footer_cutoff(&self, texts: &[String], start_index: usize, limit: usize) -> usize {
        if start_index >= texts.len() {
            return start_index;
        }

        let scan_end = texts.len().saturating_sub(limit).max(start_index);
        let mut first_valid_footer_index = texts.len();

        for i in (scan_end..texts.len()).rev() {
            let text = &texts[i];
            if text.is_empty() {
                continue;
            }

            let is_strict_match = self.is_strict_match(text);
            let is_weak_match = self.looks_like_metadata(text);
            trace!(
                "[MetadataStripper] 尾部 [{}] \"{}\" 强匹配={} 弱匹配={}",
                i, text, is_strict_match, is_weak_match
            );

            if !is_strict_match && !is_weak_match {
                break;
            }
            if is_strict_match {
                first_valid_footer_index = i;
            }
        }

        first_valid_footer_index
    }

    /// 返回移除头部和尾部元数据行之后的新歌词行。
    #[must_use]
    pub fn strip(&self, lines: &[LyricLine]) -> Vec<LyricLine> {
        if !self.enabled {
            trace!("[MetadataStripper] 功能被禁用，跳过处理。");
            return lines.to_vec();
        }
        if lines.is_empty() {
            return Vec::new();
        }

        let texts: Vec<String> = lines.iter().map(|l| l.text().trim().to_string()).collect();

        let scan_start_index = usize::from(self.first_line_matches_song(&texts[0]));
        if scan_start_index == 1 {
            debug!("[MetadataStripper] 第一行匹配到歌曲元数据: \"{}\"", texts[0]);
        } else if !self.has_rules() {
            return lines.to_vec();
        }

        let total_lines = lines.len();
        let header_limit = self.header_scan_limit.calculate(total_lines);
        let footer_limit = self.footer_scan_limit.calculate(total_lines);

        let start_index = self.find_header_cutoff(&texts, scan_start_index, header_limit);
        let end_index = self.find_footer_cutoff(&texts, start_index, footer_limit);

        if start_index == 0 && end_index == total_lines {
            return lines.to_vec();
        }

        let stripped = lines
            .get(start_index..end_index)
            .map_or_else(Vec::new, <[LyricLine]>::to_vec);
        debug!(
            "[MetadataStripper] 清理完成，总行数从 {} 变为 {}。",
            total_lines,
            stripped.len()
        );
        stripped
    }
}

/// 使用给定选项清理一次歌词行。
///
/// 需要对多份歌词使用相同规则时，应直接复用 [`MetadataStripper`]。
#[must_use]
pub fn strip_descriptive_metadata_lines(
    lines: &[LyricLine],
    options: &StripOptions,
) -> Vec<LyricLine> {
    MetadataStripper::new(options).strip(lines)
}

fn compile_patterns(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter(|p| !p.trim().is_empty())
        .filter_map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| warn!("[MetadataStripper] 编译正则表达式 '{}' 失败: {}", pattern, e))
                .ok()
        })
        .collect()
}

/// 转为小写并移除所有空白。
fn normalize_for_keyword(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// 去掉包住整行的括号，或者去掉行首的括号前缀，例如
/// `(作曲: xxx)` 变为 `作曲: xxx`，`(Live) 作曲：xxx` 变为 `作曲：xxx`。
fn clean_text_for_check(text: &str) -> &str {
    let mut processed = text.trim();

    for _ in 0..MAX_BRACKET_CLEANUP_ROUNDS {
        let mut changed = false;

        for (open, close) in BRACKET_PAIRS {
            let Some(rest) = processed.strip_prefix(open) else {
                continue;
            };

            if let Some(inner) = rest.strip_suffix(close) {
                processed = inner.trim();
                changed = true;
                break;
            }

            if let Some(close_idx) = processed.find(close) {
                let content_after = processed[close_idx + close.len_utf8()..].trim();
                if !content_after.is_empty() {
                    processed = content_after;
                    changed = true;
                    break;
                }
            }
        }

        if !changed {
            break;
        }
    }

    processed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_lines(texts: &[&str]) -> Vec<LyricLine> {
        texts
            .iter()
            .enumerate()
            .map(|(i, &text)| {
                let start = i as u64 * 1000;
                LyricLine::with_text(text, start, start + 1000)
            })
            .collect()
    }

    fn lines_to_texts(lines: &[LyricLine]) -> Vec<String> {
        lines.iter().map(LyricLine::text).collect()
    }

    fn no_footer_scan() -> ScanLimitConfig {
        ScanLimitConfig {
            ratio: 0.0,
            min_lines: 0,
            max_lines: 0,
        }
    }

    #[test]
    fn test_stripper_disabled() {
        let lines = create_test_lines(&["Artist: Me", "Lyric line"]);
        let options = StripOptions {
            flags: MetadataStripperFlags::empty(),
            keywords: vec!["Artist".to_string()],
            ..Default::default()
        };

        let stripped = strip_descriptive_metadata_lines(&lines, &options);
        assert_eq!(lines_to_texts(&stripped), vec!["Artist: Me", "Lyric line"]);
    }

    #[test]
    fn test_strip_header_keywords_basic() {
        let lines = create_test_lines(&["Artist: A", "Album: B", "Lyric 1", "Lyric 2"]);
        let options = StripOptions::with_keywords(&["Artist", "Album"]);

        let stripped = strip_descriptive_metadata_lines(&lines, &options);
        assert_eq!(lines_to_texts(&stripped), vec!["Lyric 1", "Lyric 2"]);
    }

    #[test]
    fn test_title_artist_line_and_credits() {
        let lines = create_test_lines(&[
            "SongTitle - ArtistName",
            "作曲：X",
            "作词：Y",
            "real lyric line one",
            "real lyric line two",
        ]);
        let options = StripOptions {
            match_metadata: Some(SongMetadataHint::new("SongTitle", &["ArtistName"])),
            ..StripOptions::with_keywords(&["作曲", "作词"])
        };

        let stripped = strip_descriptive_metadata_lines(&lines, &options);
        assert_eq!(
            lines_to_texts(&stripped),
            vec!["real lyric line one", "real lyric line two"]
        );
    }

    #[test]
    fn test_title_hint_alone_removes_first_line() {
        let lines = create_test_lines(&["songtitle - artistname", "lyric"]);
        let options = StripOptions {
            match_metadata: Some(SongMetadataHint::new("SongTitle", &["ArtistName"])),
            ..Default::default()
        };

        let stripped = strip_descriptive_metadata_lines(&lines, &options);
        assert_eq!(lines_to_texts(&stripped), vec!["lyric"]);
    }

    #[test]
    fn test_keyword_normalization_and_separators() {
        let lines = create_test_lines(&[
            "Mixing  Engineer : A",
            "（作曲：B）",
            "(Live) 编曲：C",
            "作曲家乐队",
            "Lyric",
        ]);
        let options = StripOptions {
            footer_scan_limit: no_footer_scan(),
            ..StripOptions::with_keywords(&["mixing engineer", "作曲", "编曲"])
        };

        let stripped = strip_descriptive_metadata_lines(&lines, &options);
        // "作曲家乐队" 关键词后没有分隔符，不是强匹配，也不像元数据
        assert_eq!(lines_to_texts(&stripped), vec!["作曲家乐队", "Lyric"]);
    }

    #[test]
    fn test_stripper_block_logic_header() {
        let lines = create_test_lines(&[
            "作词：A",
            "作曲：B",
            "不匹配规则的行：123",
            "编曲：C",
            "真正的歌词行",
            "演唱者A：D",
        ]);
        let options = StripOptions {
            footer_scan_limit: no_footer_scan(),
            ..StripOptions::with_keywords(&["作词", "作曲", "编曲", "演唱者A"])
        };

        let stripped = strip_descriptive_metadata_lines(&lines, &options);
        assert_eq!(lines_to_texts(&stripped), vec!["真正的歌词行", "演唱者A：D"]);
    }

    #[test]
    fn test_stripper_block_logic_footer() {
        let lines = create_test_lines(&[
            "Line 1",
            "Line 2",
            "Line 3",
            "制作人：X",
            "Extra Info: Y",
            "发行：Z",
        ]);
        let options = StripOptions::with_keywords(&["制作人", "发行"]);

        let stripped = strip_descriptive_metadata_lines(&lines, &options);
        assert_eq!(lines_to_texts(&stripped), vec!["Line 1", "Line 2", "Line 3"]);
    }

    #[test]
    fn test_weak_lines_after_last_strict_are_kept() {
        let lines = create_test_lines(&["作词：A", "男：第一句", "女：第二句", "合唱"]);
        let options = StripOptions {
            footer_scan_limit: no_footer_scan(),
            ..StripOptions::with_keywords(&["作词"])
        };

        let stripped = strip_descriptive_metadata_lines(&lines, &options);
        assert_eq!(
            lines_to_texts(&stripped),
            vec!["男：第一句", "女：第二句", "合唱"]
        );
    }

    #[test]
    fn test_regex_rules_and_invalid_patterns() {
        let lines = create_test_lines(&["NOTE important", "Lyric 1", "lyric 2"]);
        let options = StripOptions {
            regex_patterns: vec!["(unclosed".to_string(), "^note".to_string()],
            ..Default::default()
        };

        let stripped = strip_descriptive_metadata_lines(&lines, &options);
        assert_eq!(lines_to_texts(&stripped), vec!["Lyric 1", "lyric 2"]);

        let without_regex = StripOptions {
            flags: MetadataStripperFlags::ENABLED,
            ..options
        };
        assert_eq!(
            strip_descriptive_metadata_lines(&lines, &without_regex).len(),
            3
        );
    }

    #[test]
    fn test_all_lines_are_metadata() {
        let lines = create_test_lines(&["Artist: A", "Album: B", "Source: Web"]);
        let options = StripOptions::with_keywords(&["Artist", "Album", "Source"]);

        assert!(strip_descriptive_metadata_lines(&lines, &options).is_empty());
    }

    #[test]
    fn test_idempotent() {
        let lines = create_test_lines(&["作词：A", "Lyric 1", "Lyric 2", "监制：B"]);
        let stripper = MetadataStripper::new(&StripOptions::with_keywords(&["作词", "监制"]));

        let once = stripper.strip(&lines);
        let twice = stripper.strip(&once);
        assert_eq!(lines_to_texts(&once), vec!["Lyric 1", "Lyric 2"]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_no_rules_returns_copy() {
        let lines = create_test_lines(&["作词：A", "Lyric"]);
        assert_eq!(
            strip_descriptive_metadata_lines(&lines, &StripOptions::default()),
            lines
        );
        assert!(strip_descriptive_metadata_lines(&[], &StripOptions::default()).is_empty());
    }

    #[test]
    fn test_clean_text_for_check() {
        assert_eq!(clean_text_for_check("(作曲: xxx)"), "作曲: xxx");
        assert_eq!(clean_text_for_check("(Live) 作曲：xxx"), "作曲：xxx");
        assert_eq!(clean_text_for_check("【『Mix：A』】"), "Mix：A");
        assert_eq!(clean_text_for_check("(only)"), "only");
        assert_eq!(clean_text_for_check("(unclosed"), "(unclosed");
    }

    #[test]
    fn test_user_rules_extend_default_rules() {
        let defaults = default_strip_options();
        let user = StripOptions {
            keywords: vec!["作曲".to_string(), "特别鸣谢".to_string()],
            footer_scan_limit: no_footer_scan(),
            ..Default::default()
        };

        let merged = merge_with_default_rules(&user);

        assert_eq!(merged.keywords.len(), defaults.keywords.len() + 1);
        assert_eq!(merged.keywords.last().map(String::as_str), Some("特别鸣谢"));
        assert_eq!(merged.keywords.iter().filter(|k| *k == "作曲").count(), 1);
        assert_eq!(merged.regex_patterns, defaults.regex_patterns);
        assert_eq!(merged.footer_scan_limit, no_footer_scan());

        let lines = create_test_lines(&["特别鸣谢：A", "作词：B", "正文"]);
        let stripped = MetadataStripper::new(&merged).strip(&lines);
        assert_eq!(lines_to_texts(&stripped), vec!["正文"]);
    }

    #[test]
    fn test_default_rules_are_loaded() {
        let options = default_strip_options();
        assert!(!options.keywords.is_empty(), "默认关键词不应为空");
        assert!(!options.regex_patterns.is_empty(), "默认正则表达式不应为空");

        let stripper = MetadataStripper::new(&options);
        assert_eq!(stripper.strict_regexes.len(), options.regex_patterns.len());
    }
}
