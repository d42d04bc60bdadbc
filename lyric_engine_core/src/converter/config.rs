use std::collections::HashSet;

use bitflags::bitflags;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::{ConvertError, LyricEncoding, SongMetadataHint};

bitflags! {
    /// 元数据清理器的配置标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MetadataStripperFlags: u8 {
        /// 启用元数据清理功能
        const ENABLED                 = 1 << 0;
        /// 启用基于正则表达式的行移除
        const ENABLE_REGEX_STRIPPING  = 1 << 1;
    }
}

impl Default for MetadataStripperFlags {
    fn default() -> Self {
        Self::ENABLED | Self::ENABLE_REGEX_STRIPPING
    }
}

/// 元数据扫描行数的限制
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanLimitConfig {
    /// 扫描行数的比例 (例如, 0.2 表示 20%)。
    pub ratio: f32,
    /// 扫描的最小行数
    pub min_lines: usize,
    /// 扫描的最大行数
    pub max_lines: usize,
}

impl ScanLimitConfig {
    /// 计算实际可扫描的行数，结果不会超过总行数。
    #[must_use]
    pub fn calculate(&self, total_lines: usize) -> usize {
        let proportional_lines = (total_lines as f32 * self.ratio).ceil() as usize;

        proportional_lines
            .max(self.min_lines)
            .min(self.max_lines)
            .min(total_lines)
    }

    #[must_use]
    pub const fn default_header() -> Self {
        Self {
            ratio: 0.2,
            min_lines: 20,
            max_lines: 70,
        }
    }

    #[must_use]
    pub const fn default_footer() -> Self {
        Self {
            ratio: 0.2,
            min_lines: 20,
            max_lines: 50,
        }
    }
}

const fn default_header_scan_limit() -> ScanLimitConfig {
    ScanLimitConfig::default_header()
}

const fn default_footer_scan_limit() -> ScanLimitConfig {
    ScanLimitConfig::default_footer()
}

/// 配置元数据行清理器的选项。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripOptions {
    /// 用于控制清理器行为的位标志。
    #[serde(default)]
    pub flags: MetadataStripperFlags,

    /// 用于匹配头部/尾部块的关键词列表。
    #[serde(default)]
    pub keywords: Vec<String>,

    /// 强匹配正则表达式列表。
    #[serde(default)]
    pub regex_patterns: Vec<String>,

    /// 弱匹配正则表达式列表。
    ///
    /// 匹配的行不会单独被移除，只有夹在强匹配行之间时才会被一起移除。
    #[serde(default)]
    pub soft_regex_patterns: Vec<String>,

    /// 歌曲元数据，用于跳过第一行的 "歌曲名 - 歌手名"。
    #[serde(default)]
    pub match_metadata: Option<SongMetadataHint>,

    /// 头部扫描的行数限制。
    #[serde(default = "default_header_scan_limit")]
    pub header_scan_limit: ScanLimitConfig,

    /// 尾部扫描的行数限制。
    #[serde(default = "default_footer_scan_limit")]
    pub footer_scan_limit: ScanLimitConfig,
}

impl Default for StripOptions {
    fn default() -> Self {
        Self {
            flags: MetadataStripperFlags::default(),
            keywords: Vec::new(),
            regex_patterns: Vec::new(),
            soft_regex_patterns: Vec::new(),
            match_metadata: None,
            header_scan_limit: default_header_scan_limit(),
            footer_scan_limit: default_footer_scan_limit(),
        }
    }
}

impl StripOptions {
    /// 使用给定的关键词创建选项。
    #[must_use]
    pub fn with_keywords<S: AsRef<str>>(keywords: &[S]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.as_ref().to_string()).collect(),
            ..Default::default()
        }
    }

    /// 是否配置了任何规则。
    #[must_use]
    pub fn has_rules(&self) -> bool {
        !self.keywords.is_empty()
            || !self.regex_patterns.is_empty()
            || !self.soft_regex_patterns.is_empty()
    }

    /// 把 `other` 的关键词、强匹配和弱匹配正则并入当前规则。
    ///
    /// 结果保持原有顺序，重复的条目只保留第一次出现的位置。其他字段不变。
    pub fn merge_rules(&mut self, other: &Self) {
        union_into(&mut self.keywords, &other.keywords);
        union_into(&mut self.regex_patterns, &other.regex_patterns);
        union_into(&mut self.soft_regex_patterns, &other.soft_regex_patterns);
    }
}

fn union_into(target: &mut Vec<String>, extra: &[String]) {
    let mut seen = HashSet::new();
    target.retain(|item| seen.insert(item.clone()));
    for item in extra {
        if seen.insert(item.clone()) {
            target.push(item.clone());
        }
    }
}

/// LRC 生成选项
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct LrcGenerationOptions {
    /// 是否在主歌词后输出同时间戳的翻译行
    pub include_translation: bool,
    /// 是否在翻译后输出同时间戳的音译行
    pub include_romanization: bool,
}

impl Default for LrcGenerationOptions {
    fn default() -> Self {
        Self {
            include_translation: true,
            include_romanization: true,
        }
    }
}

/// TTML 生成选项
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct TtmlGenerationOptions {
    /// 写入 `<ttm:title>` 的标题。
    pub title: String,
    /// 是否输出 `x-translation` 辅助 span。
    pub include_translation: bool,
    /// 是否输出 `x-roman` 辅助 span。
    pub include_romanization: bool,
    /// XML 声明中的 `encoding` 属性。
    pub encoding: LyricEncoding,
    /// 是否输出格式化（缩进）的 TTML 文件。
    pub format: bool,
}

impl Default for TtmlGenerationOptions {
    fn default() -> Self {
        Self {
            title: "Lyrics".to_string(),
            include_translation: true,
            include_romanization: true,
            encoding: LyricEncoding::Utf8,
            format: true,
        }
    }
}

/// ASS 生成转换选项
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct AssGenerationOptions {
    /// 歌曲名，写入 `[Script Info]` 的 `Title`。
    pub title: String,
    /// 歌手名，写入 `[Script Info]` 的 `Title`。
    pub artist: String,
    /// 是否用 `\N` 附加翻译
    pub include_translation: bool,
    /// 是否用 `\N` 附加音译
    pub include_romanization: bool,
    /// 自定义的 [Script Info] 部分内容。如果为 `None`，则使用默认值。
    /// 用户提供的内容应包含 `[Script Info]` 头部。
    pub script_info: Option<String>,
    /// 自定义的 [V4+ Styles] 部分内容。如果为 `None`，则使用默认值。
    /// 用户提供的内容应包含 `[V4+ Styles]` 头部和 `Format:` 行。
    pub styles: Option<String>,
}

impl Default for AssGenerationOptions {
    fn default() -> Self {
        Self {
            title: "Unknown Title".to_string(),
            artist: "Unknown Artist".to_string(),
            include_translation: true,
            include_romanization: false,
            script_info: None,
            styles: None,
        }
    }
}

/// 括号替换的预设。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BracketReplacementPreset {
    /// 左括号替换为 " - "，行尾的右括号被移除
    #[default]
    Dash,
    /// 替换为 `〔` `〕`
    AngleBrackets,
    /// 替换为 `「` `」`
    CornerBrackets,
    /// 自定义：两个不同的字符视为成对符号，否则视为分隔符
    Custom(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChineseConversionConfig {
    /// 简体到繁体
    S2t,
    /// 繁体到简体
    T2s,
    /// 简体到台湾正体
    S2tw,
    /// 台湾正体到简体
    Tw2s,
    /// 简体到香港繁体
    S2hk,
    /// 香港繁体到简体
    Hk2s,
}

/// 导出歌词文件时的处理选项。
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct ExportOptions {
    /// 导出前转换为繁体
    pub to_traditional: bool,
    /// 合并翻译
    pub include_translation: bool,
    /// 合并音译
    pub include_romanization: bool,
    /// 目标编码标签
    pub encoding: LyricEncoding,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            to_traditional: false,
            include_translation: true,
            include_romanization: false,
            encoding: LyricEncoding::Utf8,
        }
    }
}

/// 播放时歌词定位的选项。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackOptions {
    /// 用户设置的歌词偏移（毫秒），正数表示歌词提前
    pub offset_ms: i64,
    /// 最多同时高亮的行数
    pub max_keep: usize,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            offset_ms: 0,
            max_keep: 3,
        }
    }
}

/// 统一管理歌词引擎的所有选项。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// 元数据移除选项
    pub metadata_stripper: StripOptions,
    /// LRC 生成选项
    pub lrc: LrcGenerationOptions,
    /// TTML 生成选项
    pub ttml: TtmlGenerationOptions,
    /// ASS 生成选项
    pub ass: AssGenerationOptions,
    /// 导出选项
    pub export: ExportOptions,
    /// 播放定位选项
    pub playback: PlaybackOptions,
    /// 括号替换，`None` 表示不替换
    pub bracket_replacement: Option<BracketReplacementPreset>,
}

impl EngineConfig {
    /// 从 TOML 文本加载配置，未出现的字段使用默认值。
    pub fn from_toml_str(content: &str) -> Result<Self, ConvertError> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_limit_calculation() {
        let header = ScanLimitConfig::default_header();
        assert_eq!(header.calculate(10), 10);
        assert_eq!(header.calculate(100), 20);
        assert_eq!(header.calculate(200), 40);
        assert_eq!(header.calculate(1000), 70);

        let footer = ScanLimitConfig::default_footer();
        assert_eq!(footer.calculate(1000), 50);
    }

    #[test]
    fn test_engine_config_from_partial_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            bracket_replacement = "CornerBrackets"

            [metadata_stripper]
            keywords = ["作曲", "作词"]

            [metadata_stripper.match_metadata]
            title = "SongTitle"
            artists = ["ArtistName"]

            [export]
            encoding = "gbk"

            [playback]
            offset_ms = -200
            "#,
        )
        .unwrap();

        assert_eq!(config.metadata_stripper.keywords, vec!["作曲", "作词"]);
        assert_eq!(
            config.metadata_stripper.header_scan_limit,
            ScanLimitConfig::default_header()
        );
        assert_eq!(
            config.metadata_stripper.match_metadata.unwrap().artists,
            vec!["ArtistName"]
        );
        assert_eq!(config.export.encoding, LyricEncoding::Gbk);
        assert_eq!(config.playback.offset_ms, -200);
        assert_eq!(config.playback.max_keep, 3);
        assert_eq!(
            config.bracket_replacement,
            Some(BracketReplacementPreset::CornerBrackets)
        );
    }

    #[test]
    fn test_merge_rules_is_deduplicated_union() {
        let mut options = StripOptions {
            keywords: vec!["作词".to_string(), "作曲".to_string(), "作词".to_string()],
            regex_patterns: vec!["^a".to_string()],
            ..Default::default()
        };
        let user = StripOptions {
            keywords: vec!["作曲".to_string(), "混音".to_string()],
            regex_patterns: vec!["^a".to_string(), "^b".to_string()],
            soft_regex_patterns: vec!["x".to_string()],
            flags: MetadataStripperFlags::empty(),
            ..Default::default()
        };

        options.merge_rules(&user);

        assert_eq!(options.keywords, vec!["作词", "作曲", "混音"]);
        assert_eq!(options.regex_patterns, vec!["^a", "^b"]);
        assert_eq!(options.soft_regex_patterns, vec!["x"]);
        assert_eq!(options.flags, MetadataStripperFlags::default());
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        assert!(matches!(
            EngineConfig::from_toml_str("playback = 3"),
            Err(ConvertError::Config(_))
        ));
    }

    #[test]
    fn test_builder_defaults() {
        let options = AssGenerationOptionsBuilder::default()
            .title("T")
            .include_romanization(true)
            .build()
            .unwrap();
        assert_eq!(options.title, "T");
        assert_eq!(options.artist, "Unknown Artist");
        assert!(options.include_translation);
        assert!(options.include_romanization);
    }
}
