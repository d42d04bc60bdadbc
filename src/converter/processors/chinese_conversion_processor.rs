//! 简繁中文转换器。

use std::sync::Arc;

use dashmap::DashMap;
use ferrous_opencc::OpenCC;
use ferrous_opencc::config::BuiltinConfig as OpenccConfig;
use lyric_engine_core::{ChineseConversionConfig, LyricLine};
use tracing::error;

const fn to_opencc_config(config: ChineseConversionConfig) -> OpenccConfig {
    match config {
        ChineseConversionConfig::S2t => OpenccConfig::S2t,
        ChineseConversionConfig::T2s => OpenccConfig::T2s,
        ChineseConversionConfig::S2tw => OpenccConfig::S2tw,
        ChineseConversionConfig::Tw2s => OpenccConfig::Tw2s,
        ChineseConversionConfig::S2hk => OpenccConfig::S2hk,
        ChineseConversionConfig::Hk2s => OpenccConfig::Hk2s,
    }
}

/// `OpenCC` 实例缓存。
///
/// 每种配置只初始化一次。由调用方创建并持有，可以在多个线程之间共享引用。
#[derive(Default)]
pub struct ChineseConverterCache {
    converters: DashMap<ChineseConversionConfig, Arc<OpenCC>>,
}

impl ChineseConverterCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 根据指定的配置转换文本。
    ///
    /// 配置加载失败时会打印错误日志并返回原始文本。
    pub fn convert(&self, text: &str, config: ChineseConversionConfig) -> String {
        if text.is_empty() {
            return String::new();
        }

        if let Some(converter) = self.converters.get(&config) {
            return converter.convert(text);
        }

        self.converters
            .entry(config)
            .or_try_insert_with(|| {
                OpenCC::from_config(to_opencc_config(config))
                    .map(Arc::new)
                    .map_err(|e| {
                        error!(
                            "[ChineseConversion] 使用配置 '{:?}' 初始化 OpenCC 失败: {}",
                            config, e
                        );
                        e
                    })
            })
            .map_or_else(
                |_| text.to_string(),
                |converter_ref| converter_ref.value().convert(text),
            )
    }

    /// 已初始化的转换器数量。
    #[must_use]
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

/// 对歌词行执行简繁转换的处理器。
#[derive(Debug, Clone, Copy)]
pub struct ChineseConversionProcessor {
    config: ChineseConversionConfig,
    convert_romanization: bool,
}

impl ChineseConversionProcessor {
    #[must_use]
    pub const fn new(config: ChineseConversionConfig) -> Self {
        Self {
            config,
            convert_romanization: false,
        }
    }

    /// 是否同时转换音译。音译通常是拉丁字母，默认不转换。
    #[must_use]
    pub const fn with_romanization(mut self, convert_romanization: bool) -> Self {
        self.convert_romanization = convert_romanization;
        self
    }

    /// 转换每个字和翻译，返回新的歌词行。
    #[must_use]
    pub fn process(&self, lines: &[LyricLine], cache: &ChineseConverterCache) -> Vec<LyricLine> {
        lines
            .iter()
            .map(|line| {
                let mut line = line.clone();
                for word in &mut line.words {
                    word.word = cache.convert(&word.word, self.config);
                }
                line.translated_lyric = cache.convert(&line.translated_lyric, self.config);
                if self.convert_romanization {
                    line.roman_lyric = cache.convert(&line.roman_lyric, self.config);
                }
                line
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_simplified_to_traditional() {
        let cache = ChineseConverterCache::new();
        assert_eq!(cache.convert("汉字", ChineseConversionConfig::S2t), "漢字");
        assert_eq!(cache.convert("漢字", ChineseConversionConfig::T2s), "汉字");
        assert_eq!(cache.convert("", ChineseConversionConfig::S2t), "");
        assert_eq!(
            cache.convert("abc 123", ChineseConversionConfig::S2t),
            "abc 123"
        );
    }

    #[test]
    fn test_converter_is_built_once_per_config() {
        let cache = ChineseConverterCache::new();
        assert!(cache.is_empty());

        cache.convert("汉字", ChineseConversionConfig::S2t);
        cache.convert("歌词", ChineseConversionConfig::S2t);
        assert_eq!(cache.len(), 1);

        cache.convert("漢字", ChineseConversionConfig::T2s);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_processor_leaves_romanization_by_default() {
        let cache = ChineseConverterCache::new();
        let mut line = LyricLine::with_text("汉字", 0, 1000);
        line.translated_lyric = "汉字".to_string();
        line.roman_lyric = "汉字".to_string();
        let lines = vec![line];

        let converted =
            ChineseConversionProcessor::new(ChineseConversionConfig::S2t).process(&lines, &cache);

        assert_eq!(converted[0].text(), "漢字");
        assert_eq!(converted[0].translated_lyric, "漢字");
        assert_eq!(converted[0].roman_lyric, "汉字");
        assert_eq!(lines[0].text(), "汉字");

        let with_roman = ChineseConversionProcessor::new(ChineseConversionConfig::S2t)
            .with_romanization(true)
            .process(&lines, &cache);
        assert_eq!(with_roman[0].roman_lyric, "漢字");
    }
}
