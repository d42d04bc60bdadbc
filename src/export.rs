//! 下载歌词时的导出流程。
//!
//! 把从各个来源得到的歌词文本合并成一个文件的内容：
//! 主歌词与翻译、音译按时间对齐，QRC 转换为 TTML，可选地转换为繁体。
//! 这里只处理字符串，读写文件由调用方负责。

use lyric_engine_core::{
    AlignTarget, AssGenerationOptions, ChineseConversionConfig, ConvertError, ExportOptions,
    LrcGenerationOptions, LyricEncoding, LyricLine, TtmlGenerationOptions,
};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use tracing::{debug, info};

use crate::converter::{
    generators::{ass_generator::generate_ass, lrc_generator::generate_lrc, ttml_generator::generate_ttml},
    parsers::{
        parse_smart_lrc,
        qrc_parser::{QrcParser, looks_like_qrc},
    },
    processors::{
        aligner::align_lyrics,
        chinese_conversion_processor::{ChineseConversionProcessor, ChineseConverterCache},
    },
};

/// 一首歌从各个来源拿到的原始歌词文本。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LyricSources {
    /// 主歌词（LRC 家族）
    pub lrc: Option<String>,
    /// 翻译（LRC）
    pub translation: Option<String>,
    /// 音译（LRC）
    pub romanization: Option<String>,
    /// 逐字歌词，可能是 QRC
    pub yrc: Option<String>,
    /// 现成的 TTML
    pub ttml: Option<String>,
    /// QQ 音乐的 QRC 主歌词
    pub qrc: Option<String>,
    /// QRC 附带的翻译（LRC）
    pub qrc_translation: Option<String>,
    /// QRC 附带的音译（QRC）
    pub qrc_romanization: Option<String>,
}

/// 逐字歌词的两种形态，TTML 优先。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerbatimLyrics {
    pub ttml: Option<String>,
    pub yrc: Option<String>,
}

/// 导出文件的格式，`Display` 即文件扩展名。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    Lrc,
    Ttml,
    Yrc,
    Ass,
}

/// 一个待写入文件的导出结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedContent {
    pub content: String,
    pub format: ExportFormat,
    /// 写文件时应使用的编码
    pub encoding: LyricEncoding,
}

/// 歌词导出器。
///
/// 持有 QRC 解析器和简繁转换器缓存，创建一次后可以重复使用。
#[derive(Default)]
pub struct LyricExporter {
    qrc_parser: QrcParser,
    converters: ChineseConverterCache,
}

impl LyricExporter {
    #[must_use]
    pub const fn new(qrc_parser: QrcParser, converters: ChineseConverterCache) -> Self {
        Self {
            qrc_parser,
            converters,
        }
    }

    /// 生成 LRC 文件内容。
    ///
    /// 需要合并翻译或音译时，重新解析并对齐后生成 LRC；否则直接返回主歌词。
    /// 主歌词无法解析时同样直接返回主歌词。
    pub fn process_basic(
        &self,
        sources: &LyricSources,
        options: &ExportOptions,
    ) -> Result<String, ConvertError> {
        let lrc = non_empty(sources.lrc.as_ref()).unwrap_or_default();
        let (translation, romanization) = secondary_tracks(sources, options);

        if translation.is_some() || romanization.is_some() {
            let parsed = parse_smart_lrc(lrc);
            if !parsed.is_empty() {
                let lines = merge_secondary_tracks(parsed.lines, translation, romanization);
                return self.lines_to_lrc(&lines, options.to_traditional);
            }
            debug!("[LyricExporter] 主歌词解析结果为空，不合并翻译和音译");
        }

        Ok(self.convert_if_needed(lrc, options.to_traditional))
    }

    /// 没有 TTML 和逐字歌词时，把 QRC 转换为 TTML。
    ///
    /// QRC 解析不出任何行时，原样作为逐字歌词保留。
    pub fn parse_verbatim(&self, sources: &LyricSources) -> Result<VerbatimLyrics, ConvertError> {
        let mut verbatim = VerbatimLyrics {
            ttml: non_empty(sources.ttml.as_ref()).map(str::to_string),
            yrc: non_empty(sources.yrc.as_ref()).map(str::to_string),
        };

        if verbatim.ttml.is_none()
            && verbatim.yrc.is_none()
            && let Some(qrc) = non_empty(sources.qrc.as_ref())
        {
            let document = self.qrc_parser.parse(
                qrc,
                non_empty(sources.qrc_translation.as_ref()),
                non_empty(sources.qrc_romanization.as_ref()),
            );

            if document.is_empty() {
                verbatim.yrc = Some(qrc.to_string());
            } else {
                verbatim.ttml = Some(generate_ttml(
                    &document.lines,
                    &TtmlGenerationOptions::default(),
                )?);
            }
        }

        Ok(verbatim)
    }

    /// 生成逐字歌词文件内容。
    ///
    /// 逐字歌词是 QRC 时会重新解析、合并翻译和音译并生成 TTML；
    /// 其他内容原样输出。TTML 的 XML 声明会改写为目标编码。
    pub fn generate_verbatim_content(
        &self,
        verbatim: &VerbatimLyrics,
        sources: &LyricSources,
        options: &ExportOptions,
    ) -> Result<Option<ExportedContent>, ConvertError> {
        let ttml = non_empty(verbatim.ttml.as_ref());
        let yrc = non_empty(verbatim.yrc.as_ref());
        let Some(original) = ttml.or(yrc) else {
            return Ok(None);
        };

        let mut lines = Vec::new();
        if ttml.is_none()
            && let Some(yrc) = yrc
            && looks_like_qrc(yrc)
        {
            lines = self.qrc_parser.parse_qrc_lines(yrc);
        }

        let mut content = if lines.is_empty() {
            original.to_string()
        } else {
            let (translation, romanization) = secondary_tracks(sources, options);
            lines = merge_secondary_tracks(lines, translation, romanization);
            generate_ttml(&lines, &TtmlGenerationOptions::default())?
        };

        content = self.convert_if_needed(&content, options.to_traditional);

        let format = if ttml.is_some() || !lines.is_empty() {
            ExportFormat::Ttml
        } else {
            ExportFormat::Yrc
        };

        if format == ExportFormat::Ttml && options.encoding != LyricEncoding::Utf8 {
            content = rewrite_declared_encoding(&content, options.encoding);
        }

        info!(
            "[LyricExporter] 生成逐字歌词: 格式 {}, 编码 {}",
            format, options.encoding
        );
        Ok(Some(ExportedContent {
            content,
            format,
            encoding: options.encoding,
        }))
    }

    /// 生成 ASS 字幕内容。
    ///
    /// 歌词行来自 QRC 形式的逐字歌词，没有时来自主歌词。
    /// 逐字歌词存在但不是 QRC 形式时同样回退到主歌词，
    /// 这与按逐字歌词优先的导出流程不同：那里只要有逐字歌词就不再回退。
    /// 得不到任何歌词行时返回 `None`。
    pub fn generate_ass_content(
        &self,
        verbatim: &VerbatimLyrics,
        sources: &LyricSources,
        ass_options: &AssGenerationOptions,
        options: &ExportOptions,
    ) -> Result<Option<ExportedContent>, ConvertError> {
        let mut lines = Vec::new();

        if let Some(yrc) = non_empty(verbatim.yrc.as_ref())
            && looks_like_qrc(yrc)
        {
            lines = self.qrc_parser.parse_qrc_lines(yrc);
        } else if let Some(lrc) = non_empty(sources.lrc.as_ref()) {
            lines = parse_smart_lrc(lrc).lines;
        }

        if lines.is_empty() {
            return Ok(None);
        }

        let (translation, romanization) = secondary_tracks(sources, options);
        let lines = merge_secondary_tracks(lines, translation, romanization);

        Ok(Some(ExportedContent {
            content: generate_ass(&lines, ass_options)?,
            format: ExportFormat::Ass,
            encoding: options.encoding,
        }))
    }

    /// 音译不做简繁转换。
    fn lines_to_lrc(
        &self,
        lines: &[LyricLine],
        to_traditional: bool,
    ) -> Result<String, ConvertError> {
        let lrc_options = LrcGenerationOptions::default();
        if to_traditional {
            let converted = ChineseConversionProcessor::new(ChineseConversionConfig::S2t)
                .process(lines, &self.converters);
            generate_lrc(&converted, &lrc_options)
        } else {
            generate_lrc(lines, &lrc_options)
        }
    }

    fn convert_if_needed(&self, content: &str, to_traditional: bool) -> String {
        if to_traditional {
            self.converters
                .convert(content, ChineseConversionConfig::S2t)
        } else {
            content.to_string()
        }
    }
}

fn non_empty(text: Option<&String>) -> Option<&str> {
    text.map(String::as_str).filter(|s| !s.is_empty())
}

fn secondary_tracks<'a>(
    sources: &'a LyricSources,
    options: &ExportOptions,
) -> (Option<&'a str>, Option<&'a str>) {
    let translation = options
        .include_translation
        .then(|| non_empty(sources.translation.as_ref()))
        .flatten();
    let romanization = options
        .include_romanization
        .then(|| non_empty(sources.romanization.as_ref()))
        .flatten();
    (translation, romanization)
}

/// 依次对齐翻译和音译，解析结果为空的轨道被忽略。
fn merge_secondary_tracks(
    mut lines: Vec<LyricLine>,
    translation: Option<&str>,
    romanization: Option<&str>,
) -> Vec<LyricLine> {
    for (text, target) in [
        (translation, AlignTarget::Translation),
        (romanization, AlignTarget::Romanization),
    ] {
        let Some(text) = text else {
            continue;
        };
        let parsed = parse_smart_lrc(text);
        if !parsed.is_empty() {
            lines = align_lyrics(&lines, &parsed.lines, target);
        }
    }
    lines
}

fn rewrite_declared_encoding(content: &str, encoding: LyricEncoding) -> String {
    let declared = format!("encoding=\"{encoding}\"");
    content
        .replacen("encoding=\"utf-8\"", &declared, 1)
        .replacen("encoding=\"UTF-8\"", &declared, 1)
}
