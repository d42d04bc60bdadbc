//! 从 QRC 的 XML 外壳中提取 `LyricContent` 属性。
//!
//! 真实的 QRC 数据经常不是合法的 XML（例如属性值中未转义的引号），
//! 因此提取按顺序尝试：XML 解析、贪婪正则、非贪婪正则，最后直接使用原文。

use std::sync::LazyLock;

use lyric_engine_core::ConvertError;
use quick_xml::{Reader, events::Event};
use regex::Regex;
use tracing::{debug, warn};

/// 贪婪匹配，用于处理属性值中含有未转义引号的情况
static GREEDY_CONTENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)LyricContent\s*=\s*"(.*)"\s*/?>"#).expect("编译 GREEDY_CONTENT_REGEX 失败")
});

/// 贪婪匹配吞掉了后面的其他属性时，内容里会出现 ` Attr="` 这样的结构
static SWALLOWED_ATTRIBUTE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s+[A-Za-z0-9_]+\s*=\s*""#).expect("编译 SWALLOWED_ATTRIBUTE_REGEX 失败")
});

static LAZY_CONTENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"LyricContent\s*=\s*"([^"]*)""#).expect("编译 LAZY_CONTENT_REGEX 失败")
});

/// 从原始 QRC 数据中提取歌词正文的策略。
pub trait LyricContentExtractor: Send + Sync {
    /// 提取歌词正文。没有得到任何内容时返回 `None`，调用方会改用原始文本。
    fn extract_content(&self, raw: &str) -> Option<String>;
}

/// 基于 `quick-xml` 的提取器。
///
/// 返回文档中第一个带有 `LyricContent` 属性的元素的属性值。
/// 文档不是合法的 XML 时交给 `fallback` 处理。
pub struct XmlContentExtractor {
    fallback: Box<dyn LyricContentExtractor>,
}

impl XmlContentExtractor {
    #[must_use]
    pub fn new(fallback: Box<dyn LyricContentExtractor>) -> Self {
        Self { fallback }
    }
}

impl Default for XmlContentExtractor {
    fn default() -> Self {
        Self::new(Box::new(RegexContentExtractor))
    }
}

impl LyricContentExtractor for XmlContentExtractor {
    fn extract_content(&self, raw: &str) -> Option<String> {
        if raw.trim().is_empty() {
            return None;
        }

        match find_lyric_content_attribute(raw) {
            Ok(content) => content.filter(|c| !c.is_empty()),
            Err(e) => {
                debug!("[QrcContent] XML 解析失败，回退到后备提取器: {}", e);
                self.fallback.extract_content(raw)
            }
        }
    }
}

/// 读完整个文档，任何语法或属性错误都会返回 `Err`。
fn find_lyric_content_attribute(raw: &str) -> Result<Option<String>, ConvertError> {
    let mut reader = Reader::from_str(raw);
    let mut buf = Vec::new();
    let mut content: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => {
                for attr in e.attributes() {
                    let attr = attr?;
                    if content.is_none() && attr.key.as_ref() == b"LyricContent" {
                        let value = attr.decode_and_unescape_value(reader.decoder())?;
                        content = Some(value.into_owned());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(content)
}

/// 基于正则表达式的提取器，不要求输入是合法的 XML。
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexContentExtractor;

impl LyricContentExtractor for RegexContentExtractor {
    fn extract_content(&self, raw: &str) -> Option<String> {
        if raw.is_empty() {
            return None;
        }

        if let Some(caps) = GREEDY_CONTENT_REGEX.captures(raw) {
            let content = &caps[1];
            if !SWALLOWED_ATTRIBUTE_REGEX.is_match(content) {
                return Some(decode_xml_entities(content));
            }
        }

        let content = LAZY_CONTENT_REGEX
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| {
                warn!("[QrcContent] 未找到 LyricContent 属性，直接使用原始内容");
                raw
            });

        Some(decode_xml_entities(content))
    }
}

/// 解码五个预定义的 XML 实体，`&amp;` 最后处理。
fn decode_xml_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
