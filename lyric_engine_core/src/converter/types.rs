use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// 枚举：解析器能识别的歌词源格式。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter, Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum LrcFormat {
    /// 普通逐行 LRC
    #[default]
    #[strum(serialize = "line")]
    Line,
    /// 逐字 LRC：`[00:28.850]曲[00:32.455]：[00:36.060]钱`
    #[strum(serialize = "word-by-word")]
    WordByWord,
    /// 增强型 LRC (ESLyric)：`[01:37.305]<01:37.624>怕<01:37.943>你`
    #[strum(serialize = "enhanced")]
    Enhanced,
    /// QQ 音乐 QRC 格式。
    #[strum(serialize = "qrc")]
    Qrc,
}

impl LrcFormat {
    /// 判断该格式是否带有逐字时间。
    #[must_use]
    pub const fn is_word_level(self) -> bool {
        matches!(self, Self::WordByWord | Self::Enhanced | Self::Qrc)
    }
}

/// 一个带时间的字（或词）。
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricWord {
    /// 文本内容
    pub word: String,
    /// 开始时间（毫秒）
    pub start_ms: u64,
    /// 结束时间（毫秒）
    pub end_ms: u64,
    /// 该字的罗马音
    #[serde(default)]
    pub roman_word: String,
}

impl LyricWord {
    /// 创建一个新的字。
    #[must_use]
    pub fn new(word: impl Into<String>, start_ms: u64, end_ms: u64) -> Self {
        Self {
            word: word.into(),
            start_ms,
            end_ms,
            roman_word: String::new(),
        }
    }

    /// 结束时间还未确定的字，结束时间暂时等于开始时间。
    #[must_use]
    pub fn open(word: impl Into<String>, start_ms: u64) -> Self {
        Self::new(word, start_ms, start_ms)
    }

    /// 字的持续时间。
    #[must_use]
    pub const fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// 歌词行。
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricLine {
    /// 该行包含的字
    pub words: Vec<LyricWord>,
    /// 行的开始时间（毫秒）
    pub start_ms: u64,
    /// 行的结束时间（毫秒）
    pub end_ms: u64,
    /// 翻译
    #[serde(default)]
    pub translated_lyric: String,
    /// 音译
    #[serde(default)]
    pub roman_lyric: String,
    /// 是否为背景人声行
    #[serde(default)]
    pub is_bg: bool,
    /// 是否为对唱行
    #[serde(default)]
    pub is_duet: bool,
}

impl LyricLine {
    /// 由一组字创建歌词行，行时间取首字的开始时间和末字的结束时间。
    ///
    /// 如果 `words` 为空，返回 `None`。
    #[must_use]
    pub fn from_words(words: Vec<LyricWord>) -> Option<Self> {
        let start_ms = words.first()?.start_ms;
        let end_ms = words.last()?.end_ms;
        Some(Self {
            words,
            start_ms,
            end_ms,
            ..Default::default()
        })
    }

    /// 创建一个只有一个字（整行文本）的逐行歌词行。
    #[must_use]
    pub fn with_text(text: impl Into<String>, start_ms: u64, end_ms: u64) -> Self {
        Self {
            words: vec![LyricWord::new(text, start_ms, end_ms)],
            start_ms,
            end_ms,
            ..Default::default()
        }
    }

    /// 将所有字的文本拼接成一个完整的字符串。
    #[must_use]
    pub fn text(&self) -> String {
        self.words.iter().map(|w| w.word.as_str()).collect()
    }

    /// 检查该行是否包含任何非空白的文本。
    #[must_use]
    pub fn has_text(&self) -> bool {
        self.words.iter().any(|w| !w.word.trim().is_empty())
    }

    /// 判断该行在给定时间点是否处于激活状态（左闭右开）。
    #[must_use]
    pub const fn contains(&self, time_ms: i64) -> bool {
        (self.start_ms as i64) <= time_ms && time_ms < self.end_ms as i64
    }
}

/// 解析一个歌词源后得到的文档。
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricDocument {
    /// 源格式
    pub format: LrcFormat,
    /// 按开始时间排序的歌词行
    pub lines: Vec<LyricLine>,
}

impl LyricDocument {
    #[must_use]
    pub const fn new(format: LrcFormat, lines: Vec<LyricLine>) -> Self {
        Self { format, lines }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

/// 对齐器将辅助歌词写入主歌词行的哪一个字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum AlignTarget {
    /// `translated_lyric`
    Translation,
    /// `roman_lyric`
    Romanization,
}

impl AlignTarget {
    /// 返回目标字段的可变引用。
    pub fn field_mut(self, line: &mut LyricLine) -> &mut String {
        match self {
            Self::Translation => &mut line.translated_lyric,
            Self::Romanization => &mut line.roman_lyric,
        }
    }

    /// 返回目标字段。
    #[must_use]
    pub fn field(self, line: &LyricLine) -> &str {
        match self {
            Self::Translation => &line.translated_lyric,
            Self::Romanization => &line.roman_lyric,
        }
    }
}

/// 导出文件声明的文本编码。
///
/// 这里只是一个标签，实际的字节转码由写文件的一方负责。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter, Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum LyricEncoding {
    #[default]
    #[strum(serialize = "utf-8")]
    #[serde(rename = "utf-8")]
    Utf8,
    #[strum(serialize = "gbk")]
    #[serde(rename = "gbk")]
    Gbk,
    #[strum(serialize = "utf-16")]
    #[serde(rename = "utf-16")]
    Utf16,
    #[strum(serialize = "iso-8859-1")]
    #[serde(rename = "iso-8859-1")]
    Iso8859_1,
}

/// 歌曲元数据，用于检查第一行是否为 "歌曲名 - 歌手名" 格式。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongMetadataHint {
    /// 歌曲名
    pub title: String,
    /// 歌手列表
    #[serde(default)]
    pub artists: Vec<String>,
}

impl SongMetadataHint {
    #[must_use]
    pub fn new(title: impl Into<String>, artists: &[&str]) -> Self {
        Self {
            title: title.into(),
            artists: artists.iter().map(ToString::to_string).collect(),
        }
    }
}
