//! 歌词中圆括号的替换。
//!
//! 成对模式（例如 `〔〕`、`「」`）直接替换左右括号；
//! 分隔符模式（默认 ` - `）把左括号替换为分隔符，行尾的右括号被移除。

use std::sync::LazyLock;

use lyric_engine_core::{BracketReplacementPreset, LyricLine};
use regex::{Captures, Regex};

/// 整行都被括号包住，例如 `(Music)`
static FULL_BRACKET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[(（][^()（）]*[)）]\s*$").expect("编译 FULL_BRACKET_REGEX 失败")
});

static LEFT_BRACKET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[(（]").expect("编译 LEFT_BRACKET_REGEX 失败"));

static RIGHT_BRACKET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[)）]").expect("编译 RIGHT_BRACKET_REGEX 失败"));

/// 分隔符模式下的左括号，连同两侧空白一起替换
static SPACED_LEFT_BRACKET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[(（]\s*").expect("编译 SPACED_LEFT_BRACKET_REGEX 失败"));

static SPACED_RIGHT_BRACKET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*[)）]\s*").expect("编译 SPACED_RIGHT_BRACKET_REGEX 失败")
});

static TRAILING_RIGHT_BRACKET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*[)）]\s*$").expect("编译 TRAILING_RIGHT_BRACKET_REGEX 失败")
});

static REPEATED_DASH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\s*-\s*){2,}").expect("编译 REPEATED_DASH_REGEX 失败"));

static WHITESPACE_RUN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("编译 WHITESPACE_RUN_REGEX 失败"));

const LEFT_BRACKETS: [char; 2] = ['(', '（'];
const RIGHT_BRACKETS: [char; 2] = [')', '）'];
const DASH_SEPARATOR: &str = " - ";

/// 按预设替换括号的处理器。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketReplacer {
    open: String,
    close: String,
    is_enclosure: bool,
}

impl BracketReplacer {
    #[must_use]
    pub fn new(preset: &BracketReplacementPreset) -> Self {
        match preset {
            BracketReplacementPreset::Dash => Self::separator(DASH_SEPARATOR),
            BracketReplacementPreset::AngleBrackets => Self::enclosure('〔', '〕'),
            BracketReplacementPreset::CornerBrackets => Self::enclosure('「', '」'),
            BracketReplacementPreset::Custom(custom) => {
                let trimmed = custom.trim();
                let chars: Vec<char> = trimmed.chars().collect();
                match chars.as_slice() {
                    // 两个不同的字符且不含减号，视为成对符号
                    &[open, close] if open != close && !trimmed.contains('-') => {
                        Self::enclosure(open, close)
                    }
                    _ => {
                        let padded = format!(" {trimmed} ");
                        let separator = WHITESPACE_RUN_REGEX.replace_all(&padded, " ");
                        Self::separator(&separator)
                    }
                }
            }
        }
    }

    fn separator(separator: &str) -> Self {
        Self {
            open: separator.to_string(),
            close: " ".to_string(),
            is_enclosure: false,
        }
    }

    fn enclosure(open: char, close: char) -> Self {
        Self {
            open: open.to_string(),
            close: close.to_string(),
            is_enclosure: true,
        }
    }

    fn collapses_dashes(&self) -> bool {
        !self.is_enclosure && self.open.contains('-')
    }

    /// 替换一段普通文本（翻译或音译）中的括号。
    #[must_use]
    pub fn replace_in_text(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        if self.is_enclosure {
            let replaced = LEFT_BRACKET_REGEX.replace_all(text, self.open.as_str());
            return RIGHT_BRACKET_REGEX
                .replace_all(&replaced, self.close.as_str())
                .into_owned();
        }

        if FULL_BRACKET_REGEX.is_match(text) {
            return text
                .trim()
                .trim_start_matches(LEFT_BRACKETS)
                .trim_end_matches(RIGHT_BRACKETS)
                .trim()
                .to_string();
        }

        let replaced = SPACED_LEFT_BRACKET_REGEX.replace_all(text, self.open.as_str());
        let replaced = TRAILING_RIGHT_BRACKET_REGEX.replace(&replaced, "");
        let replaced = SPACED_RIGHT_BRACKET_REGEX.replace_all(&replaced, self.close.as_str());

        if self.collapses_dashes() {
            REPEATED_DASH_REGEX
                .replace_all(&replaced, DASH_SEPARATOR)
                .into_owned()
        } else {
            replaced.into_owned()
        }
    }

    /// 对歌词行的字、翻译和音译进行括号替换，返回新的歌词行。
    #[must_use]
    pub fn apply(&self, lines: &[LyricLine]) -> Vec<LyricLine> {
        lines
            .iter()
            .map(|line| {
                let mut line = line.clone();
                self.replace_in_words(&mut line);
                line.translated_lyric = self.replace_in_text(&line.translated_lyric);
                line.roman_lyric = self.replace_in_text(&line.roman_lyric);
                line
            })
            .collect()
    }

    fn replace_in_words(&self, line: &mut LyricLine) {
        if !self.is_enclosure && FULL_BRACKET_REGEX.is_match(&line.text()) {
            strip_outer_brackets(line);
            return;
        }

        let word_count = line.words.len();
        for (index, word) in line.words.iter_mut().enumerate() {
            if self.is_enclosure {
                let replaced = LEFT_BRACKET_REGEX.replace_all(&word.word, self.open.as_str());
                word.word = RIGHT_BRACKET_REGEX
                    .replace_all(&replaced, self.close.as_str())
                    .into_owned();
                continue;
            }

            let is_last_word = index + 1 == word_count;
            let replaced = SPACED_LEFT_BRACKET_REGEX.replace_all(&word.word, self.open.as_str());
            let replaced_len = replaced.len();
            word.word = SPACED_RIGHT_BRACKET_REGEX
                .replace_all(&replaced, |caps: &Captures| {
                    let at_word_end = caps.get(0).is_some_and(|m| m.end() == replaced_len);
                    if at_word_end && is_last_word {
                        String::new()
                    } else {
                        self.close.clone()
                    }
                })
                .into_owned();
        }

        if !self.is_enclosure {
            self.tidy_separators_between_words(line);
        }
    }

    /// 整理相邻字之间的分隔符和空白。
    fn tidy_separators_between_words(&self, line: &mut LyricLine) {
        let collapses_dashes = self.collapses_dashes();
        let separator_start = self.open.trim_start();

        for index in 0..line.words.len() {
            if collapses_dashes {
                let collapsed = REPEATED_DASH_REGEX.replace_all(&line.words[index].word, DASH_SEPARATOR);
                line.words[index].word = collapsed.into_owned();
            }

            if index == 0 {
                continue;
            }

            let (before, after) = line.words.split_at_mut(index);
            let prev = &mut before[index - 1].word;
            let current = &mut after[0].word;

            if collapses_dashes
                && prev.trim_end().ends_with('-')
                && current.trim_start().starts_with('-')
            {
                let kept_len = prev.trim_end().len() - 1;
                prev.truncate(kept_len);
                let rest = current.trim_start().trim_start_matches('-').trim_start();
                *current = format!("{DASH_SEPARATOR}{rest}");
            }

            if !separator_start.is_empty()
                && current.trim_start().starts_with(separator_start)
                && prev.ends_with(char::is_whitespace)
            {
                let kept_len = prev.trim_end().len();
                prev.truncate(kept_len);
            }
        }
    }
}

/// 分隔符模式下整行被括号包住：去掉第一个左括号和最后一个右括号。
fn strip_outer_brackets(line: &mut LyricLine) {
    if let Some(word) = line.words.iter_mut().find(|w| w.word.contains(LEFT_BRACKETS))
        && let Some(idx) = word.word.find(LEFT_BRACKETS)
    {
        word.word.remove(idx);
    }

    if let Some(word) = line
        .words
        .iter_mut()
        .rev()
        .find(|w| w.word.contains(RIGHT_BRACKETS))
        && let Some(idx) = word.word.rfind(RIGHT_BRACKETS)
    {
        word.word.remove(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyric_engine_core::LyricWord;

    fn line_of(words: &[&str]) -> LyricLine {
        let words = words
            .iter()
            .enumerate()
            .map(|(i, w)| LyricWord::new(*w, i as u64 * 100, i as u64 * 100 + 100))
            .collect();
        LyricLine::from_words(words).unwrap()
    }

    #[test]
    fn test_dash_mode_on_text() {
        let replacer = BracketReplacer::new(&BracketReplacementPreset::Dash);
        assert_eq!(replacer.replace_in_text("Hello (Live)"), "Hello - Live");
        assert_eq!(replacer.replace_in_text("（Music）"), "Music");
        assert_eq!(replacer.replace_in_text("A (B) C"), "A - B C");
        assert_eq!(replacer.replace_in_text("A - (B)"), "A - B");
    }

    #[test]
    fn test_dash_mode_on_words() {
        let replacer = BracketReplacer::new(&BracketReplacementPreset::Dash);

        let lines = vec![line_of(&["Hello ", "(Live)"])];
        let replaced = replacer.apply(&lines);
        assert_eq!(replaced[0].text(), "Hello - Live");
        assert_eq!(lines[0].text(), "Hello (Live)");

        let full = replacer.apply(&[line_of(&["(Mu", "sic)"])]);
        assert_eq!(full[0].text(), "Music");

        let single = replacer.apply(&[line_of(&["Hello (Live)"])]);
        assert_eq!(single[0].text(), "Hello - Live");
    }

    #[test]
    fn test_enclosure_presets() {
        let corner = BracketReplacer::new(&BracketReplacementPreset::CornerBrackets);
        assert_eq!(corner.replace_in_text("(Music)"), "「Music」");

        let angle = BracketReplacer::new(&BracketReplacementPreset::AngleBrackets);
        let lines = angle.apply(&[line_of(&["Hello ", "(Live)"])]);
        assert_eq!(lines[0].text(), "Hello 〔Live〕");
    }

    #[test]
    fn test_custom_preset() {
        let pair = BracketReplacer::new(&BracketReplacementPreset::Custom("<>".to_string()));
        assert_eq!(pair.replace_in_text("A(B)"), "A<B>");

        let separator = BracketReplacer::new(&BracketReplacementPreset::Custom(" / ".to_string()));
        assert_eq!(separator.replace_in_text("A (B)"), "A / B");
    }

    #[test]
    fn test_translation_and_romanization_processed() {
        let mut line = line_of(&["歌词"]);
        line.translated_lyric = "Lyric (Remix)".to_string();
        line.roman_lyric = "(ge ci)".to_string();

        let replaced = BracketReplacer::new(&BracketReplacementPreset::Dash).apply(&[line]);
        assert_eq!(replaced[0].translated_lyric, "Lyric - Remix");
        assert_eq!(replaced[0].roman_lyric, "ge ci");
    }
}
