//! # Timed Text Markup Language 歌词格式生成器
//!
//! 每行歌词生成一个 `<p>`，每个字生成一个 `<span>`，
//! 翻译和音译作为带 `ttm:role` 的辅助 `<span>` 附在行末。

use std::io::Cursor;

use lyric_engine_core::{ConvertError, LyricLine, LyricWord, TtmlGenerationOptions};
use quick_xml::{
    Writer,
    escape::escape,
    events::{BytesDecl, BytesText, Event},
};

use crate::converter::time_codec::split_ms;

const TTML_NAMESPACE: &str = "http://www.w3.org/ns/ttml";
const TTM_NAMESPACE: &str = "http://www.w3.org/ns/ttml#metadata";
const AMLL_NAMESPACE: &str = "http://www.example.com/ns/amll";

/// TTML 生成的主入口函数。
///
/// 没有任何可输出的字的行会被省略。
pub fn generate_ttml(
    lines: &[LyricLine],
    options: &TtmlGenerationOptions,
) -> Result<String, ConvertError> {
    let mut buffer = Vec::new();
    let indent_char = b' ';
    let indent_size = 2;

    // 决定是否输出格式化的 TTML
    let result = if options.format {
        let mut writer =
            Writer::new_with_indent(Cursor::new(&mut buffer), indent_char, indent_size);
        generate_ttml_inner(&mut writer, lines, options)
    } else {
        let mut writer = Writer::new(Cursor::new(&mut buffer));
        generate_ttml_inner(&mut writer, lines, options)
    };

    result?;

    String::from_utf8(buffer).map_err(ConvertError::FromUtf8)
}

fn generate_ttml_inner<W: std::io::Write>(
    writer: &mut Writer<W>,
    lines: &[LyricLine],
    options: &TtmlGenerationOptions,
) -> Result<(), ConvertError> {
    let encoding = options.encoding.to_string();
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some(&encoding), None)))?;

    writer
        .create_element("tt")
        .with_attribute(("xmlns", TTML_NAMESPACE))
        .with_attribute(("xmlns:ttm", TTM_NAMESPACE))
        .with_attribute(("xmlns:amll", AMLL_NAMESPACE))
        .write_inner_content(|writer| {
            write_ttml_head(writer, options)?;
            write_ttml_body(writer, lines, options)?;
            Ok(())
        })?;

    Ok(())
}

fn write_ttml_head<W: std::io::Write>(
    writer: &mut Writer<W>,
    options: &TtmlGenerationOptions,
) -> Result<(), ConvertError> {
    writer
        .create_element("head")
        .write_inner_content(|writer| {
            writer
                .create_element("metadata")
                .write_inner_content(|writer| {
                    writer
                        .create_element("ttm:title")
                        .write_text_content(escaped_text(&options.title))?;
                    Ok(())
                })?;
            Ok(())
        })?;
    Ok(())
}

fn write_ttml_body<W: std::io::Write>(
    writer: &mut Writer<W>,
    lines: &[LyricLine],
    options: &TtmlGenerationOptions,
) -> Result<(), ConvertError> {
    let paragraphs: Vec<(&LyricLine, Vec<&LyricWord>)> = lines
        .iter()
        .filter_map(|line| {
            let words: Vec<&LyricWord> = line.words.iter().filter(|w| is_emitted(w)).collect();
            (!words.is_empty()).then_some((line, words))
        })
        .collect();

    writer
        .create_element("body")
        .write_inner_content(|writer| {
            let div = writer.create_element("div");
            if paragraphs.is_empty() {
                div.write_empty()?;
                return Ok(());
            }

            div.write_inner_content(|writer| {
                for (line, words) in &paragraphs {
                    write_paragraph(writer, line, words, options)?;
                }
                Ok(())
            })?;
            Ok(())
        })?;
    Ok(())
}

fn write_paragraph<W: std::io::Write>(
    writer: &mut Writer<W>,
    line: &LyricLine,
    words: &[&LyricWord],
    options: &TtmlGenerationOptions,
) -> Result<(), ConvertError> {
    writer
        .create_element("p")
        .with_attribute(("begin", format_ttml_time(line.start_ms).as_str()))
        .with_attribute(("end", format_ttml_time(line.end_ms).as_str()))
        .write_inner_content(|writer| {
            for word in words {
                writer
                    .create_element("span")
                    .with_attribute(("begin", format_ttml_time(word.start_ms).as_str()))
                    .with_attribute(("end", format_ttml_time(word.end_ms).as_str()))
                    .write_text_content(escaped_text(&word.word))?;
            }

            if options.include_translation && !line.translated_lyric.is_empty() {
                writer
                    .create_element("span")
                    .with_attribute(("ttm:role", "x-translation"))
                    .write_text_content(escaped_text(&line.translated_lyric))?;
            }

            if options.include_romanization && !line.roman_lyric.is_empty() {
                writer
                    .create_element("span")
                    .with_attribute(("ttm:role", "x-roman"))
                    .write_text_content(escaped_text(&line.roman_lyric))?;
            }
            Ok(())
        })?;
    Ok(())
}

/// 文本中的五个 XML 特殊字符全部转义。
fn escaped_text(text: &str) -> BytesText<'_> {
    BytesText::from_escaped(escape(text))
}

/// 空字和零时长的字不输出。
fn is_emitted(word: &LyricWord) -> bool {
    !word.word.is_empty() && word.start_ms != word.end_ms
}

/// 将毫秒格式化为 `HH:MM:SS.mmm`。
fn format_ttml_time(ms: u64) -> String {
    let (hours, minutes, seconds, millis) = split_ms(ms);
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}
