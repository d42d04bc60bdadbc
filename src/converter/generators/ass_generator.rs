//! ASS 格式生成器

use std::fmt::Write;

use lyric_engine_core::{AssGenerationOptions, ConvertError, LyricLine};

use crate::converter::time_codec::split_ms;

/// ASS 生成的主入口函数。
///
/// 每个非空行生成一条 `Dialogue`，翻译和音译用 `\N` 换行附在正文后面。
/// 最后一条事件之后没有换行符。
pub fn generate_ass(
    lines: &[LyricLine],
    options: &AssGenerationOptions,
) -> Result<String, ConvertError> {
    let mut ass_content = String::with_capacity(lines.len() * 100 + 1024);

    write_ass_header(&mut ass_content, options)?;
    write_ass_events(&mut ass_content, lines, options)?;

    Ok(ass_content)
}

fn write_ass_header(
    output: &mut String,
    options: &AssGenerationOptions,
) -> Result<(), ConvertError> {
    // --- [Script Info] 部分 ---
    if let Some(custom_script_info) = &options.script_info {
        writeln!(output, "{}", custom_script_info.trim())?;
    } else {
        writeln!(output, "[Script Info]")?;
        writeln!(output, "Title: {} - {}", options.title, options.artist)?;
        writeln!(output, "ScriptType: v4.00+")?;
        writeln!(output, "WrapStyle: 0")?;
        writeln!(output, "ScaledBorderAndShadow: yes")?;
        writeln!(output, "YCbCr Matrix: TV.601")?;
        writeln!(output, "PlayResX: 1920")?;
        writeln!(output, "PlayResY: 1080")?;
    }
    writeln!(output)?;

    // --- [V4+ Styles] 部分 ---
    if let Some(custom_styles) = &options.styles {
        writeln!(output, "{}", custom_styles.trim())?;
    } else {
        writeln!(output, "[V4+ Styles]")?;
        writeln!(
            output,
            "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding"
        )?;
        writeln!(
            output,
            "Style: Default,Arial,60,&H00FFFFFF,&H000000FF,&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,2,0,2,10,10,10,1"
        )?;
    }
    writeln!(output)?;

    Ok(())
}

fn write_ass_events(
    output: &mut String,
    lines: &[LyricLine],
    options: &AssGenerationOptions,
) -> Result<(), ConvertError> {
    writeln!(output, "[Events]")?;
    writeln!(
        output,
        "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text"
    )?;

    let mut is_first_event = true;
    for line in lines {
        let text = line.text();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let mut dialogue_text = escape_line_breaks(text);
        if options.include_translation && !line.translated_lyric.is_empty() {
            write!(dialogue_text, "\\N{}", escape_line_breaks(&line.translated_lyric))?;
        }
        if options.include_romanization && !line.roman_lyric.is_empty() {
            write!(dialogue_text, "\\N{}", escape_line_breaks(&line.roman_lyric))?;
        }

        if !is_first_event {
            output.push('\n');
        }
        write!(
            output,
            "Dialogue: 0,{},{},Default,,0,0,0,,{}",
            format_ass_time(line.start_ms),
            format_ass_time(line.end_ms),
            dialogue_text
        )?;
        is_first_event = false;
    }

    Ok(())
}

/// 文本中的换行替换为 ASS 的 `\N`。
fn escape_line_breaks(text: &str) -> String {
    text.replace("\r\n", "\\N").replace('\n', "\\N")
}

/// 将毫秒格式化为 `H:MM:SS.cc`，厘秒向下取整。
fn format_ass_time(ms: u64) -> String {
    let (hours, minutes, seconds, millis) = split_ms(ms);
    let cs = millis / 10;
    format!("{hours}:{minutes:02}:{seconds:02}.{cs:02}")
}
