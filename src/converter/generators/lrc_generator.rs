//! LRC 格式生成器

use std::fmt::Write;

use lyric_engine_core::{ConvertError, LrcGenerationOptions, LyricLine};

use crate::converter::time_codec::split_ms_minutes;

/// 生成逐行 LRC。
///
/// 每行输出 `[mm:ss.fff]文本`，翻译和音译以相同的时间标签紧随其后。
/// 解析时同一时间戳的第二、第三行会被重新识别为翻译和音译。
pub fn generate_lrc(
    lines: &[LyricLine],
    options: &LrcGenerationOptions,
) -> Result<String, ConvertError> {
    let mut lrc_output = String::with_capacity(lines.len() * 48);

    for line in lines {
        let time_tag = format_lrc_time_tag(line.start_ms);
        writeln!(lrc_output, "{time_tag}{}", line.text())?;

        if options.include_translation && !line.translated_lyric.is_empty() {
            writeln!(lrc_output, "{time_tag}{}", line.translated_lyric)?;
        }

        if options.include_romanization && !line.roman_lyric.is_empty() {
            writeln!(lrc_output, "{time_tag}{}", line.roman_lyric)?;
        }
    }

    Ok(lrc_output.trim().to_string())
}

fn format_lrc_time_tag(ms: u64) -> String {
    let (minutes, seconds, millis) = split_ms_minutes(ms);
    format!("[{minutes:02}:{seconds:02}.{millis:03}]")
}
