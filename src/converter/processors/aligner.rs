//! 按时间把翻译或音译对齐到主歌词行上。

use lyric_engine_core::{AlignTarget, LyricLine};

/// 两行开始时间相差不超过该值时视为同一行。
pub const ALIGN_TOLERANCE_MS: u64 = 300;

/// 使用双指针把 `secondary` 的文本写入 `primary` 对应行的 `target` 字段。
///
/// 两个序列都应按开始时间排序。返回新的歌词行，输入不会被修改；
/// 没有匹配到的行保持原样。
#[must_use]
pub fn align_lyrics(
    primary: &[LyricLine],
    secondary: &[LyricLine],
    target: AlignTarget,
) -> Vec<LyricLine> {
    let mut result = primary.to_vec();
    if result.is_empty() || secondary.is_empty() {
        return result;
    }

    let mut i = 0;
    let mut j = 0;

    while i < result.len() && j < secondary.len() {
        let line_start = result[i].start_ms;
        let other = &secondary[j];

        if line_start.abs_diff(other.start_ms) <= ALIGN_TOLERANCE_MS {
            *target.field_mut(&mut result[i]) = other.text();
            i += 1;
            j += 1;
        } else if line_start < other.start_ms {
            i += 1;
        } else {
            j += 1;
        }
    }

    result
}
