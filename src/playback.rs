//! 播放时根据当前时间查找正在播放的歌词行。
//!
//! 该函数会在每一帧被调用，因此只做二分查找和回溯，不分配内存。
//! 回溯在找到足够的候选行后立即停止。

use lyric_engine_core::{LyricLine, PlaybackOptions};

/// 查找时额外提前的时间，用于抵消人对歌词出现的感知延迟。
pub const LOOKAHEAD_MS: i64 = 300;

/// 同时高亮的行数下限。
const MIN_KEEP: usize = 2;

/// 返回当前应该高亮的行的下标，没有合适的行时返回 `None`。
///
/// * `current_ms` - 播放器的当前时间
/// * `offset_ms` - 用户设置的偏移，正数表示歌词提前
/// * `max_keep` - 多行重叠时最多保留的高亮行数，小于 2 时按 2 处理
///
/// 第一行的 `end_ms` 为 0 时视为普通逐行歌词，只按开始时间定位；
/// 否则视为逐字歌词，会考虑对唱、背景人声等重叠行。
#[must_use]
pub fn resolve_active_index(
    current_ms: i64,
    lines: &[LyricLine],
    offset_ms: i64,
    max_keep: usize,
) -> Option<usize> {
    let last_index = lines.len().checked_sub(1)?;
    let play_seek = current_ms
        .saturating_add(offset_ms)
        .saturating_add(LOOKAHEAD_MS);

    // 结束时间为 0 表示没有结束时间
    let last_end = lines[last_index].end_ms;
    if last_end > 0 && play_seek >= to_signed(last_end) {
        return Some(last_index);
    }

    if lines[0].end_ms == 0 {
        resolve_line_timed(lines, play_seek)
    } else {
        resolve_word_timed(lines, play_seek, max_keep)
    }
}

/// 使用 [`PlaybackOptions`] 中的偏移和保留行数。
#[must_use]
pub fn resolve_with_options(
    current_ms: i64,
    lines: &[LyricLine],
    options: &PlaybackOptions,
) -> Option<usize> {
    resolve_active_index(current_ms, lines, options.offset_ms, options.max_keep)
}

/// 与 [`resolve_active_index`] 相同，但没有结果时返回 `-1`。
#[must_use]
pub fn resolve_active_index_raw(
    current_ms: i64,
    lines: &[LyricLine],
    offset_ms: i64,
    max_keep: usize,
) -> i64 {
    resolve_active_index(current_ms, lines, offset_ms, max_keep)
        .and_then(|index| i64::try_from(index).ok())
        .unwrap_or(-1)
}

fn resolve_line_timed(lines: &[LyricLine], play_seek: i64) -> Option<usize> {
    match lines
        .iter()
        .position(|line| to_signed(line.start_ms) > play_seek)
    {
        Some(0) => None,
        Some(next) => Some(next - 1),
        None => Some(lines.len() - 1),
    }
}

fn resolve_word_timed(lines: &[LyricLine], play_seek: i64, max_keep: usize) -> Option<usize> {
    if play_seek < to_signed(lines[0].start_ms) {
        return None;
    }

    // 第一个开始时间晚于 play_seek 的行，这里至少为 1
    let boundary = lines.partition_point(|line| to_signed(line.start_ms) <= play_seek);
    let keep = max_keep.max(MIN_KEEP);

    let mut count = 0;
    let mut latest = None;
    let mut second_latest = None;
    let mut earliest_kept = None;

    for index in (0..boundary).rev() {
        if !lines[index].contains(play_seek) {
            continue;
        }
        count += 1;
        match count {
            1 => latest = Some(index),
            2 => second_latest = Some(index),
            _ => {}
        }
        if count == keep {
            earliest_kept = Some(index);
            break;
        }
    }

    match count {
        // 处于两行之间的空隙
        0 => Some(boundary - 1),
        1 => latest,
        _ if count >= keep => earliest_kept,
        _ => second_latest,
    }
}

fn to_signed(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}
