//! 时间戳与毫秒之间的换算。
//!
//! 只提供毫秒运算，具体的输出格式由各个生成器自行决定。

/// 一小时的毫秒数
pub const MS_PER_HOUR: u64 = 3_600_000;
/// 一分钟的毫秒数
pub const MS_PER_MINUTE: u64 = 60_000;
/// 一秒的毫秒数
pub const MS_PER_SECOND: u64 = 1000;

/// 将分、秒和小数部分的字符串解析为毫秒。
///
/// 小数部分按字符串处理：先在右侧补 `0` 到 3 位，再截取前 3 位，
/// 因此 `"5"` 为 500，`"12"` 为 120，`"1234"` 为 123。
/// 空的小数部分视为 0。任何部分不是数字时返回 `None`。
#[must_use]
pub fn parse_timestamp(minutes: &str, seconds: &str, fraction: &str) -> Option<u64> {
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: u64 = seconds.parse().ok()?;
    let millis = parse_fraction(fraction)?;

    minutes
        .checked_mul(MS_PER_MINUTE)?
        .checked_add(seconds.checked_mul(MS_PER_SECOND)?)?
        .checked_add(millis)
}

fn parse_fraction(fraction: &str) -> Option<u64> {
    if fraction.is_empty() {
        return Some(0);
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut normalized: String = fraction.chars().take(3).collect();
    while normalized.len() < 3 {
        normalized.push('0');
    }
    normalized.parse().ok()
}

/// 把毫秒拆分为 `(时, 分, 秒, 毫秒)`。
#[must_use]
pub const fn split_ms(ms: u64) -> (u64, u64, u64, u64) {
    (
        ms / MS_PER_HOUR,
        (ms % MS_PER_HOUR) / MS_PER_MINUTE,
        (ms % MS_PER_MINUTE) / MS_PER_SECOND,
        ms % MS_PER_SECOND,
    )
}

/// 把毫秒拆分为 `(总分钟数, 秒, 毫秒)`，用于不带小时字段的格式。
#[must_use]
pub const fn split_ms_minutes(ms: u64) -> (u64, u64, u64) {
    (
        ms / MS_PER_MINUTE,
        (ms % MS_PER_MINUTE) / MS_PER_SECOND,
        ms % MS_PER_SECOND,
    )
}
