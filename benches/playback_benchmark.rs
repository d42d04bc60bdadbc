use std::fmt::Write;
use std::hint::black_box;
use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};
use lyric_engine::{LyricLine, LyricWord, parse_smart_lrc, playback::resolve_active_index};

const SAMPLE_QRC: &str = include_str!("../tests/test_data/sample.qrc");

/// 生成带有背景人声重叠行的逐字歌词。
fn build_word_lines(count: u64) -> Vec<LyricLine> {
    let mut lines = Vec::new();
    for i in 0..count {
        let start = i * 3000;
        let words = (0..6)
            .map(|w| LyricWord::new("字", start + w * 500, start + (w + 1) * 500))
            .collect();
        if let Some(line) = LyricLine::from_words(words) {
            lines.push(line);
        }
        if i % 4 == 0 {
            let mut bg = LyricLine::with_text("bg", start + 1000, start + 4000);
            bg.is_bg = true;
            lines.push(bg);
        }
    }
    lines
}

fn build_enhanced_lrc(count: u64) -> String {
    let mut content = String::new();
    for i in 0..count {
        let start = i * 3000;
        let _ = write!(content, "[{:02}:{:02}.000]", start / 60_000, start / 1000 % 60);
        for w in 0..4 {
            let t = start + w * 700;
            let _ = write!(content, "<{:02}:{:02}.{:03}>词", t / 60_000, t / 1000 % 60, t % 1000);
        }
        content.push('\n');
    }
    content
}

fn benchmark_resolve_active_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("Playback Resolve");

    group.measurement_time(Duration::from_secs(10));

    let lines = build_word_lines(400);
    let duration = lines.last().map_or(0, |l| l.end_ms) as i64;

    group.bench_function("resolve_sweep_400_lines", |b| {
        b.iter(|| {
            let mut time = 0;
            while time < duration {
                black_box(resolve_active_index(black_box(time), &lines, 0, 3));
                time += 16;
            }
        });
    });

    group.bench_function("resolve_single_frame", |b| {
        b.iter(|| resolve_active_index(black_box(600_123), black_box(&lines), 0, 3));
    });

    group.finish();
}

fn benchmark_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("Lyric Parsing");

    let enhanced = build_enhanced_lrc(200);

    group.bench_function("parse_enhanced_lrc", |b| {
        b.iter(|| {
            let document = parse_smart_lrc(black_box(&enhanced));
            black_box(document);
        });
    });

    group.bench_function("parse_qrc", |b| {
        let parser = lyric_engine::QrcParser::default();
        b.iter(|| {
            let document = parser.parse(black_box(SAMPLE_QRC), None, None);
            black_box(document);
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_resolve_active_index, benchmark_parsing);

criterion_main!(benches);
