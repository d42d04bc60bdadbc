//! # lyric_engine
//!
//! 歌词引擎：识别并解析逐行 LRC、逐字 LRC、增强型 LRC 与 QRC 歌词，
//! 按时间对齐翻译和音译，清理元数据行，再导出为 LRC、TTML 或 ASS。
//! 同时提供播放时的当前歌词行定位。
//!
//! 库本身不进行任何文件或网络访问。

pub mod converter;
pub mod export;
pub mod playback;

pub use converter::parsers::{parse_smart_lrc, qrc_parser::QrcParser};
pub use export::{ExportFormat, LyricExporter, LyricSources};
pub use lyric_engine_core::{
    AlignTarget, ConvertError, EngineConfig, LrcFormat, LyricDocument, LyricLine, LyricWord,
};
pub use playback::resolve_active_index;
