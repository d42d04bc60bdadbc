//! 歌词行的后处理：对齐、元数据清理、括号替换和简繁转换。

pub mod aligner;
pub mod bracket_replacer;
pub mod chinese_conversion_processor;
pub mod metadata_stripper;
