//! 歌词格式的解析、处理与生成。

pub mod generators;
pub mod parsers;
pub mod processors;
pub mod time_codec;
