//! 歌词输出格式的生成器。

pub mod ass_generator;
pub mod lrc_generator;
pub mod ttml_generator;
