use std::{fmt, io};

use quick_xml::{Error as QuickXmlErrorMain, events::attributes::AttrError as QuickXmlAttrError};
use thiserror::Error;

/// 定义歌词转换和处理过程中可能发生的各种错误。
///
/// 解析器本身不会返回错误（无效的输入只会得到空的文档），
/// 这些错误主要来自生成器的写入过程和配置加载。
#[derive(Error, Debug)]
pub enum ConvertError {
    /// XML 生成错误，通常来自 `quick-xml` 库。
    #[error("生成 XML 错误: {0}")]
    Xml(#[from] QuickXmlErrorMain),
    /// XML 属性解析错误，通常来自 `quick-xml` 库。
    #[error("XML 属性错误: {0}")]
    Attribute(#[from] QuickXmlAttrError),
    /// 字符串格式化错误。
    #[error("格式错误: {0}")]
    Format(#[from] fmt::Error),
    /// 写入缓冲区时的 IO 错误。
    #[error("IO 错误: {0}")]
    Io(#[from] io::Error),
    /// 从字节序列转换为 UTF-8 字符串失败。
    #[error("UTF-8 转换错误: {0}")]
    FromUtf8(#[from] std::string::FromUtf8Error),
    /// 配置文件解析失败。
    #[error("解析配置失败: {0}")]
    Config(#[from] toml::de::Error),
}

impl From<ConvertError> for std::io::Error {
    fn from(err: ConvertError) -> Self {
        Self::other(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts_to_io_error() {
        let toml_err = toml::from_str::<toml::Table>("a = ").unwrap_err();
        let err = ConvertError::from(toml_err);
        assert!(err.to_string().starts_with("解析配置失败"));

        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::Other);
    }
}
