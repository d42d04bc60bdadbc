pub mod converter;
pub mod error;

pub use converter::config::*;
pub use converter::types::*;
pub use error::*;
