use alloc::string::String;

use crate::types::ConfigKey;

pub type WidgetResult<T> = core::result::Result<T, WidgetError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WidgetError {
    #[error("render target not found, widget is inert")]
    MissingRenderTarget,
    #[error("widget has been torn down")]
    Inert,
    #[error("malformed host message: {0}")]
    InvalidMessage(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// 配置字段校验错误
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("`{key}` expects {expected}")]
    WrongType {
        key: ConfigKey,
        expected: &'static str,
    },
    #[error("`{key}` rejected value {value}: {reason}")]
    InvalidValue {
        key: ConfigKey,
        value: String,
        reason: &'static str,
    },
}

impl ConfigError {
    pub fn key(&self) -> ConfigKey {
        match self {
            ConfigError::WrongType { key, .. } | ConfigError::InvalidValue { key, .. } => *key,
        }
    }
}
