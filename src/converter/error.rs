use std::fmt::Display;

use crate::parser::ParseError;

/// Every way a statement can fail to compile or run.
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertError {
    Parse(ParseError),
    Validation(String),
    Unsupported(String),
    Translation(String),
    Config(String),
    Store(String),
}

pub type ConvertResult<T> = Result<T, ConvertError>;

impl ConvertError {
    pub fn validation(message: impl Into<String>) -> Self {
        ConvertError::Validation(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        ConvertError::Unsupported(message.into())
    }

    pub fn translation(message: impl Into<String>) -> Self {
        ConvertError::Translation(message.into())
    }

    pub fn err<T>(self) -> ConvertResult<T> {
        Err(self)
    }
}

impl Display for ConvertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvertError::Parse(err) => write!(f, "{}", err),
            ConvertError::Validation(message) => write!(f, "ValidationError: {}", message),
            ConvertError::Unsupported(message) => write!(f, "UnsupportedError: {}", message),
            ConvertError::Translation(message) => write!(f, "TranslationError: {}", message),
            ConvertError::Config(message) => write!(f, "ConfigError: {}", message),
            ConvertError::Store(message) => write!(f, "StoreError: {}", message),
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConvertError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ParseError> for ConvertError {
    fn from(err: ParseError) -> Self {
        ConvertError::Parse(err)
    }
}
