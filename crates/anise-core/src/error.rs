use thiserror::Error;

pub const ERROR_TAG: &str = "\x1b[31m[ERROR]\x1b[0m";
pub const WARN_TAG: &str = "\x1b[33m[WARN]\x1b[0m";

/// Every failure the engine can surface. The first error aborts the current
/// activation and unwinds; scope cleanup still runs on the way out.
#[derive(Error, Debug, Clone)]
pub enum AniseError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    Dispatch(String),

    #[error("{0}")]
    Arity(String),

    #[error("type error: {0}")]
    Type(String),

    #[error("{0}")]
    Name(String),

    #[error("{0}")]
    Structural(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AniseError {
    pub fn parse(message: impl Into<String>) -> Self {
        AniseError::Parse(message.into())
    }

    pub fn dispatch(message: impl Into<String>) -> Self {
        AniseError::Dispatch(message.into())
    }

    pub fn arity(message: impl Into<String>) -> Self {
        AniseError::Arity(message.into())
    }

    pub fn type_err(message: impl Into<String>) -> Self {
        AniseError::Type(message.into())
    }

    pub fn name(message: impl Into<String>) -> Self {
        AniseError::Name(message.into())
    }

    pub fn structural(message: impl Into<String>) -> Self {
        AniseError::Structural(message.into())
    }

    pub fn io(message: impl Into<String>) -> Self {
        AniseError::Io(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AniseError::Internal(message.into())
    }
}

impl From<std::io::Error> for AniseError {
    fn from(err: std::io::Error) -> Self {
        AniseError::Io(err.to_string())
    }
}
