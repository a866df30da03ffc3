use std::fmt;

use thiserror::Error;

/// Error returned by every saskit operation.
///
/// Field problems found while validating are not errors; they are reported
/// as diagnostics instead. An `Error` means the input could not be lexed, or
/// a token could not be signed at all.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<anyhow::Error>,
}

/// What went wrong, at the granularity callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Raw token or connection string is structurally malformed.
    ParseInvalid,
    /// Account key is empty or not base64.
    KeyInvalid,
    /// No signing format exists for the version and resource kind.
    Unsupported,
    /// Parameter set cannot be signed as given.
    RequestInvalid,
    /// Environment configuration holds an unusable value.
    ConfigInvalid,
}

impl ErrorKind {
    fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ParseInvalid => "parse invalid",
            ErrorKind::KeyInvalid => "key invalid",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::RequestInvalid => "request invalid",
            ErrorKind::ConfigInvalid => "config invalid",
        }
    }

    /// Kinds raised while producing a signature.
    pub fn is_signing(&self) -> bool {
        matches!(
            self,
            ErrorKind::KeyInvalid | ErrorKind::Unsupported | ErrorKind::RequestInvalid
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Build an error of `kind`.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause.
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Whether signing failed, as opposed to lexing or configuration.
    pub fn is_signing_error(&self) -> bool {
        self.kind.is_signing()
    }

    /// Whether the raw input could not be lexed.
    pub fn is_parse_error(&self) -> bool {
        self.kind == ErrorKind::ParseInvalid
    }

    /// [`ErrorKind::ParseInvalid`]
    pub fn parse_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseInvalid, message)
    }

    /// [`ErrorKind::KeyInvalid`]
    pub fn key_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::KeyInvalid, message)
    }

    /// [`ErrorKind::Unsupported`]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported, message)
    }

    /// [`ErrorKind::RequestInvalid`]
    pub fn request_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestInvalid, message)
    }

    /// [`ErrorKind::ConfigInvalid`]
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }
}

/// Result alias used across saskit.
pub type Result<T> = std::result::Result<T, Error>;
