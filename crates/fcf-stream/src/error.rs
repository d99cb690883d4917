/// Errors produced by object streams and source selection.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The named resource could not be opened or stat'd.
    #[error("bad file {name}: {reason}")]
    BadFile { name: String, reason: String },

    /// The location's scheme, path, or format token cannot be resolved.
    #[error("unsupported uri {uri}: {reason}")]
    UnsupportedUri { uri: String, reason: String },

    /// Clean end of the stream. Not a failure for run loops.
    #[error("stream exhausted {name}: {reason}")]
    StreamExhausted { name: String, reason: String },

    /// Bytes are present but do not decode to a map record.
    #[error("stream corrupt {name}: {reason}")]
    StreamCorrupt { name: String, reason: String },

    /// The handle is in a bad state unrelated to normal exhaustion.
    #[error("internal error on {name}: {reason}")]
    Internal { name: String, reason: String },

    /// A configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl StreamError {
    pub(crate) fn bad_file(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::BadFile {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn unsupported(uri: impl Into<String>, reason: impl ToString) -> Self {
        Self::UnsupportedUri {
            uri: uri.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn exhausted(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::StreamExhausted {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn corrupt(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::StreamCorrupt {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn internal(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Internal {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns `true` for the clean end-of-stream condition.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::StreamExhausted { .. })
    }

    /// Returns `true` for every condition a run loop must propagate.
    pub fn is_fatal(&self) -> bool {
        !self.is_exhausted()
    }
}

/// Result alias for stream operations.
pub type StreamResult<T> = std::result::Result<T, StreamError>;
