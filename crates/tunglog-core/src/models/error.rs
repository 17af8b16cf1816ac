use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CoreErrorKind {
    /// Caller supplied something the domain rejects (unknown log type, bad config).
    InvalidInput,
    /// Store failure expected to clear up on retry (busy database, dropped connection).
    Transient,
    /// Store failure that retrying cannot fix (constraint violation, malformed row).
    StorageFailure,
    Export,
    Internal,
}

impl CoreErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Transient)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{message}")]
pub struct CoreError {
    pub kind: CoreErrorKind,
    pub operation: Option<&'static str>,
    pub message: String,
}

impl CoreError {
    pub fn new(kind: CoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            operation: None,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::InvalidInput, message)
    }

    pub fn export(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Export, message)
    }

    pub fn with_operation(mut self, operation: &'static str) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Prefix the message with caller context, keeping kind and operation.
    pub fn context(mut self, prefix: &str) -> Self {
        self.message = format!("{prefix}: {}", self.message);
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
