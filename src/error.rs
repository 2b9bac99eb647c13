use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    ///
    /// In particular this means that use of Internal is never a guarantee
    /// the error is not, for example due to a user error - merely that it
    /// cannot be confidently determined by the code.
    Internal,

    /// The caller provided invalid input (an unrepresentable value, malformed
    /// ciphertext, a wrong passphrase) or asked for something impossible.
    User,
}

/// Condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The value could not be serialized to JSON.
    Serialization,
    /// Randomness, key derivation, sealing, or armoring failed while encrypting.
    Encryption,
    /// The passphrase was rejected on the single permitted attempt.
    ///
    /// Secretbox authentication cannot tell a wrong passphrase apart from a
    /// tampered sealed box, so both end up here.
    IncorrectPassphrase,
    /// The ciphertext is not a well-formed saltybox message.
    Decryption,
    /// The decrypted JSON does not fit the destination type.
    Deserialization,
    /// Reading from or writing to the underlying stream failed.
    Io,
}

#[derive(Debug, Clone, Error)]
#[error("{msg}")]
pub struct Error {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Specific condition tag.
    pub kind: ErrorKind,
    #[source]
    source: Option<Arc<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl Error {
    /// Creates a new error with a category, kind and display message.
    pub fn new(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that retains the originating source error.
    pub fn with_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind,
            source: Some(Arc::new(source)),
            msg: msg.into(),
        }
    }

    /// The message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the preserved source error if present.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Wraps the current error with a higher-level message while preserving
    /// the original as source. Category and kind carry over unchanged.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Arc::new(self)),
            msg: msg.into(),
        }
    }

    pub(crate) fn io(msg: impl Into<String>, source: std::io::Error) -> Self {
        Self::with_source(ErrorCategory::Internal, ErrorKind::Io, msg, source)
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCategory::User, ErrorKind::Decryption, msg)
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, Error>;
