use alloc::string::String;

/// Errors which stop engine setup before any document is processed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    /// A converter declared no result type.
    #[error("converter `{converter}` does not claim any result type")]
    EmptyClaim { converter: &'static str },
    /// Two converters claim the same result type.
    #[error("converters `{first}` and `{second}` both generate result type `{target}`")]
    ConflictingConverters {
        target: &'static str,
        first: &'static str,
        second: &'static str,
    },
}

/// Error returned by a text converter which cannot read its input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ConvertError {
    message: String,
}

impl ConvertError {
    /// Creates an error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
