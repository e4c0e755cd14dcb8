/// Convenience result type used across the editor.
pub type MemeResult<T> = Result<T, MemeError>;

/// Errors surfaced by the editor. None of them are fatal to the process: each one maps to
/// "no state change" plus a message for the user.
#[derive(thiserror::Error, Debug)]
pub enum MemeError {
    /// Invalid caller-supplied data or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// An image or data URI could not be read or decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Compositing or encoding failed.
    #[error("render error: {0}")]
    Render(String),

    /// No usable caption font.
    #[error("font error: {0}")]
    Font(String),

    /// The storage backend failed to read or write.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Errors when serializing or deserializing persisted data.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MemeError {
    /// Build a [`MemeError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MemeError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`MemeError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`MemeError::Font`] value.
    pub fn font(msg: impl Into<String>) -> Self {
        Self::Font(msg.into())
    }

    /// Build a [`MemeError::Persistence`] value.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Build a [`MemeError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Decode and persistence failures leave all state untouched and are worth showing to
    /// the user; the rest indicate bad input or configuration.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Persistence(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
