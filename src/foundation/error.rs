/// Convenience result type used across lamina.
pub type LaminaResult<T> = Result<T, LaminaError>;

/// Top-level error taxonomy used by setup APIs.
///
/// The per-frame render path never returns these; it reports a [`crate::FrameOutcome`] instead.
#[derive(thiserror::Error, Debug)]
pub enum LaminaError {
    /// Invalid user-provided timeline, texture or configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while validating or sampling keyframe animations.
    #[error("animation error: {0}")]
    Animation(String),

    /// Errors while evaluating timeline or pixel state.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// A source failed to load its metadata.
    #[error("load error [{domain}:{code}]: {message}")]
    Load {
        /// Reverse-DNS style domain identifying the failing component.
        domain: String,
        /// Domain-specific error code.
        code: i32,
        /// Human readable description.
        message: String,
    },

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LaminaError {
    /// Build a [`LaminaError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`LaminaError::Animation`] value.
    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    /// Build a [`LaminaError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`LaminaError::Load`] value.
    pub fn load(domain: impl Into<String>, code: i32, msg: impl Into<String>) -> Self {
        Self::Load {
            domain: domain.into(),
            code,
            message: msg.into(),
        }
    }

    /// Domain tag of a load failure, if this is one.
    pub fn domain(&self) -> Option<&str> {
        match self {
            Self::Load { domain, .. } => Some(domain.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
