pub type RedubResult<T> = Result<T, RedubError>;

#[derive(thiserror::Error, Debug)]
pub enum RedubError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("input error: {0}")]
    Input(String),

    #[error("transport error: {message}")]
    Transport {
        /// `None` for connection-level failures.
        status: Option<u16>,
        message: String,
    },

    #[error("media error: {0}")]
    Media(String),

    #[error("remux error: {0}")]
    Remux(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RedubError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn transport(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: msg.into(),
        }
    }

    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    pub fn remux(msg: impl Into<String>) -> Self {
        Self::Remux(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Server-side (HTTP 5xx) transport failures, the only ones worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { status: Some(s), .. } if (500..600).contains(s))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
