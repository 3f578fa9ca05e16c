use thiserror::Error;

/// Everything that can end a chat session early.
///
/// `Interrupted` is the only kind the loop treats as a clean exit; the rest
/// are reported to the user and stop the loop.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("input interrupted")]
    Interrupted,

    #[error("request to Ollama failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatError {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }

    /// Map a terminal prompt failure; Ctrl-C surfaces as `Interrupted`.
    pub fn from_prompt(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::Interrupted {
            Self::Interrupted
        } else {
            Self::Io(err)
        }
    }
}
