/// Result alias carrying [`ComposerError`].
pub type Result<T> = std::result::Result<T, ComposerError>;

/// Errors surfaced by configuration loading and file output.
///
/// Generation itself has no recoverable failure modes; broken invariants
/// there are assertion failures.
#[derive(Debug, thiserror::Error)]
pub enum ComposerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// A configuration value that would break timing or sampling.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl ComposerError {
    pub fn invalid_config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
