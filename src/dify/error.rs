use super::RewriteMode;

pub type Result<T> = std::result::Result<T, DifyError>;

#[derive(Debug, thiserror::Error)]
pub enum DifyError {
    #[error("Dify text rewrite timed out")]
    Timeout,

    #[error("Dify text rewrite network error: {0}")]
    Network(String),

    /// The workflow answered, but neither output path held any text.
    #[error("Dify returned no usable rewrite result. Response keys: {keys:?}")]
    MissingResult { keys: Vec<String> },

    #[error("Dify returned no usable rewrite result.")]
    EmptyAnswer,

    #[error("Dify text rewrite failed: no {0} API key configured")]
    MissingApiKey(RewriteMode),

    #[error("Dify text rewrite failed: {0}")]
    Unexpected(String),
}

impl From<reqwest::Error> for DifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DifyError::Timeout
        } else {
            DifyError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DifyError {
    fn from(err: serde_json::Error) -> Self {
        DifyError::Unexpected(err.to_string())
    }
}
