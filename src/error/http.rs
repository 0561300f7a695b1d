use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to encode JSON body: {source}")]
    EncodeJsonBody {
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to build HTTP client: {source}")]
    BuildClientFailed {
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to build request: {source}")]
    BuildRequestFailed {
        #[source]
        source: reqwest::Error,
    },
    #[error("Request failed: {source}")]
    RequestFailed {
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to read response body: {source}")]
    ReadBodyFailed {
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to build sigv4 params: {source}")]
    SigV4Params {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Failed to build sigv4 request: {source}")]
    SigV4Request {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Failed to sign request: {source}")]
    SigV4Sign {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Failed to build sign request: {source}")]
    SigV4BuildSign {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl HttpError {
    /// Whether the failure was a transport deadline rather than a refusal or protocol error.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            HttpError::RequestFailed { source } | HttpError::ReadBodyFailed { source } => {
                source.is_timeout()
            }
            HttpError::InvalidUrl { .. }
            | HttpError::EncodeJsonBody { .. }
            | HttpError::BuildClientFailed { .. }
            | HttpError::BuildRequestFailed { .. }
            | HttpError::SigV4Params { .. }
            | HttpError::SigV4Request { .. }
            | HttpError::SigV4Sign { .. }
            | HttpError::SigV4BuildSign { .. } => false,
        }
    }
}
