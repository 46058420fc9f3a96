use thiserror::Error;

/// Failure of a request to one of the simulation endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },
    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },
    #[error("could not decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn transport(endpoint: &str, message: impl std::fmt::Display) -> Self {
        ApiError::Transport {
            endpoint: endpoint.to_string(),
            message: message.to_string(),
        }
    }

    pub fn decode(endpoint: &str, message: impl std::fmt::Display) -> Self {
        ApiError::Decode {
            endpoint: endpoint.to_string(),
            message: message.to_string(),
        }
    }
}

/// Problems building the view index from the page layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("duplicate trophic level id `{0}`")]
    DuplicateLevel(String),
    #[error("duplicate organism id `{0}`")]
    DuplicateOrganism(String),
    #[error("organism `{organism}` references unknown trophic level `{level}`")]
    UnknownLevel { organism: String, level: String },
    #[error("invalid layout: {0}")]
    Invalid(String),
}
