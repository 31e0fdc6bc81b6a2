use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("OSRM answered {code}: {message}")]
    Osrm { code: String, message: String },

    #[error("Table has {actual} entries, expected {expected}")]
    TableSize { expected: usize, actual: usize },

    #[error("Cache folder is not configured, set {0}")]
    CacheNotConfigured(&'static str),

    #[error("Path {0} is not a directory")]
    NotADirectory(String),

    #[error("Cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl ProviderError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ProviderError::Request(_) | ProviderError::Api { .. } => {
                "road network service unavailable"
            }
            ProviderError::Osrm { .. } | ProviderError::TableSize { .. } => {
                "no route found between points"
            }
            ProviderError::CacheNotConfigured(_)
            | ProviderError::NotADirectory(_)
            | ProviderError::Io(_)
            | ProviderError::Deserialize(_) => "distance cache unavailable",
        }
    }
}
