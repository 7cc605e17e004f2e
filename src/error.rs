use std::path::PathBuf;

/// Failures talking to the pipeline API.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        match self {
            FetchError::Transport { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

/// Failures reading or writing the saved configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No configuration directory available on this platform")]
    NoConfigDir,

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let error = FetchError::Status {
            url: "http://localhost:8000/api/stats".to_string(),
            status: 503,
        };
        assert_eq!(error.to_string(), "http://localhost:8000/api/stats returned HTTP 503");
        assert!(!error.is_timeout());
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::Io {
            path: PathBuf::from("/tmp/pipedash/config.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(error.to_string(), "Failed to access /tmp/pipedash/config.json: denied");
        assert_eq!(
            ConfigError::NoConfigDir.to_string(),
            "No configuration directory available on this platform"
        );
    }
}
