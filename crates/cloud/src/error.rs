//! Error types for the remote engine client.

use thiserror::Error;

/// Errors produced by the engine client.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("engine rejected {endpoint} with HTTP {status}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed engine response: {0}")]
    Decode(String),

    #[error("core error: {0}")]
    Core(#[from] trendr_core::Error),
}

impl CloudError {
    /// Collapse into the pipeline error type, tagging which stage the failed
    /// request belonged to.
    pub fn into_stage(self, stage: &str) -> trendr_core::Error {
        match self {
            CloudError::Core(e) => e,
            other => trendr_core::Error::remote(stage, other.to_string()),
        }
    }
}

/// Result alias for engine client operations.
pub type Result<T> = std::result::Result<T, CloudError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_map_to_the_given_stage() {
        let err = CloudError::Network("connection refused".into()).into_stage("segmentation");
        assert!(matches!(
            err,
            trendr_core::Error::Remote { ref stage, ref message }
                if stage == "segmentation" && message.contains("connection refused")
        ));

        let err = CloudError::Api {
            endpoint: "export".into(),
            status: 503,
            message: "busy".into(),
        }
        .into_stage("export");
        assert!(matches!(
            err,
            trendr_core::Error::Remote { ref stage, ref message }
                if stage == "export" && message.contains("503")
        ));
    }

    #[test]
    fn core_errors_pass_through_unwrapped() {
        let err = CloudError::Core(trendr_core::Error::MissingBand("NBR".into()))
            .into_stage("collection");
        assert!(matches!(err, trendr_core::Error::MissingBand(ref b) if b == "NBR"));
    }
}
