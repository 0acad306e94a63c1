use thiserror::Error;

#[derive(Debug, Error)]
pub enum SentimyxError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Projection error: {0}")]
    Projection(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SentimyxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_display() {
        let err = SentimyxError::Config("search term required".into());
        assert_eq!(err.to_string(), "Configuration error: search term required");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SentimyxError>();
    }
}
