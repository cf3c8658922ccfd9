use thiserror::Error;

#[derive(Error, Debug)]
pub enum HealthError {
    /// Evaluation requested for an instance that does not exist.
    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    /// Offline instances are skipped, not evaluated.
    #[error("Instance is offline: {0}")]
    InstanceOffline(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for HealthError {
    fn from(err: sqlx::Error) -> Self {
        HealthError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for HealthError {
    fn from(err: serde_json::Error) -> Self {
        HealthError::Storage(err.to_string())
    }
}
