use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Lock timeout: {0}")]
    LockTimeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BenchError {
    /// Process exit code for this class of failure (sysexits values where one fits).
    pub fn exit_code(&self) -> i32 {
        match self {
            BenchError::InvalidInput(_) => 64,
            BenchError::Validation(_) | BenchError::Schema(_) => 65,
            BenchError::LockTimeout(_) => 75,
            BenchError::Configuration(_) => 78,
            BenchError::Io(_) | BenchError::Serialization(_) => 1,
        }
    }
}
