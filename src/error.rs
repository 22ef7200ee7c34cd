use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReceiptLedgerError {
    #[error("Invalid configuration value for {field}: {details}")]
    InvalidConfig { field: String, details: String },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReceiptLedgerError>;
