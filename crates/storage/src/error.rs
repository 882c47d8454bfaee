use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read or write the config store: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode or decode the config store: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No saved configuration named '{0}'")]
    NotFound(String),
}
