use thiserror::Error;

#[derive(Error, Debug)]
pub enum PosError {
    #[error("OpenStreetMap node {node_id} not found")]
    OsmNodeNotFound { node_id: i64 },

    #[error("OpenStreetMap node {node_id} is missing required fields")]
    OsmNodeMissingFields { node_id: i64 },

    #[error("POS with ID {id} does not exist")]
    PosNotFound { id: i64 },

    #[error("POS with name '{name}' already exists")]
    DuplicateName { name: String },

    #[error("Clearing the POS catalog is disabled")]
    ClearDisabled,

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {message}")]
    Database { message: String },
}

impl From<rusqlite::Error> for PosError {
    fn from(e: rusqlite::Error) -> Self {
        PosError::Database {
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PosError>;
