use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Could not infer relationship between {source_model} and {target_model}")]
    RelationshipNotFound {
        source_model: String,
        target_model: String,
    },

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Model not registered: {0}")]
    ModelNotRegistered(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
