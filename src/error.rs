use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorldscribeError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("chapter {0} does not exist")]
    ChapterNotFound(i64),
}

pub type Result<T> = std::result::Result<T, WorldscribeError>;
