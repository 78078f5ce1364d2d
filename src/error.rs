use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f64),
    #[error("line has {actual} tokens but template expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("template produced twice: {0}")]
    DuplicateTemplate(String),
    #[error("cannot score a known template with zero processed lines")]
    EmptyHistory,
    #[error("catalog io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClusterError>;
