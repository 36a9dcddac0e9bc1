use dashflow_common::DashError;
use thiserror::Error;

pub type BoardResult<T> = Result<T, BoardError>;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Eval(#[from] DashError),
}

impl BoardError {
    /// The engine error underneath, if any.
    pub fn as_eval(&self) -> Option<&DashError> {
        match self {
            Self::Eval(e) => Some(e),
            _ => None,
        }
    }
}
