use thiserror::Error;

pub type WidgetResult<T> = Result<T, WidgetError>;

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("container not found: {target}")]
    ContainerNotFound { target: String },

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("data load failed: {0}")]
    DataLoad(String),

    #[error("chart backend error: {0}")]
    Chart(String),

    #[error("market-data feed error: {0}")]
    Feed(String),
}
