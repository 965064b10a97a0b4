use std::time::Duration;

use thiserror::Error;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("render backend failure: {0}")]
    Backend(String),
}

/// Failure of a single export action.
///
/// Export errors are isolated to the export call: the live surface and the
/// displayed chart are never affected.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("nothing has been rendered yet")]
    NothingRendered,

    #[error("invalid export options: {0}")]
    InvalidOptions(String),

    #[error("capture failed: {0}")]
    Capture(String),

    #[error("export timed out after {0:?}")]
    TimedOut(Duration),

    #[error("export cancelled")]
    Cancelled,
}

impl From<ChartError> for ExportError {
    fn from(err: ChartError) -> Self {
        Self::Capture(err.to_string())
    }
}
