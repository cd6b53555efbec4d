use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnotError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid sheet format: {0}")]
    InvalidSheetFormat(String),

    #[error("Gene {gene:?} has a recorded frequency of 0, marker potential is undefined")]
    ZeroFrequency { gene: String },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Invalid parameter: {name} = {value}, {message}")]
    InvalidParameter {
        name: String,
        value: String,
        message: String,
    },
}

impl From<polars::prelude::PolarsError> for AnnotError {
    fn from(e: polars::prelude::PolarsError) -> Self {
        AnnotError::DataError(e.to_string())
    }
}

/// Type alias for Result with AnnotError
pub type Result<T> = std::result::Result<T, AnnotError>;

impl AnnotError {
    /// Create a new InvalidSheetFormat error
    pub fn invalid_sheet_format(message: impl Into<String>) -> Self {
        AnnotError::InvalidSheetFormat(message.into())
    }

    /// Create a new ZeroFrequency error
    pub fn zero_frequency(gene: impl Into<String>) -> Self {
        AnnotError::ZeroFrequency { gene: gene.into() }
    }

    /// Create a new InvalidParameter error
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        AnnotError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            message: message.into(),
        }
    }
}
