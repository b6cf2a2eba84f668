// src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShimError {

    #[error("number of input nodes ({actual}) does not match the expected number ({expected})")]
    InputCountMismatch {
        expected: usize,
        actual: usize,
    },

    #[error("could not map input '{name}' to the reader; reader outputs only [{available}]")]
    UnknownInput {
        name: String,
        available: String,
    },

    #[error("sample size ({actual}) for input '{name}' does not match the expected size ({expected})")]
    ShapeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("storage type '{kind}' is not supported")]
    UnsupportedStorage {
        kind: String,
    },

    #[error("destination matrix for input '{name}' lives on {actual}, but this minibatch targets {expected}")]
    DeviceMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("malformed buffer for input '{name}': {message}")]
    MalformedBuffer {
        name: String,
        message: String,
    },

    #[error("reader error: {message}")]
    Reader {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

pub type Result<T> = std::result::Result<T, ShimError>;

// Convenience constructors
impl ShimError {

    pub fn input_count_mismatch(expected: usize, actual: usize) -> Self {
        Self::InputCountMismatch { expected, actual }
    }

    pub fn unknown_input(name: impl Into<String>, available: impl Into<String>) -> Self {
        Self::UnknownInput {
            name: name.into(),
            available: available.into(),
        }
    }

    pub fn shape_mismatch(name: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            name: name.into(),
            expected,
            actual,
        }
    }

    pub fn unsupported_storage(kind: impl ToString) -> Self {
        Self::UnsupportedStorage {
            kind: kind.to_string(),
        }
    }

    pub fn device_mismatch(
        name: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        Self::DeviceMismatch {
            name: name.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn malformed_buffer(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedBuffer {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn reader(message: impl Into<String>) -> Self {
        Self::Reader {
            message: message.into(),
            source: None,
        }
    }

    pub fn reader_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Reader {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
