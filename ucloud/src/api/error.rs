use thiserror::Error;

use super::error_code;
use crate::retry::{OperationOutcome, RetryError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("{action} throttled (RetCode {code}): {message}")]
    Throttled {
        action: String,
        code: i64,
        message: String,
    },

    #[error("{action} failed (RetCode {code}): {message}")]
    Rejected {
        action: String,
        code: i64,
        message: String,
    },

    #[error("{action} still failing after {attempts} attempts: {source}")]
    RetriesExhausted {
        action: String,
        attempts: u32,
        #[source]
        source: Box<ApiError>,
    },

    #[error("fail to get expected status: domain {domain_id} did not reach {expected:?} (last seen: {})", .last_observed.as_deref().unwrap_or("unknown"))]
    ConvergenceTimeout {
        domain_id: String,
        expected: Vec<String>,
        last_observed: Option<String>,
    },

    #[error("domain {0} failed the origin check")]
    CheckFailed(String),

    #[error("no config returned for domain {0}")]
    EmptyConfig(String),

    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("listing stopped after {0} full pages")]
    PageLimit(usize),

    #[error("operation cancelled")]
    Cancelled,
}

/// Whether a failure is transient.
pub trait TransportFailure {
    fn is_retryable(&self) -> bool;
}

impl TransportFailure for reqwest::Error {
    fn is_retryable(&self) -> bool {
        self.is_timeout() || self.is_connect() || self.is_request()
    }
}

impl TransportFailure for ApiError {
    fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(err) => err.is_retryable(),
            ApiError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            ApiError::Throttled { .. } => true,
            _ => false,
        }
    }
}

impl ApiError {
    /// Builds the error for a non-zero `RetCode`.
    pub fn from_ret_code(action: &str, code: i64, message: String) -> Self {
        if error_code::is_retryable(code) {
            ApiError::Throttled {
                action: action.to_string(),
                code,
                message,
            }
        } else {
            ApiError::Rejected {
                action: action.to_string(),
                code,
                message,
            }
        }
    }

    pub(crate) fn from_retry(action: &str, err: RetryError<ApiError>) -> Self {
        match err {
            RetryError::Permanent(err) => err,
            RetryError::Exhausted { attempts, last, .. } => ApiError::RetriesExhausted {
                action: action.to_string(),
                attempts,
                source: Box::new(last),
            },
            RetryError::Cancelled { .. } => ApiError::Cancelled,
        }
    }

    /// The `RetCode` behind this error, looking through retry wrappers.
    pub fn ret_code(&self) -> Option<i64> {
        match self {
            ApiError::Throttled { code, .. } | ApiError::Rejected { code, .. } => Some(*code),
            ApiError::RetriesExhausted { source, .. } => source.ret_code(),
            _ => None,
        }
    }
}

pub(crate) fn classify<T>(result: Result<T, ApiError>) -> OperationOutcome<T, ApiError> {
    OperationOutcome::from_result(result, |err: &ApiError| err.is_retryable())
}
