//! Retry with exponential backoff.
//!
//! Operations report each attempt as an [`OperationOutcome`]; deciding whether
//! a failure is retryable is the caller's job. The executor only owns the
//! timing: growing, jittered delays between attempts, an optional ceiling on
//! total elapsed time, an optional attempt cap and cancellation.

mod executor;
mod policy;

pub use executor::{execute_with_retry, OperationOutcome, Retrier, RetryError};
pub use policy::RetryPolicy;
