//! UCloud API client and CDN operations

pub mod certificate;
pub mod client;
pub mod common;
pub mod domain;
pub mod error;
pub mod error_code;
mod sign;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use certificate::{Certificate, CertificatesApi};
pub use client::{Client, ClientOptions, DEFAULT_ENDPOINT};
pub use domain::{DomainConfigInfo, DomainStatus, DomainsApi};
pub use error::{ApiError, TransportFailure};
