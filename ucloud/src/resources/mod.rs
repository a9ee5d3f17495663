//! Resource lifecycle adapters

pub mod cdn_domain;
pub mod domain_ssl_association;
pub mod ssl_certificate;

pub use cdn_domain::{CdnDomainModel, CdnDomainResource};
pub use domain_ssl_association::{DomainSslAssociationModel, DomainSslAssociationResource};
pub use ssl_certificate::{SslCertificateModel, SslCertificateResource};
