pub mod ssl_certificate;

pub use ssl_certificate::{CertificateSummary, SslCertificateDataSource, SslCertificateListModel};
