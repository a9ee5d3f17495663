use serde::Serialize;

use crate::diagnostics::Diagnostic;
use crate::provider_data::not_configured;
use crate::UcloudProviderData;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateSummary {
    pub cert_name: String,
    pub domains: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SslCertificateListModel {
    pub cert_list: Vec<CertificateSummary>,
}

/// Lists every uploaded certificate.
#[derive(Default)]
pub struct SslCertificateDataSource {
    provider_data: Option<UcloudProviderData>,
}

impl SslCertificateDataSource {
    pub const TYPE_NAME: &'static str = "st-ucloud_ssl_certificate";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn configure(&mut self, provider_data: Option<&UcloudProviderData>) -> Vec<Diagnostic> {
        match provider_data {
            Some(data) => {
                self.provider_data = Some(data.clone());
                vec![]
            }
            None => vec![Diagnostic::error(
                "No provider data",
                "No provider data was provided to the data source",
            )],
        }
    }

    pub async fn read(&self) -> Result<SslCertificateListModel, Diagnostic> {
        let provider_data = self.provider_data.as_ref().ok_or_else(not_configured)?;

        let certs = provider_data
            .client
            .certificates()
            .list::<&str>(&[])
            .await
            .map_err(|e| Diagnostic::from_error("Failed to list certificates", &e))?;

        Ok(SslCertificateListModel {
            cert_list: certs
                .into_iter()
                .map(|cert| CertificateSummary {
                    cert_name: cert.cert_name,
                    domains: cert.domains,
                })
                .collect(),
        })
    }
}
