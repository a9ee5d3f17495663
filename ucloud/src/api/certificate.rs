//! SSL certificate API

use serde::{Deserialize, Serialize};

use super::client::Client;
use super::common::NoData;
use super::error::ApiError;
use crate::pagination::{PaginationCursor, PaginationError};

const ADD_CERTIFICATE: &str = "AddCertificate";
const LIST_CERTIFICATES: &str = "GetCertificateV2";
const DELETE_CERTIFICATE: &str = "DeleteCertificate";

/// Certificate record from `GetCertificateV2`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Certificate {
    pub cert_name: String,
    pub common_name: String,
    pub dns_name: String,
    pub domains: Vec<String>,
    pub begin_time: i64,
    pub end_time: i64,
    pub create_time: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AddCertificateRequest<'a> {
    cert_name: &'a str,
    user_cert: &'a str,
    private_key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ca_cert: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ListCertificatesRequest {
    offset: usize,
    limit: usize,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct CertificatePage {
    cert_list: Vec<Certificate>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DeleteCertificateRequest<'a> {
    cert_name: &'a str,
}

/// Certificate API accessor
pub struct CertificatesApi<'a> {
    client: &'a Client,
}

impl<'a> CertificatesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Upload a certificate. Throttling is retried; a rejection (bad PEM,
    /// duplicate name) is returned on the first attempt.
    pub async fn add(
        &self,
        cert_name: &str,
        user_cert: &str,
        private_key: &str,
        ca_cert: Option<&str>,
    ) -> Result<(), ApiError> {
        let request = AddCertificateRequest {
            cert_name,
            user_cert,
            private_key,
            ca_cert: ca_cert.filter(|ca| !ca.is_empty()),
        };
        self.client
            .call::<_, NoData>(ADD_CERTIFICATE, &request)
            .await?;

        tracing::info!("Added SSL certificate {}", cert_name);
        Ok(())
    }

    /// List certificates. With no names, every certificate is returned in
    /// fetch order; otherwise only the named ones, stopping once all are found.
    pub async fn list<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Certificate>, ApiError> {
        let client = self.client;
        let paginator = client.paginator();
        let fetch_page = move |cursor: PaginationCursor| async move {
            let request = ListCertificatesRequest {
                offset: cursor.offset,
                limit: cursor.limit,
            };
            client
                .call::<_, CertificatePage>(LIST_CERTIFICATES, &request)
                .await
                .map(|page| page.cert_list)
        };

        let result = if names.is_empty() {
            paginator.collect(fetch_page).await
        } else {
            paginator
                .collect_matching(
                    names.iter().map(|name| name.as_ref().to_string()),
                    |cert: &Certificate| cert.cert_name.clone(),
                    fetch_page,
                )
                .await
        };

        result.map_err(|err| match err {
            PaginationError::Fetch(err) => err,
            PaginationError::PageLimit { pages } => ApiError::PageLimit(pages),
        })
    }

    /// Look up a single certificate by name.
    pub async fn get(&self, cert_name: &str) -> Result<Option<Certificate>, ApiError> {
        Ok(self.list(&[cert_name]).await?.into_iter().next())
    }

    pub async fn delete(&self, cert_name: &str) -> Result<(), ApiError> {
        self.client
            .call::<_, NoData>(DELETE_CERTIFICATE, &DeleteCertificateRequest { cert_name })
            .await?;

        tracing::info!("Deleted SSL certificate {}", cert_name);
        Ok(())
    }
}
