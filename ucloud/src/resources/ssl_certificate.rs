use crate::diagnostics::Diagnostic;
use crate::provider_data::not_configured;
use crate::UcloudProviderData;

/// State of an uploaded certificate. Certificates are immutable remotely, so
/// changing `cert_name` replaces the resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SslCertificateModel {
    pub cert_name: String,
    pub cert: String,
    pub key: String,
    pub ca_cert: Option<String>,
}

#[derive(Default)]
pub struct SslCertificateResource {
    provider_data: Option<UcloudProviderData>,
}

impl SslCertificateResource {
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
                "No provider data was provided to the resource",
            )],
        }
    }

    pub fn validate(&self, config: &SslCertificateModel) -> Vec<Diagnostic> {
        let mut diagnostics = vec![];
        for (attribute, value) in [
            ("cert_name", &config.cert_name),
            ("cert", &config.cert),
            ("key", &config.key),
        ] {
            if value.trim().is_empty() {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Missing {attribute}"),
                        format!("The '{attribute}' attribute is required"),
                    )
                    .with_attribute(attribute),
                );
            }
        }
        diagnostics
    }

    pub async fn create(&self, plan: SslCertificateModel) -> Result<SslCertificateModel, Diagnostic> {
        let provider_data = self.provider_data.as_ref().ok_or_else(not_configured)?;

        provider_data
            .client
            .certificates()
            .add(&plan.cert_name, &plan.cert, &plan.key, plan.ca_cert.as_deref())
            .await
            .map_err(|e| Diagnostic::from_error("Failed to add certificate", &e))?;

        Ok(plan)
    }

    /// `None` when the certificate no longer exists.
    pub async fn read(
        &self,
        state: SslCertificateModel,
    ) -> Result<Option<SslCertificateModel>, Diagnostic> {
        let provider_data = self.provider_data.as_ref().ok_or_else(not_configured)?;

        let found = provider_data
            .client
            .certificates()
            .get(&state.cert_name)
            .await
            .map_err(|e| Diagnostic::from_error("Failed to read certificate", &e))?;

        Ok(found.map(|_| state))
    }

    pub async fn update(
        &self,
        state: &SslCertificateModel,
        plan: SslCertificateModel,
    ) -> Result<SslCertificateModel, Diagnostic> {
        let provider_data = self.provider_data.as_ref().ok_or_else(not_configured)?;

        if state.cert_name == plan.cert_name {
            return Err(Diagnostic::error(
                "Failed to update certificate",
                format!(
                    "cert_name {} exists; certificates cannot be modified in place",
                    plan.cert_name
                ),
            )
            .with_attribute("cert_name"));
        }

        provider_data
            .client
            .certificates()
            .add(&plan.cert_name, &plan.cert, &plan.key, plan.ca_cert.as_deref())
            .await
            .map_err(|e| Diagnostic::from_error("Failed to create new certificate", &e))?;

        Ok(plan)
    }

    pub async fn delete(&self, state: &SslCertificateModel) -> Result<(), Diagnostic> {
        let provider_data = self.provider_data.as_ref().ok_or_else(not_configured)?;

        provider_data
            .client
            .certificates()
            .delete(&state.cert_name)
            .await
            .map_err(|e| Diagnostic::from_error("Failed to delete certificate", &e))
    }
}
