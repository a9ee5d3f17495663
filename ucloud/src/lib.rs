pub mod api;
pub mod cli;
pub mod config;
pub mod data_sources;
pub mod diagnostics;
pub mod pagination;
pub mod reconcile;
pub mod resources;
pub mod retry;

mod provider_data;

pub use provider_data::UcloudProviderData;

use api::{Client, ClientOptions};
use config::ProviderSettings;
use data_sources::SslCertificateDataSource;
use diagnostics::Diagnostic;
use resources::{CdnDomainResource, DomainSslAssociationResource, SslCertificateResource};

pub const PROVIDER_TYPE_NAME: &str = "st-ucloud";

/// Entry point for resource and data source construction. Holds the client
/// built at configuration time and hands it to every adapter.
pub struct UcloudProvider {
    provider_data: Option<UcloudProviderData>,
    client_options: ClientOptions,
}

impl Default for UcloudProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl UcloudProvider {
    pub fn new() -> Self {
        Self::with_client_options(ClientOptions::default())
    }

    pub fn with_client_options(client_options: ClientOptions) -> Self {
        Self {
            provider_data: None,
            client_options,
        }
    }

    /// Resolve settings, build the client and keep it for the adapters.
    pub fn configure(&mut self, settings: &ProviderSettings) -> Vec<Diagnostic> {
        let config = match settings.resolve() {
            Ok(config) => config,
            Err(e) => return diagnostics::config_diagnostics(&e),
        };

        match Client::with_options(&config, self.client_options.clone()) {
            Ok(client) => {
                tracing::info!(
                    "Configured UCloud provider for project {} in {}",
                    config.project_id,
                    config.region
                );
                self.provider_data = Some(UcloudProviderData::new(client));
                vec![]
            }
            Err(e) => vec![Diagnostic::from_error("Failed to create API client", &e)],
        }
    }

    pub fn provider_data(&self) -> Option<&UcloudProviderData> {
        self.provider_data.as_ref()
    }

    pub fn resource_type_names() -> [&'static str; 3] {
        [
            SslCertificateResource::TYPE_NAME,
            CdnDomainResource::TYPE_NAME,
            DomainSslAssociationResource::TYPE_NAME,
        ]
    }

    pub fn data_source_type_names() -> [&'static str; 1] {
        [SslCertificateDataSource::TYPE_NAME]
    }

    pub fn ssl_certificate_resource(&self) -> Result<SslCertificateResource, Diagnostic> {
        let mut resource = SslCertificateResource::new();
        self.configure_adapter(|data| resource.configure(data))?;
        Ok(resource)
    }

    pub fn cdn_domain_resource(&self) -> Result<CdnDomainResource, Diagnostic> {
        let mut resource = CdnDomainResource::new();
        self.configure_adapter(|data| resource.configure(data))?;
        Ok(resource)
    }

    pub fn domain_ssl_association_resource(
        &self,
    ) -> Result<DomainSslAssociationResource, Diagnostic> {
        let mut resource = DomainSslAssociationResource::new();
        self.configure_adapter(|data| resource.configure(data))?;
        Ok(resource)
    }

    pub fn ssl_certificate_data_source(&self) -> Result<SslCertificateDataSource, Diagnostic> {
        let mut data_source = SslCertificateDataSource::new();
        self.configure_adapter(|data| data_source.configure(data))?;
        Ok(data_source)
    }

    fn configure_adapter(
        &self,
        configure: impl FnOnce(Option<&UcloudProviderData>) -> Vec<Diagnostic>,
    ) -> Result<(), Diagnostic> {
        let data = self
            .provider_data
            .as_ref()
            .ok_or_else(provider_data::not_configured)?;
        match configure(Some(data)).into_iter().find(Diagnostic::is_error) {
            Some(diagnostic) => Err(diagnostic),
            None => Ok(()),
        }
    }
}
