//! Provider data handed to resources and data sources

use crate::api::Client;
use crate::diagnostics::Diagnostic;
use std::sync::Arc;

#[derive(Clone)]
pub struct UcloudProviderData {
    pub client: Arc<Client>,
}

impl UcloudProviderData {
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

/// Diagnostic for adapters requested before the provider is configured.
pub(crate) fn not_configured() -> Diagnostic {
    Diagnostic::error(
        "Provider not configured",
        "The provider must be configured before resources or data sources are used",
    )
}
