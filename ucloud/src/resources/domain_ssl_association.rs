use crate::diagnostics::Diagnostic;
use crate::provider_data::not_configured;
use crate::UcloudProviderData;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainSslAssociationModel {
    pub domain_id: String,
    pub ssl_certificate_name: String,
}

/// Binds a certificate to a domain by switching HTTPS on in every area the
/// domain is served in.
#[derive(Default)]
pub struct DomainSslAssociationResource {
    provider_data: Option<UcloudProviderData>,
}

impl DomainSslAssociationResource {
    pub const TYPE_NAME: &'static str = "st-ucloud_cdn_domain_ssl_association";

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

    pub async fn create(
        &self,
        plan: DomainSslAssociationModel,
    ) -> Result<DomainSslAssociationModel, Diagnostic> {
        self.enable(&plan, "Failed to associate certificate").await?;
        Ok(plan)
    }

    /// `None` when the domain is gone or HTTPS has been switched off.
    pub async fn read(
        &self,
        state: DomainSslAssociationModel,
    ) -> Result<Option<DomainSslAssociationModel>, Diagnostic> {
        let provider_data = self.provider_data.as_ref().ok_or_else(not_configured)?;

        let config = provider_data
            .client
            .domains()
            .get_config(&state.domain_id)
            .await
            .map_err(|e| Diagnostic::from_error("Failed to read domain HTTPS config", &e))?;

        Ok(config
            .filter(|config| config.https_status_cn != "disable")
            .map(|config| DomainSslAssociationModel {
                ssl_certificate_name: config.cert_name_cn,
                ..state
            }))
    }

    pub async fn update(
        &self,
        plan: DomainSslAssociationModel,
    ) -> Result<DomainSslAssociationModel, Diagnostic> {
        self.enable(&plan, "Failed to update certificate association")
            .await?;
        Ok(plan)
    }

    pub async fn delete(&self, state: &DomainSslAssociationModel) -> Result<(), Diagnostic> {
        let provider_data = self.provider_data.as_ref().ok_or_else(not_configured)?;

        provider_data
            .client
            .domains()
            .update_https(&state.domain_id, false, &state.ssl_certificate_name)
            .await
            .map_err(|e| Diagnostic::from_error("Failed to disable HTTPS", &e))
    }

    async fn enable(
        &self,
        model: &DomainSslAssociationModel,
        summary: &str,
    ) -> Result<(), Diagnostic> {
        let provider_data = self.provider_data.as_ref().ok_or_else(not_configured)?;

        provider_data
            .client
            .domains()
            .update_https(&model.domain_id, true, &model.ssl_certificate_name)
            .await
            .map_err(|e| Diagnostic::from_error(summary, &e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::create_test_client;
    use mockito::Matcher;

    fn configured(url: &str) -> DomainSslAssociationResource {
        let mut resource = DomainSslAssociationResource::new();
        resource.configure(Some(&UcloudProviderData::new(create_test_client(url))));
        resource
    }

    fn state() -> DomainSslAssociationModel {
        DomainSslAssociationModel {
            domain_id: "ucdn-1".to_string(),
            ssl_certificate_name: "old-cert".to_string(),
        }
    }

    async fn read_with(config_body: &str) -> Option<DomainSslAssociationModel> {
        let mut server = mockito::Server::new_async().await;
        let _config = server
            .mock("POST", "/")
            .match_body(Matcher::UrlEncoded("Action".into(), "GetUcdnDomainConfig".into()))
            .with_status(200)
            .with_body(config_body)
            .create_async()
            .await;

        configured(&server.url()).read(state()).await.unwrap()
    }

    #[tokio::test]
    async fn read_refreshes_certificate_name() {
        let refreshed = read_with(
            r#"{"RetCode":0,"DomainList":[{"DomainId":"ucdn-1","HttpsStatusCn":"enable","CertNameCn":"new-cert"}]}"#,
        )
        .await;

        assert_eq!(refreshed.unwrap().ssl_certificate_name, "new-cert");
    }

    #[tokio::test]
    async fn read_drops_disabled_association() {
        let refreshed = read_with(
            r#"{"RetCode":0,"DomainList":[{"DomainId":"ucdn-1","HttpsStatusCn":"disable"}]}"#,
        )
        .await;

        assert!(refreshed.is_none());
    }

    #[tokio::test]
    async fn read_drops_missing_domain() {
        assert!(read_with(r#"{"RetCode":0,"DomainList":[]}"#).await.is_none());
    }

    async fn mock_enabled_domain(server: &mut mockito::ServerGuard) -> mockito::Mock {
        server
            .mock("POST", "/")
            .match_body(Matcher::UrlEncoded("Action".into(), "GetUcdnDomainConfig".into()))
            .with_status(200)
            .with_body(r#"{"RetCode":0,"DomainList":[{"DomainId":"ucdn-1","AreaCode":"cn","Status":"enable"}]}"#)
            .create_async()
            .await
    }

    async fn mock_enable_with(server: &mut mockito::ServerGuard, cert_name: &str) -> mockito::Mock {
        server
            .mock("POST", "/")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("Action".into(), "UpdateUcdnDomainHttpsConfig".into()),
                Matcher::UrlEncoded("DomainId".into(), "ucdn-1".into()),
                Matcher::UrlEncoded("Areacode".into(), "cn".into()),
                Matcher::UrlEncoded("HttpsStatus".into(), "enable".into()),
                Matcher::UrlEncoded("CertName".into(), cert_name.into()),
            ]))
            .with_status(200)
            .with_body(r#"{"RetCode":0}"#)
            .expect(1)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn create_enables_https_with_certificate() {
        let mut server = mockito::Server::new_async().await;
        let _config = mock_enabled_domain(&mut server).await;
        let enable = mock_enable_with(&mut server, "old-cert").await;

        let created = configured(&server.url()).create(state()).await.unwrap();

        assert_eq!(created, state());
        enable.assert_async().await;
    }

    #[tokio::test]
    async fn update_switches_to_the_new_certificate() {
        let mut server = mockito::Server::new_async().await;
        let _config = mock_enabled_domain(&mut server).await;
        let enable = mock_enable_with(&mut server, "new-cert").await;

        let plan = DomainSslAssociationModel {
            ssl_certificate_name: "new-cert".to_string(),
            ..state()
        };
        let updated = configured(&server.url()).update(plan.clone()).await.unwrap();

        assert_eq!(updated, plan);
        enable.assert_async().await;
    }

    #[tokio::test]
    async fn delete_disables_https_without_cert_name() {
        let mut server = mockito::Server::new_async().await;
        let _config = server
            .mock("POST", "/")
            .match_body(Matcher::UrlEncoded("Action".into(), "GetUcdnDomainConfig".into()))
            .with_status(200)
            .with_body(r#"{"RetCode":0,"DomainList":[{"DomainId":"ucdn-1","AreaCode":"cn","Status":"enable"}]}"#)
            .create_async()
            .await;
        let disable = server
            .mock("POST", "/")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("Action".into(), "UpdateUcdnDomainHttpsConfig".into()),
                Matcher::UrlEncoded("Areacode".into(), "cn".into()),
                Matcher::UrlEncoded("HttpsStatus".into(), "disable".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"RetCode":0}"#)
            .expect(1)
            .create_async()
            .await;

        configured(&server.url()).delete(&state()).await.unwrap();

        disable.assert_async().await;
    }
}
