use mockito::{Matcher, Server};
use serial_test::serial;
use std::time::Duration;
use ucloud::api::ClientOptions;
use ucloud::config::ProviderSettings;
use ucloud::resources::{DomainSslAssociationModel, SslCertificateModel};
use ucloud::retry::RetryPolicy;
use ucloud::UcloudProvider;

fn fast_provider() -> UcloudProvider {
    let policy = RetryPolicy::default()
        .with_initial_interval(Duration::from_millis(5))
        .with_max_interval(Duration::from_millis(20))
        .with_max_elapsed_time(Some(Duration::from_millis(500)));
    UcloudProvider::with_client_options(ClientOptions {
        mutation_policy: policy.clone(),
        polling_policy: policy,
        ..ClientOptions::default()
    })
}

fn settings(url: String) -> ProviderSettings {
    ProviderSettings {
        region: Some("cn-bj2".to_string()),
        zone: Some("cn-bj2-02".to_string()),
        project_id: Some("org-it".to_string()),
        public_key: Some("it-public".to_string()),
        private_key: Some("it-private".to_string()),
        base_url: Some(url),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn certificate_resource_lifecycle_with_mock_server() {
    let mut server = Server::new_async().await;
    let _add = server
        .mock("POST", "/")
        .match_body(Matcher::UrlEncoded("Action".into(), "AddCertificate".into()))
        .with_status(200)
        .with_body(r#"{"RetCode":0}"#)
        .create_async()
        .await;
    let _list = server
        .mock("POST", "/")
        .match_body(Matcher::UrlEncoded("Action".into(), "GetCertificateV2".into()))
        .with_status(200)
        .with_body(r#"{"RetCode":0,"CertList":[{"CertName":"web","Domains":["www.example.com"]}]}"#)
        .create_async()
        .await;

    let mut provider = fast_provider();
    let diagnostics = provider.configure(&settings(server.url()));
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let resource = provider.ssl_certificate_resource().unwrap();
    let plan = SslCertificateModel {
        cert_name: "web".to_string(),
        cert: "cert-pem".to_string(),
        key: "key-pem".to_string(),
        ca_cert: None,
    };

    let state = resource.create(plan.clone()).await.unwrap();
    assert_eq!(state, plan);

    let refreshed = resource.read(state).await.unwrap();
    assert_eq!(refreshed, Some(plan));

    let data_source = provider.ssl_certificate_data_source().unwrap();
    let listed = data_source.read().await.unwrap();
    assert_eq!(listed.cert_list.len(), 1);
    assert_eq!(listed.cert_list[0].domains, vec!["www.example.com"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn association_failure_surfaces_as_diagnostic() {
    let mut server = Server::new_async().await;
    let _config = server
        .mock("POST", "/")
        .match_body(Matcher::UrlEncoded("Action".into(), "GetUcdnDomainConfig".into()))
        .with_status(200)
        .with_body(r#"{"RetCode":0,"DomainList":[{"DomainId":"d1","AreaCode":"cn","Status":"enable"}]}"#)
        .create_async()
        .await;
    let _https = server
        .mock("POST", "/")
        .match_body(Matcher::UrlEncoded(
            "Action".into(),
            "UpdateUcdnDomainHttpsConfig".into(),
        ))
        .with_status(200)
        .with_body(r#"{"RetCode":8110,"Message":"certificate does not match domain"}"#)
        .create_async()
        .await;

    let mut provider = fast_provider();
    assert!(provider.configure(&settings(server.url())).is_empty());

    let resource = provider.domain_ssl_association_resource().unwrap();
    let err = resource
        .create(DomainSslAssociationModel {
            domain_id: "d1".to_string(),
            ssl_certificate_name: "c1".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.summary, "Failed to associate certificate");
    assert!(err.detail.contains("certificate does not match domain"));
}

#[test]
#[serial]
fn provider_handles_missing_credentials() {
    for var in [
        "UCLOUD_REGION",
        "UCLOUD_ZONE",
        "UCLOUD_PROJECT_ID",
        "UCLOUD_PUBLIC_KEY",
        "UCLOUD_PRIVATE_KEY",
    ] {
        std::env::remove_var(var);
    }

    let mut provider = UcloudProvider::new();
    let diagnostics = provider.configure(&ProviderSettings {
        region: Some("cn-bj2".to_string()),
        ..ProviderSettings::default()
    });

    assert_eq!(diagnostics.len(), 4);
    assert!(diagnostics.iter().all(|d| d.summary.starts_with("Missing ")));
    assert!(provider.ssl_certificate_resource().is_err());
}
