use crate::api::domain::{
    CacheConfig, CacheRule, CreateDomainCacheConf, CreateDomainConfig, DomainChange,
    UpdateDomainConfig, UpdateOriginConfig,
};
use crate::api::{DomainConfigInfo, DomainStatus};
use crate::diagnostics::Diagnostic;
use crate::provider_data::not_configured;
use crate::UcloudProviderData;

/// Accelerated domain. `domain_id`, `cname` and `status` are computed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CdnDomainModel {
    pub domain_id: Option<String>,
    pub domain: String,
    pub origin_ip: Vec<String>,
    pub origin_host: String,
    pub test_url: String,
    pub area_code: Option<String>,
    pub cdn_type: Option<String>,
    pub tag: Option<String>,
    pub cache_conf: Vec<CreateDomainCacheConf>,
    pub cname: Option<String>,
    pub status: Option<String>,
}

impl CdnDomainModel {
    fn create_config(&self) -> CreateDomainConfig {
        CreateDomainConfig {
            domain: self.domain.clone(),
            origin_ip: self.origin_ip.clone(),
            origin_host: self.origin_host.clone(),
            test_url: self.test_url.clone(),
            cache_conf: self.cache_conf.clone(),
            area_code: self.area_code.clone(),
            cdn_type: self.cdn_type.clone(),
            tag: self.tag.clone(),
        }
    }

    fn update_config(&self, domain_id: &str) -> UpdateDomainConfig {
        UpdateDomainConfig {
            domain_id: domain_id.to_string(),
            origin_conf: Some(UpdateOriginConfig {
                origin_ip: self.origin_ip.clone(),
                origin_host: Some(self.origin_host.clone()).filter(|host| !host.is_empty()),
                ..UpdateOriginConfig::default()
            }),
            cache_conf: Some(CacheConfig {
                cache_list: self.cache_conf.iter().map(CacheRule::from).collect(),
                ..CacheConfig::default()
            }),
            ..UpdateDomainConfig::default()
        }
    }

    /// Copy the observed remote settings over this model.
    fn refresh_from(mut self, info: DomainConfigInfo) -> Self {
        let non_empty = |value: String| Some(value).filter(|v| !v.is_empty());

        self.domain_id = Some(info.domain_id);
        if !info.domain.is_empty() {
            self.domain = info.domain;
        }
        if !info.origin_conf.origin_ip_list.is_empty() {
            self.origin_ip = info.origin_conf.origin_ip_list;
        }
        if !info.origin_conf.origin_host.is_empty() {
            self.origin_host = info.origin_conf.origin_host;
        }
        if !info.test_url.is_empty() {
            self.test_url = info.test_url;
        }
        self.area_code = non_empty(info.area_code).or(self.area_code);
        self.cdn_type = non_empty(info.cdn_type).or(self.cdn_type);
        self.tag = non_empty(info.tag).or(self.tag);
        self.cname = non_empty(info.cname);
        self.status = non_empty(info.status.to_string());
        self
    }
}

#[derive(Default)]
pub struct CdnDomainResource {
    provider_data: Option<UcloudProviderData>,
}

impl CdnDomainResource {
    pub const TYPE_NAME: &'static str = "st-ucloud_cdn_domain";

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

    pub fn validate(&self, config: &CdnDomainModel) -> Vec<Diagnostic> {
        let mut diagnostics = vec![];
        if config.domain.trim().is_empty() {
            diagnostics.push(
                Diagnostic::error("Missing domain", "The 'domain' attribute is required")
                    .with_attribute("domain"),
            );
        }
        if config.origin_ip.is_empty() {
            diagnostics.push(
                Diagnostic::error(
                    "Missing origin_ip",
                    "At least one origin IP address is required",
                )
                .with_attribute("origin_ip"),
            );
        }
        diagnostics
    }

    pub async fn create(&self, plan: CdnDomainModel) -> Result<CdnDomainModel, Diagnostic> {
        let provider_data = self.provider_data.as_ref().ok_or_else(not_configured)?;
        let domains = provider_data.client.domains();

        let domain_id = domains
            .create_or_update(&DomainChange::Create(plan.create_config()))
            .await
            .map_err(|e| Diagnostic::from_error("Failed to create CDN domain", &e))?;

        match domains.get_config(&domain_id).await {
            Ok(Some(info)) => Ok(plan.refresh_from(info)),
            Ok(None) => Ok(CdnDomainModel {
                domain_id: Some(domain_id),
                ..plan
            }),
            Err(e) => Err(Diagnostic::from_error("Failed to read created CDN domain", &e)),
        }
    }

    /// `None` when the domain is gone.
    pub async fn read(&self, state: CdnDomainModel) -> Result<Option<CdnDomainModel>, Diagnostic> {
        let provider_data = self.provider_data.as_ref().ok_or_else(not_configured)?;
        let Some(domain_id) = state.domain_id.clone() else {
            return Ok(None);
        };

        let info = provider_data
            .client
            .domains()
            .get_config(&domain_id)
            .await
            .map_err(|e| Diagnostic::from_error("Failed to read CDN domain", &e))?;

        Ok(info
            .filter(|info| info.status != DomainStatus::Delete)
            .map(|info| state.refresh_from(info)))
    }

    pub async fn update(
        &self,
        state: &CdnDomainModel,
        plan: CdnDomainModel,
    ) -> Result<CdnDomainModel, Diagnostic> {
        let provider_data = self.provider_data.as_ref().ok_or_else(not_configured)?;
        let domain_id = state.domain_id.clone().ok_or_else(|| {
            Diagnostic::error(
                "Failed to update CDN domain",
                "The domain has no domain_id in state",
            )
        })?;

        provider_data
            .client
            .domains()
            .create_or_update(&DomainChange::Update(plan.update_config(&domain_id)))
            .await
            .map_err(|e| Diagnostic::from_error("Failed to update CDN domain", &e))?;

        Ok(CdnDomainModel {
            domain_id: Some(domain_id),
            cname: state.cname.clone(),
            status: Some(DomainStatus::Enable.to_string()),
            ..plan
        })
    }

    pub async fn delete(&self, state: &CdnDomainModel) -> Result<(), Diagnostic> {
        let provider_data = self.provider_data.as_ref().ok_or_else(not_configured)?;
        let Some(domain_id) = state.domain_id.as_deref() else {
            return Ok(());
        };

        provider_data
            .client
            .domains()
            .delete(domain_id)
            .await
            .map_err(|e| Diagnostic::from_error("Failed to delete CDN domain", &e))
    }
}
