//! CDN domain API: configuration, lifecycle and HTTPS association.
//!
//! Every mutation here is followed by a status poll, since a successful
//! response only means the change was accepted, not that it is live.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::client::Client;
use super::common::{enable_flag, DomainListRequest, NoData};
use super::error::{classify, ApiError};
use crate::reconcile::{self, Observation, Status, WaitError};

const CREATE_DOMAIN: &str = "CreateCdnDomain";
const UPDATE_DOMAIN: &str = "UpdateUcdnDomainConfig";
const GET_DOMAIN_CONFIG: &str = "GetUcdnDomainConfig";
const UPDATE_DOMAIN_STATUS: &str = "UpdateUcdnDomainStatus";
const UPDATE_HTTPS: &str = "UpdateUcdnDomainHttpsConfig";

pub const AREA_ALL: &str = "all";
pub const AREA_ABROAD: &str = "abroad";
pub const AREA_CN: &str = "cn";

/// Domain lifecycle status as reported by `GetUcdnDomainConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DomainStatus {
    Enable,
    Delete,
    CheckFail,
    /// Transient or unknown states, kept verbatim.
    Other(String),
}

impl DomainStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DomainStatus::Enable => "enable",
            DomainStatus::Delete => "delete",
            DomainStatus::CheckFail => "checkFail",
            DomainStatus::Other(status) => status,
        }
    }
}

impl From<&str> for DomainStatus {
    fn from(status: &str) -> Self {
        match status {
            "enable" => DomainStatus::Enable,
            "delete" => DomainStatus::Delete,
            "checkFail" => DomainStatus::CheckFail,
            other => DomainStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for DomainStatus {
    fn from(status: String) -> Self {
        DomainStatus::from(status.as_str())
    }
}

impl From<DomainStatus> for String {
    fn from(status: DomainStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for DomainStatus {
    fn default() -> Self {
        DomainStatus::Other(String::new())
    }
}

impl Status for DomainStatus {
    fn is_deleted(&self) -> bool {
        matches!(self, DomainStatus::Delete)
    }
}

/// Area codes a domain's settings are applied to, in update order.
pub fn expand_area_code(area_code: &str) -> Vec<&str> {
    if area_code == AREA_ALL {
        vec![AREA_ABROAD, AREA_CN]
    } else {
        vec![area_code]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CacheRule {
    pub path_pattern: String,
    #[serde(rename = "CacheTTL")]
    pub cache_ttl: i64,
    pub cache_unit: String,
    pub cache_behavior: bool,
    pub description: String,
    pub follow_origin_rule: bool,
    pub http_code_pattern: String,
    pub use_regex: bool,
}

/// Cache rule accepted by `CreateCdnDomain`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateDomainCacheConf {
    pub path_pattern: String,
    #[serde(rename = "CacheTTL")]
    pub cache_ttl: i64,
    pub cache_unit: String,
    pub cache_behavior: bool,
}

impl From<&CreateDomainCacheConf> for CacheRule {
    fn from(conf: &CreateDomainCacheConf) -> Self {
        CacheRule {
            path_pattern: conf.path_pattern.clone(),
            cache_ttl: conf.cache_ttl,
            cache_unit: conf.cache_unit.clone(),
            cache_behavior: conf.cache_behavior,
            ..CacheRule::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateDomainConfig {
    pub domain: String,
    pub origin_ip: Vec<String>,
    pub origin_host: String,
    pub test_url: String,
    pub cache_conf: Vec<CreateDomainCacheConf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdn_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct CreatedDomain {
    domain: String,
    domain_id: String,
    ret_code: i64,
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct CreateDomainResponse {
    domain_list: Vec<CreatedDomain>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateOriginConfig {
    pub origin_ip: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_follow301: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ReferConf {
    pub refer_type: i64,
    pub null_refer: i64,
    pub refer_list: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateAccessControlConfig {
    pub ip_black_list: Vec<String>,
    pub ip_black_list_empty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refer_conf: Option<ReferConf>,
    pub enable_refer: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CacheConfig {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cache_host: String,
    pub cache_list: Vec<CacheRule>,
    pub http_code_cache_list: Vec<CacheRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateAdvancedConfig {
    pub http_client_header: Vec<String>,
    pub http_client_header_empty: bool,
    pub http_origin_header: Vec<String>,
    pub http_origin_header_empty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http2_https: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateDomainConfig {
    pub domain_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_conf: Option<UpdateOriginConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_control_conf: Option<UpdateAccessControlConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_conf: Option<CacheConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced_conf: Option<UpdateAdvancedConfig>,
}

/// Either half of a create-or-update.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainChange {
    Create(CreateDomainConfig),
    Update(UpdateDomainConfig),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OriginConf {
    pub origin_ip_list: Vec<String>,
    pub origin_host: String,
    pub origin_port: i64,
    pub origin_protocol: String,
    pub origin_follow301: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AccessControlConf {
    pub ip_black_list: Vec<String>,
    pub refer_conf: ReferConf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AdvancedConf {
    pub http_client_header: Vec<String>,
    pub http_origin_header: Vec<String>,
    pub http2_https: bool,
}

/// Domain configuration as returned by `GetUcdnDomainConfig`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DomainConfigInfo {
    pub domain_id: String,
    pub domain: String,
    pub cname: String,
    pub status: DomainStatus,
    pub area_code: String,
    pub cdn_type: String,
    pub tag: String,
    pub test_url: String,
    pub create_time: i64,
    pub cert_name_cn: String,
    pub cert_name_abroad: String,
    pub https_status_cn: String,
    pub https_status_abroad: String,
    pub origin_conf: OriginConf,
    pub cache_conf: CacheConfig,
    pub access_control_conf: AccessControlConf,
    pub advanced_conf: AdvancedConf,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetDomainConfigRequest {
    domain_id: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DomainConfigResponse {
    domain_list: Vec<DomainConfigInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct UpdateDomainStatusRequest<'a> {
    domain_id: &'a str,
    status: &'a str,
    is_dcdn: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct UpdateHttpsRequest<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    region: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    zone: &'a str,
    #[serde(rename = "Areacode")]
    area_code: &'a str,
    domain_id: &'a str,
    https_status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cert_name: Option<&'a str>,
}

/// Domain API accessor
pub struct DomainsApi<'a> {
    client: &'a Client,
}

impl<'a> DomainsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Create a domain and wait until it leaves the provisioning states.
    /// Returns the new domain id.
    pub async fn create(&self, config: &CreateDomainConfig) -> Result<String, ApiError> {
        let request = DomainListRequest {
            domain_list: vec![config.clone()],
        };
        let response: CreateDomainResponse = self.client.call(CREATE_DOMAIN, &request).await?;

        let created = response
            .domain_list
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Decode(format!("{CREATE_DOMAIN}: empty DomainList")))?;
        if created.ret_code != 0 {
            return Err(ApiError::Rejected {
                action: CREATE_DOMAIN.to_string(),
                code: created.ret_code,
                message: created.message,
            });
        }

        tracing::info!("Created CDN domain {} ({})", created.domain, created.domain_id);

        let status = self
            .wait_for_status(
                &created.domain_id,
                &[DomainStatus::Enable, DomainStatus::CheckFail],
            )
            .await?;
        if status == DomainStatus::CheckFail {
            return Err(ApiError::CheckFailed(created.domain_id));
        }

        Ok(created.domain_id)
    }

    /// Update a domain's configuration and wait for it to be enabled again.
    pub async fn update(&self, config: &UpdateDomainConfig) -> Result<(), ApiError> {
        if config.domain_id.is_empty() {
            return Err(ApiError::InvalidRequest(
                "domain update without a DomainId".to_string(),
            ));
        }

        let request = DomainListRequest {
            domain_list: vec![config.clone()],
        };
        self.client
            .call::<_, NoData>(UPDATE_DOMAIN, &request)
            .await?;

        self.wait_for_status(&config.domain_id, &[DomainStatus::Enable])
            .await?;
        Ok(())
    }

    /// Returns the id of the created or updated domain.
    pub async fn create_or_update(&self, change: &DomainChange) -> Result<String, ApiError> {
        match change {
            DomainChange::Create(config) => self.create(config).await,
            DomainChange::Update(config) => {
                self.update(config).await?;
                Ok(config.domain_id.clone())
            }
        }
    }

    /// `None` when the service no longer knows the domain.
    pub async fn get_config(&self, domain_id: &str) -> Result<Option<DomainConfigInfo>, ApiError> {
        let request = GetDomainConfigRequest {
            domain_id: vec![domain_id.to_string()],
        };
        let response: DomainConfigResponse = self.client.call(GET_DOMAIN_CONFIG, &request).await?;
        Ok(response.domain_list.into_iter().next())
    }

    /// Poll the domain until its status is one of `targets`. An empty
    /// config list counts as [`DomainStatus::Delete`].
    pub async fn wait_for_status(
        &self,
        domain_id: &str,
        targets: &[DomainStatus],
    ) -> Result<DomainStatus, ApiError> {
        let request = GetDomainConfigRequest {
            domain_id: vec![domain_id.to_string()],
        };
        let client = self.client;
        let request = &request;
        let retrier = client.retrier(&client.options().polling_policy);

        tracing::debug!("Waiting for domain {} to reach {:?}", domain_id, targets);

        let result = reconcile::wait_for_status(&retrier, targets, move || async move {
            let response = client
                .invoke::<_, DomainConfigResponse>(GET_DOMAIN_CONFIG, request)
                .await;
            classify(response.map(|body| match body.domain_list.into_iter().next() {
                Some(config) => Observation::Present(config.status),
                None => Observation::Absent,
            }))
        })
        .await;

        result.map_err(|err| match err {
            WaitError::Fetch(err) => err,
            WaitError::NotConverged {
                expected,
                last_observed,
                attempts,
            } => {
                tracing::warn!(
                    "Domain {} did not reach {:?} after {} checks",
                    domain_id,
                    expected,
                    attempts
                );
                ApiError::ConvergenceTimeout {
                    domain_id: domain_id.to_string(),
                    expected: expected.iter().map(|s| s.to_string()).collect(),
                    last_observed: last_observed.map(|observed| match observed {
                        Observation::Present(status) => status.to_string(),
                        Observation::Absent => "absent".to_string(),
                    }),
                }
            }
            WaitError::Cancelled => ApiError::Cancelled,
        })
    }

    /// Enable or disable HTTPS for every area the domain is served in.
    ///
    /// Areas are updated one at a time, each followed by a wait for `enable`.
    /// The first failure is returned as-is; areas already updated are not
    /// reverted.
    pub async fn update_https(
        &self,
        domain_id: &str,
        enable: bool,
        cert_name: &str,
    ) -> Result<(), ApiError> {
        if enable && cert_name.is_empty() {
            return Err(ApiError::InvalidRequest(
                "enabling HTTPS requires a certificate name".to_string(),
            ));
        }

        let config = self
            .get_config(domain_id)
            .await?
            .ok_or_else(|| ApiError::EmptyConfig(domain_id.to_string()))?;

        for area in expand_area_code(&config.area_code) {
            let request = UpdateHttpsRequest {
                region: self.client.region(),
                zone: self.client.zone(),
                area_code: area,
                domain_id,
                https_status: enable_flag(enable),
                cert_name: enable.then_some(cert_name),
            };

            tracing::debug!(
                "Setting HTTPS {} for domain {} in area {}",
                request.https_status,
                domain_id,
                area
            );
            self.client.call::<_, NoData>(UPDATE_HTTPS, &request).await?;
            self.wait_for_status(domain_id, &[DomainStatus::Enable])
                .await?;
        }

        Ok(())
    }

    /// Mark the domain deleted and wait until the service drops it.
    pub async fn delete(&self, domain_id: &str) -> Result<(), ApiError> {
        let request = UpdateDomainStatusRequest {
            domain_id,
            status: DomainStatus::Delete.as_str(),
            is_dcdn: false,
        };
        self.client
            .call::<_, NoData>(UPDATE_DOMAIN_STATUS, &request)
            .await?;

        self.wait_for_status(domain_id, &[DomainStatus::Delete])
            .await?;
        tracing::info!("Deleted CDN domain {}", domain_id);
        Ok(())
    }
}
