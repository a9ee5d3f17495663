use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::common::ResponseStatus;
use super::error::{classify, ApiError};
use super::sign::{flatten_params, sign, SIGNATURE_PARAM};
use crate::config::ProviderConfig;
use crate::pagination::{Paginator, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE};
use crate::retry::{Retrier, RetryPolicy};

pub const DEFAULT_ENDPOINT: &str = "https://api.ucloud.cn";

/// Timing and paging knobs for a [`Client`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Applied to every single API call.
    pub mutation_policy: RetryPolicy,
    /// Applied to status polling after a mutation.
    pub polling_policy: RetryPolicy,
    pub page_size: usize,
    pub max_pages: usize,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            mutation_policy: RetryPolicy::mutation(),
            polling_policy: RetryPolicy::polling(),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// UCloud API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
    cancel: Option<CancellationToken>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    public_key: String,
    private_key: String,
    project_id: String,
    region: String,
    zone: String,
    options: ClientOptions,
}

impl Client {
    /// Create a new API client with default options
    pub fn new(config: &ProviderConfig) -> Result<Self, ApiError> {
        Self::with_options(config, ClientOptions::default())
    }

    pub fn with_options(config: &ProviderConfig, options: ClientOptions) -> Result<Self, ApiError> {
        url::Url::parse(&config.base_url).map_err(|e| {
            ApiError::InvalidRequest(format!("invalid endpoint {}: {}", config.base_url, e))
        })?;

        let http_client = reqwest::ClientBuilder::new()
            .timeout(options.request_timeout)
            .connect_timeout(options.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                public_key: config.public_key.clone(),
                private_key: config.private_key.clone(),
                project_id: config.project_id.clone(),
                region: config.region.clone(),
                zone: config.zone.clone(),
                options,
            }),
            cancel: None,
        })
    }

    /// A handle whose retry loops stop when `token` is cancelled.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cancel: Some(token),
        }
    }

    pub fn region(&self) -> &str {
        &self.inner.region
    }

    pub fn zone(&self) -> &str {
        &self.inner.zone
    }

    pub fn project_id(&self) -> &str {
        &self.inner.project_id
    }

    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }

    /// CDN domain operations
    pub fn domains(&self) -> crate::api::domain::DomainsApi<'_> {
        crate::api::domain::DomainsApi::new(self)
    }

    /// SSL certificate operations
    pub fn certificates(&self) -> crate::api::certificate::CertificatesApi<'_> {
        crate::api::certificate::CertificatesApi::new(self)
    }

    pub(crate) fn retrier(&self, policy: &RetryPolicy) -> Retrier {
        let retrier = Retrier::new(policy.clone());
        match &self.cancel {
            Some(token) => retrier.with_cancellation(token.clone()),
            None => retrier,
        }
    }

    pub(crate) fn paginator(&self) -> Paginator {
        Paginator::new(self.inner.options.page_size).max_pages(self.inner.options.max_pages)
    }

    /// Invoke `action` under the mutation retry policy.
    ///
    /// Throttling codes, transport failures and 429/5xx responses are retried;
    /// any other non-zero `RetCode` is returned at once.
    pub async fn call<Req, T>(&self, action: &str, request: &Req) -> Result<T, ApiError>
    where
        Req: Serialize,
        T: DeserializeOwned,
    {
        self.retrier(&self.inner.options.mutation_policy)
            .run(move || async move { classify(self.invoke(action, request).await) })
            .await
            .map_err(|e| ApiError::from_retry(action, e))
    }

    /// Invoke `action` exactly once.
    pub async fn invoke<Req, T>(&self, action: &str, request: &Req) -> Result<T, ApiError>
    where
        Req: Serialize,
        T: DeserializeOwned,
    {
        let params = self.signed_params(action, request)?;

        tracing::debug!("POST {} to: {}", action, self.inner.base_url);

        let response = self
            .inner
            .http_client
            .post(&self.inner.base_url)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!("{} returned HTTP {}: {}", action, status, body);
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let ret: ResponseStatus = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse {} response: {}", action, e);
            ApiError::Decode(format!("{action}: {e}"))
        })?;

        if ret.ret_code != 0 {
            let err = ApiError::from_ret_code(action, ret.ret_code, ret.message);
            if matches!(err, ApiError::Throttled { .. }) {
                tracing::warn!("{}", err);
            } else {
                tracing::error!("{}", err);
            }
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse {} response: {}", action, e);
            ApiError::Decode(format!("{action}: {e}"))
        })
    }

    fn signed_params<Req: Serialize>(
        &self,
        action: &str,
        request: &Req,
    ) -> Result<BTreeMap<String, String>, ApiError> {
        let value = serde_json::to_value(request)
            .map_err(|e| ApiError::InvalidRequest(format!("{action}: {e}")))?;
        if !(value.is_object() || value.is_null()) {
            return Err(ApiError::InvalidRequest(format!(
                "{action}: request must serialize to an object"
            )));
        }

        let mut params = flatten_params(&value);
        params.insert("Action".to_string(), action.to_string());
        params.insert("PublicKey".to_string(), self.inner.public_key.clone());
        if !self.inner.project_id.is_empty() {
            params
                .entry("ProjectId".to_string())
                .or_insert_with(|| self.inner.project_id.clone());
        }

        let signature = sign(&params, &self.inner.private_key);
        params.insert(SIGNATURE_PARAM.to_string(), signature);
        Ok(params)
    }
}
