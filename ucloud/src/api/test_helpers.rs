//! Test helpers for the UCloud API

use std::time::Duration;

use super::{Client, ClientOptions};
use crate::config::ProviderConfig;
use crate::retry::RetryPolicy;

pub fn test_config(url: &str) -> ProviderConfig {
    ProviderConfig {
        region: "cn-bj2".to_string(),
        zone: "cn-bj2-02".to_string(),
        project_id: "org-test".to_string(),
        public_key: "test-public-key".to_string(),
        private_key: "test-private-key".to_string(),
        base_url: url.to_string(),
    }
}

/// Millisecond backoff so retry and polling tests finish quickly.
pub fn fast_options() -> ClientOptions {
    let policy = RetryPolicy::default()
        .with_initial_interval(Duration::from_millis(5))
        .with_max_interval(Duration::from_millis(20))
        .with_max_elapsed_time(Some(Duration::from_millis(300)));

    ClientOptions {
        mutation_policy: policy.clone(),
        polling_policy: policy,
        request_timeout: Duration::from_secs(5),
        ..ClientOptions::default()
    }
}

pub fn create_test_client(url: &str) -> Client {
    Client::with_options(&test_config(url), fast_options()).unwrap()
}
