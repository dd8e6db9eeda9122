//! Configuration types for the sync engine.
//!
//! - [`SyncConfig`]: connection settings plus the numeric knobs of the
//!   throttle model and run controllers
//! - [`SyncConfigBuilder`]: fluent builder with fail-fast validation
//! - [`AccessToken`], [`ShopDomain`], [`HostUrl`]: validated newtypes
//! - [`ApiVersion`]: the Admin API version to target
//!
//! # Example
//!
//! ```rust
//! use shopify_sync::{AccessToken, ApiVersion, ShopDomain, SyncConfig};
//!
//! let config = SyncConfig::builder()
//!     .shop(ShopDomain::new("my-store").unwrap())
//!     .access_token(AccessToken::new("shpat_123").unwrap())
//!     .api_version(ApiVersion::V2025_07)
//!     .graphql_page_size(100)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.max_retries(), 5);
//! assert_eq!(config.graphql_page_size(), 100);
//! ```

mod newtypes;
mod version;

pub use newtypes::{AccessToken, HostUrl, ShopDomain};
pub use version::ApiVersion;

use std::time::Duration;

use crate::error::ConfigError;

/// Default ceiling of the Retry Coordinator.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default `globalBudgetCap`: the single-query cost ceiling of the Admin API.
pub const DEFAULT_GRAPHQL_BUDGET_CAP: f64 = 1000.0;

/// Default page size of a fresh (unlocked) GraphQL run.
pub const DEFAULT_GRAPHQL_PAGE_SIZE: u32 = 50;

/// Largest `first:` argument accepted by GraphQL connections.
pub const DEFAULT_GRAPHQL_HARD_CAP: u32 = 250;

/// Largest `limit` accepted by REST list endpoints.
pub const DEFAULT_REST_PAGE_SIZE: u32 = 250;

/// Default transport-level tries for REST 429/500 responses.
pub const DEFAULT_REST_TRIES: u32 = 3;

/// Fixed admission defer used when the bucket is not full.
pub const DEFAULT_DEFER_DELAY: Duration = Duration::from_millis(3000);

/// Connection and throttle settings for a sync job.
///
/// `SyncConfig` is `Clone + Send + Sync`; one value is typically shared by every
/// invocation of a job.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    shop: ShopDomain,
    access_token: AccessToken,
    host: Option<HostUrl>,
    api_version: ApiVersion,
    user_agent_prefix: Option<String>,
    max_retries: u32,
    graphql_budget_cap: f64,
    graphql_page_size: u32,
    graphql_hard_cap: u32,
    rest_page_size: u32,
    rest_tries: u32,
    defer_delay: Duration,
}

impl SyncConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::new()
    }

    /// Returns the shop domain.
    #[must_use]
    pub const fn shop(&self) -> &ShopDomain {
        &self.shop
    }

    /// Returns the access token.
    #[must_use]
    pub const fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// Returns the origin override, if configured.
    #[must_use]
    pub const fn host(&self) -> Option<&HostUrl> {
        self.host.as_ref()
    }

    /// Returns the API version.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns the maximum number of GraphQL retries per logical request.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the cost ceiling used when sizing locked runs.
    #[must_use]
    pub const fn graphql_budget_cap(&self) -> f64 {
        self.graphql_budget_cap
    }

    /// Returns the page size of a fresh GraphQL run.
    #[must_use]
    pub const fn graphql_page_size(&self) -> u32 {
        self.graphql_page_size
    }

    /// Returns the upper bound for any GraphQL page size.
    #[must_use]
    pub const fn graphql_hard_cap(&self) -> u32 {
        self.graphql_hard_cap
    }

    /// Returns the REST `limit` used for first pages.
    #[must_use]
    pub const fn rest_page_size(&self) -> u32 {
        self.rest_page_size
    }

    /// Returns the transport-level tries for REST requests.
    #[must_use]
    pub const fn rest_tries(&self) -> u32 {
        self.rest_tries
    }

    /// Returns the fixed admission defer.
    #[must_use]
    pub const fn defer_delay(&self) -> Duration {
        self.defer_delay
    }
}

// Verify SyncConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SyncConfig>();
};

/// Builder for [`SyncConfig`].
///
/// `shop` and `access_token` are required; everything else has a default
/// (see the `DEFAULT_*` constants in this module).
#[derive(Debug, Default)]
pub struct SyncConfigBuilder {
    shop: Option<ShopDomain>,
    access_token: Option<AccessToken>,
    host: Option<HostUrl>,
    api_version: Option<ApiVersion>,
    user_agent_prefix: Option<String>,
    max_retries: Option<u32>,
    graphql_budget_cap: Option<f64>,
    graphql_page_size: Option<u32>,
    graphql_hard_cap: Option<u32>,
    rest_page_size: Option<u32>,
    rest_tries: Option<u32>,
    defer_delay: Option<Duration>,
}

impl SyncConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the shop domain (required).
    #[must_use]
    pub fn shop(mut self, shop: ShopDomain) -> Self {
        self.shop = Some(shop);
        self
    }

    /// Sets the access token (required).
    #[must_use]
    pub fn access_token(mut self, token: AccessToken) -> Self {
        self.access_token = Some(token);
        self
    }

    /// Sends requests to this origin instead of `https://{shop}`.
    #[must_use]
    pub fn host(mut self, host: HostUrl) -> Self {
        self.host = Some(host);
        self
    }

    /// Sets the API version.
    #[must_use]
    pub fn api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Sets the user agent prefix.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Sets the GraphQL retry ceiling.
    #[must_use]
    pub const fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Sets the cost ceiling used when sizing locked runs.
    #[must_use]
    pub const fn graphql_budget_cap(mut self, cap: f64) -> Self {
        self.graphql_budget_cap = Some(cap);
        self
    }

    /// Sets the page size of a fresh GraphQL run.
    #[must_use]
    pub const fn graphql_page_size(mut self, size: u32) -> Self {
        self.graphql_page_size = Some(size);
        self
    }

    /// Sets the upper bound for any GraphQL page size.
    #[must_use]
    pub const fn graphql_hard_cap(mut self, cap: u32) -> Self {
        self.graphql_hard_cap = Some(cap);
        self
    }

    /// Sets the REST `limit` used for first pages.
    #[must_use]
    pub const fn rest_page_size(mut self, size: u32) -> Self {
        self.rest_page_size = Some(size);
        self
    }

    /// Sets the transport-level tries for REST requests.
    #[must_use]
    pub const fn rest_tries(mut self, tries: u32) -> Self {
        self.rest_tries = Some(tries);
        self
    }

    /// Sets the fixed admission defer.
    #[must_use]
    pub const fn defer_delay(mut self, delay: Duration) -> Self {
        self.defer_delay = Some(delay);
        self
    }

    /// Builds the [`SyncConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `shop` or
    /// `access_token` is not set, and [`ConfigError::InvalidSetting`] for
    /// zero page sizes, caps or tries, or a non-positive budget cap.
    pub fn build(self) -> Result<SyncConfig, ConfigError> {
        let shop = self
            .shop
            .ok_or(ConfigError::MissingRequiredField { field: "shop" })?;
        let access_token = self
            .access_token
            .ok_or(ConfigError::MissingRequiredField {
                field: "access_token",
            })?;

        let graphql_hard_cap = positive("graphql_hard_cap", self.graphql_hard_cap, DEFAULT_GRAPHQL_HARD_CAP)?;
        let graphql_page_size =
            positive("graphql_page_size", self.graphql_page_size, DEFAULT_GRAPHQL_PAGE_SIZE)?;
        if graphql_page_size > graphql_hard_cap {
            return Err(ConfigError::InvalidSetting {
                setting: "graphql_page_size",
                reason: format!("must not exceed graphql_hard_cap ({graphql_hard_cap})"),
            });
        }

        let graphql_budget_cap = self.graphql_budget_cap.unwrap_or(DEFAULT_GRAPHQL_BUDGET_CAP);
        if !(graphql_budget_cap.is_finite() && graphql_budget_cap > 0.0) {
            return Err(ConfigError::InvalidSetting {
                setting: "graphql_budget_cap",
                reason: "must be a positive number".to_string(),
            });
        }

        Ok(SyncConfig {
            shop,
            access_token,
            host: self.host,
            api_version: self.api_version.unwrap_or_else(ApiVersion::latest),
            user_agent_prefix: self.user_agent_prefix,
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            graphql_budget_cap,
            graphql_page_size,
            graphql_hard_cap,
            rest_page_size: positive("rest_page_size", self.rest_page_size, DEFAULT_REST_PAGE_SIZE)?,
            rest_tries: positive("rest_tries", self.rest_tries, DEFAULT_REST_TRIES)?,
            defer_delay: self.defer_delay.unwrap_or(DEFAULT_DEFER_DELAY),
        })
    }
}

fn positive(setting: &'static str, value: Option<u32>, default: u32) -> Result<u32, ConfigError> {
    match value {
        Some(0) => Err(ConfigError::InvalidSetting {
            setting,
            reason: "must be greater than zero".to_string(),
        }),
        Some(v) => Ok(v),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_builder() -> SyncConfigBuilder {
        SyncConfig::builder()
            .shop(ShopDomain::new("test-shop").unwrap())
            .access_token(AccessToken::new("test-token").unwrap())
    }

    #[test]
    fn test_builder_requires_shop() {
        let result = SyncConfigBuilder::new()
            .access_token(AccessToken::new("token").unwrap())
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField { field: "shop" })
        ));
    }

    #[test]
    fn test_builder_requires_access_token() {
        let result = SyncConfigBuilder::new()
            .shop(ShopDomain::new("test-shop").unwrap())
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField {
                field: "access_token"
            })
        ));
    }

    #[test]
    fn test_builder_provides_sensible_defaults() {
        let config = base_builder().build().unwrap();

        assert_eq!(config.api_version(), &ApiVersion::latest());
        assert!(config.host().is_none());
        assert_eq!(config.max_retries(), DEFAULT_MAX_RETRIES);
        assert!((config.graphql_budget_cap() - 1000.0).abs() < f64::EPSILON);
        assert_eq!(config.graphql_page_size(), 50);
        assert_eq!(config.graphql_hard_cap(), 250);
        assert_eq!(config.rest_page_size(), 250);
        assert_eq!(config.defer_delay(), Duration::from_millis(3000));
    }

    #[test]
    fn test_builder_rejects_zero_page_size() {
        let result = base_builder().graphql_page_size(0).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidSetting {
                setting: "graphql_page_size",
                ..
            })
        ));
    }

    #[test]
    fn test_builder_rejects_page_size_above_hard_cap() {
        let result = base_builder()
            .graphql_hard_cap(100)
            .graphql_page_size(150)
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidSetting { .. })));
    }

    #[test]
    fn test_builder_rejects_non_positive_budget() {
        let result = base_builder().graphql_budget_cap(0.0).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidSetting {
                setting: "graphql_budget_cap",
                ..
            })
        ));
    }

    #[test]
    fn test_config_debug_masks_token() {
        let config = base_builder().build().unwrap();
        let debug_str = format!("{config:?}");
        assert!(debug_str.contains("SyncConfig"));
        assert!(!debug_str.contains("test-token"));
    }
}
