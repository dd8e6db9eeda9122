//! Integration tests for the configuration system.

use std::time::Duration;

use shopify_sync::config::{
    DEFAULT_DEFER_DELAY, DEFAULT_GRAPHQL_BUDGET_CAP, DEFAULT_GRAPHQL_HARD_CAP,
    DEFAULT_GRAPHQL_PAGE_SIZE, DEFAULT_MAX_RETRIES, DEFAULT_REST_PAGE_SIZE, DEFAULT_REST_TRIES,
};
use shopify_sync::sync::SyncEngine;
use shopify_sync::{AccessToken, ApiVersion, ConfigError, HostUrl, ShopDomain, SyncConfig};

fn required() -> shopify_sync::SyncConfigBuilder {
    SyncConfig::builder()
        .shop(ShopDomain::new("my-store").unwrap())
        .access_token(AccessToken::new("shpat_123").unwrap())
}

#[test]
fn test_full_workflow_create_newtypes_build_config_access_fields() {
    let host = HostUrl::new("https://proxy.example.com").unwrap();

    let config = required()
        .host(host)
        .api_version(ApiVersion::V2025_07)
        .user_agent_prefix("Sheets/2.1")
        .max_retries(3)
        .graphql_budget_cap(800.0)
        .graphql_page_size(100)
        .graphql_hard_cap(200)
        .rest_page_size(100)
        .rest_tries(4)
        .defer_delay(Duration::from_secs(1))
        .build()
        .unwrap();

    assert_eq!(config.shop().as_ref(), "my-store.myshopify.com");
    assert_eq!(config.access_token().as_ref(), "shpat_123");
    assert_eq!(config.host().unwrap().origin(), "https://proxy.example.com");
    assert_eq!(config.api_version(), &ApiVersion::V2025_07);
    assert_eq!(config.user_agent_prefix(), Some("Sheets/2.1"));
    assert_eq!(config.max_retries(), 3);
    assert!((config.graphql_budget_cap() - 800.0).abs() < f64::EPSILON);
    assert_eq!(config.graphql_page_size(), 100);
    assert_eq!(config.graphql_hard_cap(), 200);
    assert_eq!(config.rest_page_size(), 100);
    assert_eq!(config.rest_tries(), 4);
    assert_eq!(config.defer_delay(), Duration::from_secs(1));
}

#[test]
fn test_defaults_apply_when_unset() {
    let config = required().build().unwrap();

    assert!(config.host().is_none());
    assert_eq!(config.api_version(), &ApiVersion::latest());
    assert_eq!(config.max_retries(), DEFAULT_MAX_RETRIES);
    assert!((config.graphql_budget_cap() - DEFAULT_GRAPHQL_BUDGET_CAP).abs() < f64::EPSILON);
    assert_eq!(config.graphql_page_size(), DEFAULT_GRAPHQL_PAGE_SIZE);
    assert_eq!(config.graphql_hard_cap(), DEFAULT_GRAPHQL_HARD_CAP);
    assert_eq!(config.rest_page_size(), DEFAULT_REST_PAGE_SIZE);
    assert_eq!(config.rest_tries(), DEFAULT_REST_TRIES);
    assert_eq!(config.defer_delay(), DEFAULT_DEFER_DELAY);
}

#[test]
fn test_missing_required_fields_are_reported() {
    let result = SyncConfig::builder()
        .access_token(AccessToken::new("shpat_123").unwrap())
        .build();
    assert!(matches!(
        result,
        Err(ConfigError::MissingRequiredField { field: "shop" })
    ));

    let result = SyncConfig::builder()
        .shop(ShopDomain::new("my-store").unwrap())
        .build();
    assert!(matches!(
        result,
        Err(ConfigError::MissingRequiredField {
            field: "access_token"
        })
    ));
}

#[test]
fn test_invalid_sync_settings_are_rejected() {
    let cases = [
        (required().graphql_page_size(0).build(), "graphql_page_size"),
        (required().graphql_hard_cap(0).build(), "graphql_hard_cap"),
        (required().rest_page_size(0).build(), "rest_page_size"),
        (required().rest_tries(0).build(), "rest_tries"),
        (required().graphql_budget_cap(0.0).build(), "graphql_budget_cap"),
        (required().graphql_budget_cap(f64::NAN).build(), "graphql_budget_cap"),
        (
            required().graphql_page_size(300).graphql_hard_cap(250).build(),
            "graphql_page_size",
        ),
    ];

    for (result, expected) in cases {
        match result {
            Err(ConfigError::InvalidSetting { setting, .. }) => assert_eq!(setting, expected),
            other => panic!("expected {expected} to be rejected, got {other:?}"),
        }
    }
}

#[test]
fn test_invalid_newtypes_are_rejected() {
    assert!(matches!(
        AccessToken::new(""),
        Err(ConfigError::EmptyAccessToken)
    ));
    assert!(matches!(
        ShopDomain::new("not a shop"),
        Err(ConfigError::InvalidShopDomain { .. })
    ));
    assert!(matches!(
        HostUrl::new("proxy.example.com"),
        Err(ConfigError::InvalidHostUrl { .. })
    ));
    assert!(matches!(
        "2025-13".parse::<ApiVersion>(),
        Err(ConfigError::InvalidApiVersion { .. })
    ));
}

#[test]
fn test_config_error_messages_are_helpful() {
    let error = ConfigError::MissingRequiredField { field: "shop" };
    assert!(error.to_string().contains("'shop'"));

    let error = ConfigError::InvalidSetting {
        setting: "rest_tries",
        reason: "must be greater than zero".to_string(),
    };
    assert_eq!(
        error.to_string(),
        "Invalid sync setting 'rest_tries': must be greater than zero"
    );
}

#[test]
fn test_engine_builds_from_config() {
    let config = required().build().unwrap();
    let engine = SyncEngine::new(&config);

    assert_eq!(engine.graphql().api_version(), &ApiVersion::latest());
    assert_eq!(engine.graphql().max_retries(), DEFAULT_MAX_RETRIES);
    assert_eq!(engine.rest().tries(), DEFAULT_REST_TRIES);
}

#[test]
fn test_public_types_are_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SyncConfig>();
    assert_send_sync::<SyncEngine>();
    assert_send_sync::<shopify_sync::GraphqlClient>();
    assert_send_sync::<shopify_sync::RestClient>();
}
