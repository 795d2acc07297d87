use crate::config::types::{CacheConfig, Config, FetcherConfig, OutputConfig, ServerConfig, SiteRules};
use crate::crawler::{Locator, NodePath};
use crate::ConfigError;
use scraper::Selector;
use std::net::SocketAddr;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_server_config(&config.server)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_cache_config(&config.cache)?;
    validate_output_config(&config.output)?;
    validate_site_rules(&config.site)?;
    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    config.bind_address.parse::<SocketAddr>().map_err(|e| {
        ConfigError::Validation(format!(
            "bind_address '{}' is not a socket address: {}",
            config.bind_address, e
        ))
    })?;

    if config.api_token.trim().is_empty() {
        return Err(ConfigError::Validation(
            "api_token cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if !config.base_url.ends_with('/') {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must end with '/'",
            config.base_url
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.timeout_step_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_step_secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.capacity < 1 {
        return Err(ConfigError::Validation(
            "cache capacity must be >= 1".to_string(),
        ));
    }

    if config.ttl_secs < 1 {
        return Err(ConfigError::Validation(
            "cache ttl_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.log_path.is_empty() {
        return Err(ConfigError::Validation(
            "log_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates that every selector and locator in the rule set parses
fn validate_site_rules(rules: &SiteRules) -> Result<(), ConfigError> {
    Selector::parse(&rules.container).map_err(|_| {
        ConfigError::InvalidPattern(format!("container selector '{}'", rules.container))
    })?;

    NodePath::parse(&rules.card_path).map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;

    let chains = [
        ("image", &rules.fields.image),
        ("short-title", &rules.fields.short_title),
        ("product-url", &rules.fields.product_url),
        ("price", &rules.fields.price),
    ];

    for (field, chain) in chains {
        if chain.is_empty() {
            return Err(ConfigError::InvalidPattern(format!(
                "field '{}' needs at least one locator",
                field
            )));
        }

        for locator in chain {
            Locator::parse(locator).map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;
        }
    }

    Ok(())
}
