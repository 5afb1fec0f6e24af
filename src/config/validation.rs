use crate::config::types::{BrowserConfig, Config, CrawlerConfig, FetchConfig, UserAgentConfig};
use crate::{ConfigError, ConfigResult};
use url::Url;

const MAX_PAGES_LIMIT: usize = 100_000;
const MAX_DEPTH_LIMIT: u32 = 100;
const MIN_TIMEOUT_MS: u64 = 100;
const MAX_TIMEOUT_MS: u64 = 600_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_browser_config(&config.browser)?;
    Ok(())
}

/// Validates crawl budget settings
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    if config.max_pages < 1 || config.max_pages > MAX_PAGES_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_pages must be between 1 and {}, got {}",
            MAX_PAGES_LIMIT, config.max_pages
        )));
    }

    if config.max_depth > MAX_DEPTH_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_depth must be <= {}, got {}",
            MAX_DEPTH_LIMIT, config.max_depth
        )));
    }

    Ok(())
}

/// Validates fetch settings
fn validate_fetch_config(config: &FetchConfig) -> ConfigResult<()> {
    if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&config.timeout_ms) {
        return Err(ConfigError::Validation(format!(
            "timeout_ms must be between {} and {}, got {}",
            MIN_TIMEOUT_MS, MAX_TIMEOUT_MS, config.timeout_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> ConfigResult<()> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

/// Validates browser discovery settings
fn validate_browser_config(config: &BrowserConfig) -> ConfigResult<()> {
    if let Some(executable) = &config.executable {
        if executable.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "browser executable cannot be an empty path".to_string(),
            ));
        }
    }

    if let Some(cache_dir) = &config.cache_dir {
        if cache_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "browser cache_dir cannot be an empty path".to_string(),
            ));
        }
    }

    Ok(())
}
