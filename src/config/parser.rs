use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigResult;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use mailcrawl::config::load_config;
///
/// let config = load_config(Path::new("mailcrawl.toml")).unwrap();
/// println!("Max pages: {}", config.crawler.max_pages);
/// ```
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Config> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads the configuration file if one was given, otherwise the defaults
pub fn load_config_or_default(path: Option<&Path>) -> ConfigResult<Config> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = Config::default();
            validate(&config)?;
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WaitUntil;
    use crate::ConfigError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[crawler]
max-depth = 2
max-pages = 20
same-domain-only = false

[fetch]
timeout-ms = 5000
wait-until = "networkidle"
use-browser = true

[user-agent]
crawler-name = "TestCrawler"
crawler-version = "1.0"
contact-url = "https://example.com/about"

[browser]
executable = "/usr/bin/chromium"
headless = false
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_depth, 2);
        assert_eq!(config.crawler.max_pages, 20);
        assert!(!config.crawler.same_domain_only);
        assert_eq!(config.fetch.timeout_ms, 5000);
        assert_eq!(config.fetch.wait_until, WaitUntil::NetworkIdle);
        assert!(config.fetch.use_browser);
        assert_eq!(config.user_agent.crawler_name, "TestCrawler");
        assert!(!config.browser.headless);
        assert_eq!(
            config.browser.executable.as_deref(),
            Some(Path::new("/usr/bin/chromium"))
        );
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = parse_config("[crawler]\nmax-pages = 5\n").unwrap();

        assert_eq!(config.crawler.max_pages, 5);
        assert_eq!(config.crawler.max_depth, 3);
        assert!(config.crawler.same_domain_only);
        assert_eq!(config.fetch.timeout_ms, 30_000);
        assert_eq!(config.fetch.wait_until, WaitUntil::Load);
        assert!(!config.fetch.use_browser);
        assert!(config.browser.headless);
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config.crawler.max_pages, 50);
        assert_eq!(config.user_agent.crawler_name, "mailcrawl");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/mailcrawl.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_wait_condition_rejected() {
        let result = parse_config("[fetch]\nwait-until = \"whenever\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config("[crawler]\nmax-pages = 0\n");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_config_or_default_without_path() {
        let config = load_config_or_default(None).unwrap();
        assert_eq!(config.crawler.max_depth, 3);
    }
}
