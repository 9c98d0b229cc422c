use crate::config::types::Config;
use crate::ConfigError;
use url::Url;

/// Validates a configuration before any side effect happens.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let url = Url::parse(&config.url).map_err(|e| {
        ConfigError::Validation(format!("invalid url {:?}: {}", config.url, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "url must be http or https, got {:?}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::Validation("url is missing a host".to_string()));
    }

    if config.dir.is_empty() {
        return Err(ConfigError::Validation("dir cannot be empty".to_string()));
    }

    if config.concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be >= 1, got {}",
            config.concurrency
        )));
    }

    if config.resource_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "resource_timeout must be >= 1 second, got {}",
            config.resource_timeout
        )));
    }

    Ok(())
}
