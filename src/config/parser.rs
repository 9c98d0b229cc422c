use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and validates a configuration file from the given path.
///
/// Keys absent from the file take their documented defaults. A missing
/// file is an error: the generator refuses to run outside a configured
/// project directory.
///
/// # Example
///
/// ```no_run
/// use staticgen::config;
///
/// let config = config::load(config::DEFAULT_PATH).unwrap();
/// println!("Crawling {}", config.url);
/// ```
pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let file = create_temp_config(
            r#"{
                "url": "http://localhost:8080",
                "dir": "out",
                "command": "npm start",
                "pages": ["/404.html"],
                "concurrency": 4,
                "allow_404": true,
                "resource_timeout": 30
            }"#,
        );

        let config = load(file.path()).unwrap();
        assert_eq!(config.url, "http://localhost:8080");
        assert_eq!(config.dir, "out");
        assert_eq!(config.command, "npm start");
        assert_eq!(config.pages, vec!["/404.html".to_string()]);
        assert_eq!(config.concurrency, 4);
        assert!(config.allow_404);
        assert_eq!(config.resource_timeout, 30);
    }

    #[test]
    fn test_load_empty_config_takes_defaults() {
        let file = create_temp_config("{}");

        let config = load(file.path()).unwrap();
        assert_eq!(config.url, "http://127.0.0.1:3000");
        assert_eq!(config.dir, "build");
        assert_eq!(config.command, "");
        assert!(config.pages.is_empty());
        assert_eq!(config.concurrency, 30);
        assert!(!config.allow_404);
        assert_eq!(config.resource_timeout, 10);
        assert!(!config.sniff_content_type);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load("/nonexistent/static.json");
        assert!(matches!(result.unwrap_err(), ConfigError::Io(_)));
    }

    #[test]
    fn test_load_invalid_json() {
        let file = create_temp_config("{ not json");
        let result = load(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_unknown_key_rejected() {
        let file = create_temp_config(r#"{"urll": "http://localhost"}"#);
        let result = load(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_invalid_url_rejected() {
        let file = create_temp_config(r#"{"url": "not a url"}"#);
        let result = load(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }
}
