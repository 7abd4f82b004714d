use serde::{Deserialize, Serialize};

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Target database: a `sqlite:` URL or a plain file path.
    #[serde(default)]
    pub url: String,

    /// Create the database file when it does not exist yet.
    #[serde(default = "default_create_if_missing")]
    pub create_if_missing: bool,

    /// How long to wait on a locked database, in seconds.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            create_if_missing: default_create_if_missing(),
            busy_timeout_secs: default_busy_timeout(),
        }
    }
}

impl DatabaseConfig {
    /// Configuration pointing at `url` with every other setting defaulted.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

fn default_create_if_missing() -> bool {
    true
}

fn default_busy_timeout() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_database_config() {
        let config = DatabaseConfig::default();
        assert!(config.url.is_empty());
        assert!(config.create_if_missing);
        assert_eq!(config.busy_timeout_secs, 5);
    }

    #[test]
    fn test_parse_database_config() {
        let toml = r#"
            url = "sqlite://app.db"
            create_if_missing = false
        "#;

        let config: DatabaseConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.url, "sqlite://app.db");
        assert!(!config.create_if_missing);
        assert_eq!(config.busy_timeout_secs, 5);
    }
}
