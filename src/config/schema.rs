//! Configuration schema for rxdiskd
//!
//! Configuration is stored at `~/.config/rxdiskd/config.toml`

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// External device-management utility settings
    pub utility: UtilityConfig,

    /// General settings
    pub general: GeneralConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for the REST API
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Settings for invoking the external utility
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UtilityConfig {
    /// Path to the utility binary
    pub path: String,

    /// Run the utility under sudo
    pub sudo: bool,

    /// User to run the utility as (only used when sudo = true)
    pub sudo_user: String,

    /// Kill an invocation that runs longer than this many seconds
    pub timeout_secs: u64,
}

impl Default for UtilityConfig {
    fn default() -> Self {
        Self {
            path: "/sbin/rapiddisk".to_string(),
            sudo: true,
            sudo_user: "root".to_string(),
            timeout_secs: 30,
        }
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[server]"));
        assert!(toml.contains("[utility]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.utility.path, "/sbin/rapiddisk");
        assert!(config.utility.sudo);
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [utility]
            path = "/usr/local/sbin/rapiddisk"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.utility.path, "/usr/local/sbin/rapiddisk");
        assert_eq!(config.server.listen, "127.0.0.1:9090"); // default preserved
    }
}
