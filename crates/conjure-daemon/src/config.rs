use conjure_generator::GeneratorConfig;
use serde::Deserialize;
use std::path::PathBuf;

/// Top-level daemon configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_socket_path")]
    pub socket_path: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct ContextConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_query_timeout")]
    pub query_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_dir")]
    pub path: String,
}

fn default_socket_path() -> String {
    "/tmp/conjure.sock".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_query_timeout() -> u64 {
    1500
}

fn default_history_dir() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    format!("{home}/.local/share/conjure")
}

fn default_true() -> bool {
    true
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            query_timeout_ms: default_query_timeout(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: default_history_dir(),
        }
    }
}

impl Config {
    /// Load config from the default path (~/.config/conjure/config.toml).
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(format!("{home}/.config/conjure/config.toml"))
    }

    pub fn pid_path() -> PathBuf {
        PathBuf::from("/tmp/conjure.pid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.daemon.socket_path, "/tmp/conjure.sock");
        assert!(config.context.enabled);
        assert_eq!(config.context.query_timeout_ms, 1500);
        assert!(config.generator.api_key.is_none());
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[daemon]
socket_path = "/tmp/test.sock"
log_level = "debug"

[generator]
api_key = "sk-test"
model = "claude-haiku-4-5-20251001"
timeout_ms = 10000

[context]
enabled = false

[history]
path = "/tmp/conjure-test"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.daemon.socket_path, "/tmp/test.sock");
        assert_eq!(config.generator.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.generator.timeout_ms, 10_000);
        assert_eq!(config.generator.max_tokens, 256);
        assert!(!config.context.enabled);
        assert_eq!(config.history.path, "/tmp/conjure-test");
    }
}
