use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub metrics: MetricsConfig,
    pub console: ConsoleConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: IpAddr,
    pub port: u16,
    pub static_asset: PathBuf,
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            static_asset: PathBuf::from("index.html"),
            shutdown_grace_secs: 5,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub disk_mount: PathBuf,
    pub cpu_sample_ms: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            disk_mount: PathBuf::from("/"),
            cpu_sample_ms: 200,
        }
    }
}

impl MetricsConfig {
    pub fn cpu_sample_window(&self) -> Duration {
        Duration::from_millis(self.cpu_sample_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Treat a failed `status` command as fatal to the process.
    pub fail_fast: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        ConsoleConfig { fail_fast: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            json: false,
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("statuspro").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.server.socket_addr(),
            "0.0.0.0:8080".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.server.static_asset, PathBuf::from("index.html"));
        assert_eq!(config.server.shutdown_grace(), Duration::from_secs(5));
        assert_eq!(config.metrics.disk_mount, PathBuf::from("/"));
        assert_eq!(config.metrics.cpu_sample_window(), Duration::from_millis(200));
        assert!(config.console.fail_fast);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn parse_partial_toml() {
        let toml_str = r#"
[server]
port = 9090
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9090);
        // Other fields should be defaults
        assert_eq!(config.server.shutdown_grace_secs, 5);
        assert_eq!(config.metrics.disk_mount, PathBuf::from("/"));
        assert!(config.console.fail_fast);
    }

    #[test]
    fn parse_full_toml() {
        let toml_str = r#"
[server]
bind_address = "127.0.0.1"
port = 3000
static_asset = "public/index.html"
shutdown_grace_secs = 2

[metrics]
disk_mount = "/var"
cpu_sample_ms = 500

[console]
fail_fast = false

[logging]
level = "debug"
json = true
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.server.socket_addr(),
            "127.0.0.1:3000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            config.server.static_asset,
            PathBuf::from("public/index.html")
        );
        assert_eq!(config.server.shutdown_grace(), Duration::from_secs(2));
        assert_eq!(config.metrics.disk_mount, PathBuf::from("/var"));
        assert_eq!(config.metrics.cpu_sample_ms, 500);
        assert!(!config.console.fail_fast);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn missing_file_returns_default() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.toml"));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn invalid_toml_returns_default() {
        let temp = std::env::temp_dir().join(format!(
            "statuspro_test_invalid_{}.toml",
            std::process::id()
        ));
        std::fs::write(&temp, "this is not valid toml {{{{").unwrap();
        let config = load_config_from_path(&temp);
        assert_eq!(config.server.port, 8080);
        let _ = std::fs::remove_file(&temp);
    }
}
