use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::{env, time::Duration};

pub const DEFAULT_NUTRISLICE_ROOT_URL: &str =
    "https://district196.api.nutrislice.com/menu/api/weeks/school/echo-park/menu-type/breakfast-lunch/";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub menu: MenuConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MenuConfig {
    /// IANA name; "today" and week boundaries are computed in this zone
    pub timezone: String,
    pub cache_ttl_secs: u64,
    pub upstream_timeout_secs: u64,
    pub nutrislice_root_url: String,
}

impl MenuConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and environment variables
    ///
    /// Priority (highest to lowest):
    /// 1. Legacy environment variables (APP_TIMEZONE, CACHE_TTL_SECONDS, ...)
    /// 2. Prefixed environment variables (LUNCHMENU__MENU__TIMEZONE, etc.)
    /// 3. Config file specified by path
    /// 4. Hardcoded defaults
    pub fn load(config_path: Option<String>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        builder = builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("menu.timezone", "America/Chicago")?
            .set_default("menu.cache_ttl_secs", 1800)?
            .set_default("menu.upstream_timeout_secs", 20)?
            .set_default("menu.nutrislice_root_url", DEFAULT_NUTRISLICE_ROOT_URL)?
            .set_default("observability.log_level", "info")?;

        let config_file_path = config_path
            .or_else(|| env::var("CONFIG_PATH").ok())
            .unwrap_or_else(|| "config/default.toml".to_string());

        // Optional: a missing file just means defaults + env
        if std::path::Path::new(&config_file_path).exists() {
            builder = builder.add_source(File::with_name(&config_file_path));
        }

        builder = builder.add_source(
            Environment::with_prefix("LUNCHMENU")
                .separator("__")
                .try_parsing(true),
        );

        let legacy = [
            ("APP_TIMEZONE", "menu.timezone"),
            ("CACHE_TTL_SECONDS", "menu.cache_ttl_secs"),
            ("NUTRISLICE_ROOT_URL", "menu.nutrislice_root_url"),
            ("HOST", "server.host"),
            ("PORT", "server.port"),
        ];
        for (var, key) in legacy {
            if let Ok(value) = env::var(var) {
                builder = builder.set_override(key, value)?;
            }
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }
        if self.menu.cache_ttl_secs == 0 {
            return Err("Menu cache_ttl_secs must be at least 1".to_string());
        }
        if self.menu.upstream_timeout_secs == 0 {
            return Err("Menu upstream_timeout_secs must be at least 1".to_string());
        }
        if time_tz::timezones::get_by_name(&self.menu.timezone).is_none() {
            return Err(format!("Unknown timezone: {}", self.menu.timezone));
        }
        let url = &self.menu.nutrislice_root_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(format!("Nutrislice root URL must be http(s): {url}"));
        }
        Ok(())
    }
}
