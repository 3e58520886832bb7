use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

/// Endpoints are mounted at `<base_url>/<namespace>/<endpoint>`.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            namespace: default_namespace(),
        }
    }
}

fn default_base_url() -> String {
    "/".into()
}

fn default_namespace() -> String {
    "GPUDashboard".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

impl DashboardConfig {
    /// `/GPUDashboard` for the default base URL, `/user/x/GPUDashboard` under a prefix.
    pub fn mount_path(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{}/{}", base, self.namespace)
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &str) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.server.host.is_empty(),
            "server.host must be non-empty"
        );
        anyhow::ensure!(
            self.dashboard.base_url.starts_with('/'),
            "dashboard.base_url must start with '/', got {:?}",
            self.dashboard.base_url
        );
        anyhow::ensure!(
            !self.dashboard.namespace.is_empty() && !self.dashboard.namespace.contains('/'),
            "dashboard.namespace must be a single non-empty path segment, got {:?}",
            self.dashboard.namespace
        );
        anyhow::ensure!(
            !self.logging.level.is_empty(),
            "logging.level must be non-empty"
        );
        Ok(())
    }
}
