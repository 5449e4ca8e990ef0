use serde::Deserialize;

/// Root application configuration. Loaded from an optional `adlaunch.toml`
/// and from environment variables with the prefix `ADLAUNCH__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Remote ads platform connection.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub ad_account_id: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl PlatformConfig {
    /// Ad account id in `act_<id>` form.
    pub fn normalized_ad_account_id(&self) -> String {
        normalize_ad_account_id(&self.ad_account_id)
    }
}

pub fn normalize_ad_account_id(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("act_") {
        trimmed.to_string()
    } else {
        format!("act_{trimmed}")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_video_ready_timeout_secs")]
    pub video_ready_timeout_secs: u64,
    #[serde(default = "default_video_poll_interval_ms")]
    pub video_poll_interval_ms: u64,
    #[serde(default = "default_ad_status")]
    pub ad_status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default functions
fn default_base_url() -> String {
    "https://graph.facebook.com".to_string()
}
fn default_api_version() -> String {
    "v24.0".to_string()
}
fn default_request_timeout_secs() -> u64 {
    60
}
fn default_video_ready_timeout_secs() -> u64 {
    600
}
fn default_video_poll_interval_ms() -> u64 {
    5000
}
fn default_ad_status() -> String {
    "PAUSED".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    3001
}
fn default_metrics_port() -> u16 {
    9091
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            access_token: String::new(),
            ad_account_id: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            video_ready_timeout_secs: default_video_ready_timeout_secs(),
            video_poll_interval_ms: default_video_poll_interval_ms(),
            ad_status: default_ad_status(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            platform: PlatformConfig::default(),
            pipeline: PipelineConfig::default(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("adlaunch").required(false))
            .add_source(
                config::Environment::with_prefix("ADLAUNCH")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.platform.api_version, "v24.0");
        assert_eq!(cfg.pipeline.video_ready_timeout_secs, 600);
        assert_eq!(cfg.pipeline.ad_status, "PAUSED");
        assert_eq!(cfg.api.http_port, 3001);
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let cfg: AppConfig = serde_json::from_value(serde_json::json!({
            "platform": { "ad_account_id": "12345" },
            "api": { "http_port": 8088 }
        }))
        .unwrap();
        assert_eq!(cfg.platform.base_url, "https://graph.facebook.com");
        assert_eq!(cfg.platform.normalized_ad_account_id(), "act_12345");
        assert_eq!(cfg.api.http_port, 8088);
        assert_eq!(cfg.api.host, "0.0.0.0");
        assert_eq!(cfg.metrics.port, 9091);
    }

    #[test]
    fn test_ad_account_normalization() {
        assert_eq!(normalize_ad_account_id("act_99"), "act_99");
        assert_eq!(normalize_ad_account_id(" 99 "), "act_99");
    }
}
