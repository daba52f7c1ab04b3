use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `ADSERVE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub reporting: ReportingConfig,
    #[serde(default)]
    pub impressions: ImpressionConfig,
    #[serde(default)]
    pub breaker: BreakerConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

/// Retry settings for general event writes (clicks, views).
#[derive(Debug, Clone, Deserialize)]
pub struct ReportingConfig {
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,
}

/// Lighter retry settings for impression tracking, bounding worst-case
/// latency for a high-volume, low-value signal.
#[derive(Debug, Clone, Deserialize)]
pub struct ImpressionConfig {
    #[serde(default = "default_impression_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_impression_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BreakerConfig {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default = "default_max_ads_per_placement")]
    pub max_ads_per_placement: usize,
}

// Default functions
fn default_base_delay_ms() -> u64 {
    1000
}
fn default_max_retries() -> u32 {
    3
}
fn default_attempt_timeout_ms() -> u64 {
    3000
}
fn default_impression_base_delay_ms() -> u64 {
    500
}
fn default_impression_max_retries() -> u32 {
    2
}
fn default_failure_threshold() -> u32 {
    3
}
fn default_cooldown_secs() -> u64 {
    300
}
fn default_max_ads_per_placement() -> usize {
    10
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_retries: default_max_retries(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
        }
    }
}

impl Default for ImpressionConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_impression_base_delay_ms(),
            max_retries: default_impression_max_retries(),
        }
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_ads_per_placement: default_max_ads_per_placement(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            reporting: ReportingConfig::default(),
            impressions: ImpressionConfig::default(),
            breaker: BreakerConfig::default(),
            delivery: DeliveryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("ADSERVE")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
