use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    /// Absent means the in-memory store is used.
    pub database: Option<DatabaseConfig>,
    pub redis: Option<RedisConfig>,
    pub kafka: Option<KafkaConfig>,
    pub auth: AuthConfig,
    #[serde(default)]
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// How long a booking may stay Pending before the sweep cancels it.
    #[serde(default = "default_grace")]
    pub pending_grace_seconds: u64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: i64,
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            pending_grace_seconds: default_grace(),
            sweep_interval_seconds: default_sweep_interval(),
            rate_limit_per_minute: default_rate_limit(),
        }
    }
}

/// One week.
pub const MAX_PENDING_GRACE_SECONDS: u64 = 7 * 24 * 60 * 60;

impl BusinessRules {
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if !(1..=MAX_PENDING_GRACE_SECONDS).contains(&self.pending_grace_seconds) {
            return Err(config::ConfigError::Message(format!(
                "business_rules.pending_grace_seconds must be between 1 and {}, got {}",
                MAX_PENDING_GRACE_SECONDS, self.pending_grace_seconds
            )));
        }
        if self.sweep_interval_seconds == 0 {
            return Err(config::ConfigError::Message(
                "business_rules.sweep_interval_seconds must be at least 1".into(),
            ));
        }
        if self.rate_limit_per_minute < 1 {
            return Err(config::ConfigError::Message(format!(
                "business_rules.rate_limit_per_minute must be at least 1, got {}",
                self.rate_limit_per_minute
            )));
        }
        Ok(())
    }

    pub fn pending_grace(&self) -> chrono::Duration {
        let secs = self.pending_grace_seconds.clamp(1, MAX_PENDING_GRACE_SECONDS);
        chrono::Duration::seconds(secs as i64)
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_seconds.max(1))
    }
}

fn default_grace() -> u64 { 300 }
fn default_sweep_interval() -> u64 { 60 }
fn default_rate_limit() -> i64 { 100 }

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. AEROBOOK__DATABASE__URL
            .add_source(config::Environment::with_prefix("AEROBOOK").separator("__"))
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.business_rules.validate()?;
        Ok(config)
    }
}
