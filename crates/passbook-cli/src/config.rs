use passbook_core::{BankRegistry, RegistryError};
use passbook_face::CaptureConfig;
use std::path::PathBuf;
use std::time::Duration;

/// CLI configuration, loaded from environment variables.
pub struct Config {
    /// Face verification endpoint.
    pub verify_url: String,
    /// HTTP timeout for one verification request, and the overall limit
    /// for a `face-verify` session.
    pub verify_timeout_secs: u64,
    /// Detector poll period in milliseconds.
    pub poll_interval_ms: u64,
    /// Seconds a face must stay in view before capture.
    pub countdown_secs: u32,
    /// JPEG quality for the uploaded crop (1–100).
    pub jpeg_quality: u8,
    /// Optional TOML file merged over the built-in bank registry.
    pub bank_registry: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `PASSBOOK_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            verify_url: std::env::var("PASSBOOK_VERIFY_URL")
                .unwrap_or_else(|_| passbook_face::verifier::DEFAULT_VERIFY_URL.to_string()),
            verify_timeout_secs: env_parse("PASSBOOK_VERIFY_TIMEOUT_SECS", 30),
            poll_interval_ms: env_parse("PASSBOOK_POLL_INTERVAL_MS", 300),
            countdown_secs: env_parse("PASSBOOK_COUNTDOWN_SECS", 3),
            jpeg_quality: env_parse("PASSBOOK_JPEG_QUALITY", 90),
            bank_registry: std::env::var("PASSBOOK_BANK_REGISTRY")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn capture(&self) -> CaptureConfig {
        CaptureConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            countdown_secs: self.countdown_secs,
            jpeg_quality: self.jpeg_quality,
        }
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_secs(self.verify_timeout_secs)
    }

    /// Built-in registry, with the override file merged on top if configured.
    pub fn registry(&self) -> Result<BankRegistry, RegistryError> {
        let builtin = BankRegistry::builtin().clone();
        match &self.bank_registry {
            Some(path) => Ok(builtin.merge(BankRegistry::load(path)?)),
            None => Ok(builtin),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
