use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scraper: ScraperConfig,
    pub timings: TimingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub chrome_path: Option<String>,
    pub user_agent: String,
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    /// Seconds an idle browser is kept alive between commands.
    pub idle_browser_timeout: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
            headless: true,
            window_width: 1366,
            window_height: 900,
            idle_browser_timeout: 300,
        }
    }
}

/// Deadlines and poll intervals for one extraction chain, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Maximum wait for a context to report load completion.
    pub load_timeout_ms: u64,
    /// How often load completion is re-checked.
    pub load_check_interval_ms: u64,
    /// Pause between price extraction attempts.
    pub poll_interval_ms: u64,
    /// Deadline for polling the search results page.
    pub direct_deadline_ms: u64,
    /// Deadline for polling a product page reached by following a link.
    pub follow_deadline_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            load_timeout_ms: 15_000,
            load_check_interval_ms: 300,
            poll_interval_ms: 350,
            direct_deadline_ms: 10_000,
            follow_deadline_ms: 8_000,
        }
    }
}

impl TimingConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn load_check_interval(&self) -> Duration {
        Duration::from_millis(self.load_check_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn direct_deadline(&self) -> Duration {
        Duration::from_millis(self.direct_deadline_ms)
    }

    pub fn follow_deadline(&self) -> Duration {
        Duration::from_millis(self.follow_deadline_ms)
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Add environment-specific config
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local config (ignored by git)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables, e.g. PRICE_SCOUT__TIMINGS__POLL_INTERVAL_MS
            .add_source(
                Environment::with_prefix("PRICE_SCOUT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::finish(s.try_deserialize()?)
    }

    /// Loads a single config file (any format the `config` crate understands), still
    /// letting environment variables override it.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from(path))
            .add_source(
                Environment::with_prefix("PRICE_SCOUT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::finish(s.try_deserialize()?)
    }

    fn finish(mut config: AppConfig) -> Result<Self, ConfigError> {
        // Add Chrome path from environment if not set
        if config.scraper.chrome_path.is_none() {
            config.scraper.chrome_path = env::var("CHROME_PATH").ok();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scraper.user_agent.trim().is_empty() {
            return Err(ConfigError::Message("Scraper user_agent must not be empty".into()));
        }

        if self.scraper.window_width == 0 || self.scraper.window_height == 0 {
            return Err(ConfigError::Message("Scraper window size must be greater than 0".into()));
        }

        let timings = &self.timings;
        let required = [
            ("load_timeout_ms", timings.load_timeout_ms),
            ("load_check_interval_ms", timings.load_check_interval_ms),
            ("poll_interval_ms", timings.poll_interval_ms),
            ("direct_deadline_ms", timings.direct_deadline_ms),
            ("follow_deadline_ms", timings.follow_deadline_ms),
        ];
        for (name, value) in required {
            if value == 0 {
                return Err(ConfigError::Message(format!("Timing {} must be greater than 0", name)));
            }
        }

        if timings.poll_interval_ms >= timings.direct_deadline_ms {
            return Err(ConfigError::Message(
                "Timing poll_interval_ms must be shorter than direct_deadline_ms".into(),
            ));
        }

        Ok(())
    }
}
