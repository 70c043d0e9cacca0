use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `CAMPAIGN_SEQUENCE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sequence: SequenceConfig,
    #[serde(default)]
    pub log: LogConfig,
}

// ─── Sequence Limits ────────────────────────────────────────────────────────

/// Upper bounds a sequence must respect before it can be activated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SequenceConfig {
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default = "default_max_variants_per_step")]
    pub max_variants_per_step: usize,
    #[serde(default = "default_max_wait_days")]
    pub max_wait_days: u32,
}

fn default_max_steps() -> usize {
    50
}

fn default_max_variants_per_step() -> usize {
    26
}

fn default_max_wait_days() -> u32 {
    365
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            max_variants_per_step: default_max_variants_per_step(),
            max_wait_days: default_max_wait_days(),
        }
    }
}

// ─── Logging ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default = "default_log_json")]
    pub json: bool,
}

fn default_log_filter() -> String {
    "campaign_sequence=info".to_string()
}
fn default_log_json() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: default_log_json(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sequence: SequenceConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("CAMPAIGN_SEQUENCE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
