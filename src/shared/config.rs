use crate::log_info;
use crate::shared::errors::{AppError, AppResult};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Which record store the application talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process store, nothing survives a restart
    Memory,
    /// Hosted REST backend (SUPABASE_URL)
    Remote,
}

impl FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "remote" | "supabase" => Ok(StoreBackend::Remote),
            other => Err(AppError::ConfigError(format!(
                "Unknown store backend '{}', expected 'memory' or 'remote'",
                other
            ))),
        }
    }
}

/// Connection settings for the hosted backend
#[derive(Debug, Clone)]
pub struct RemoteStoreConfig {
    pub base_url: String,
    pub anon_key: String,
    pub access_token: Option<String>,
    pub requests_per_second: f64,
    pub timeout_secs: u64,
}

/// Bounds for the simulated progress reporter
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub min_records: u32,
    pub max_records: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(2000),
            max_delay: Duration::from_millis(5000),
            min_records: 10,
            max_records: 100,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> AppResult<()> {
        if self.min_delay > self.max_delay {
            return Err(AppError::ConfigError(
                "Simulated min delay must not exceed max delay".to_string(),
            ));
        }
        if self.min_records > self.max_records {
            return Err(AppError::ConfigError(
                "Simulated min records must not exceed max records".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub remote: Option<RemoteStoreConfig>,
    /// Owner used by the offline store when no session exists
    pub local_user_id: Option<Uuid>,
    pub csv_delimiter: u8,
    pub import_concurrency: usize,
    pub simulation: SimulationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreBackend::Memory,
            remote: None,
            local_user_id: None,
            csv_delimiter: b',',
            import_concurrency: 1,
            simulation: SimulationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment (and `.env` when present)
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let store = match env::var("FIELDCRM_STORE") {
            Ok(value) => value.parse()?,
            Err(_) if env::var("SUPABASE_URL").is_ok() => StoreBackend::Remote,
            Err(_) => StoreBackend::Memory,
        };

        let remote = match store {
            StoreBackend::Remote => Some(Self::remote_from_env()?),
            StoreBackend::Memory => None,
        };

        let local_user_id = match env::var("FIELDCRM_USER_ID") {
            Ok(value) => Some(Uuid::parse_str(value.trim())?),
            Err(_) => None,
        };

        let csv_delimiter = match env::var("FIELDCRM_CSV_DELIMITER") {
            Ok(value) => Self::parse_delimiter(&value)?,
            Err(_) => defaults.csv_delimiter,
        };

        let import_concurrency =
            read_number("FIELDCRM_IMPORT_CONCURRENCY", defaults.import_concurrency)?;
        if import_concurrency == 0 {
            return Err(AppError::ConfigError(
                "FIELDCRM_IMPORT_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        let sim_defaults = defaults.simulation;
        let simulation = SimulationConfig {
            min_delay: Duration::from_millis(read_number(
                "FIELDCRM_SIM_MIN_DELAY_MS",
                sim_defaults.min_delay.as_millis() as u64,
            )?),
            max_delay: Duration::from_millis(read_number(
                "FIELDCRM_SIM_MAX_DELAY_MS",
                sim_defaults.max_delay.as_millis() as u64,
            )?),
            min_records: read_number("FIELDCRM_SIM_MIN_RECORDS", sim_defaults.min_records)?,
            max_records: read_number("FIELDCRM_SIM_MAX_RECORDS", sim_defaults.max_records)?,
        };
        simulation.validate()?;

        log_info!(
            "Configuration loaded: store={:?}, concurrency={}, delimiter='{}'",
            store,
            import_concurrency,
            csv_delimiter as char
        );

        Ok(Self {
            store,
            remote,
            local_user_id,
            csv_delimiter,
            import_concurrency,
            simulation,
        })
    }

    fn remote_from_env() -> AppResult<RemoteStoreConfig> {
        let base_url = env::var("SUPABASE_URL").map_err(|_| {
            AppError::ConfigError("SUPABASE_URL environment variable not found".to_string())
        })?;

        if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
            return Err(AppError::ConfigError(
                "Invalid SUPABASE_URL. Must start with http:// or https://".to_string(),
            ));
        }

        let anon_key = env::var("SUPABASE_ANON_KEY").map_err(|_| {
            AppError::ConfigError("SUPABASE_ANON_KEY environment variable not found".to_string())
        })?;

        // Log the host without exposing keys
        log_info!("Using hosted record store at: {}", base_url);

        Ok(RemoteStoreConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            access_token: env::var("SUPABASE_ACCESS_TOKEN").ok(),
            requests_per_second: read_number("FIELDCRM_REQUESTS_PER_SECOND", 10.0)?,
            timeout_secs: read_number("FIELDCRM_REQUEST_TIMEOUT_SECS", 30)?,
        })
    }

    /// Accepts a single ASCII character, or `\t` / `tab`
    pub fn parse_delimiter(value: &str) -> AppResult<u8> {
        match value {
            "\\t" | "tab" | "\t" => Ok(b'\t'),
            v if v.len() == 1 && v.is_ascii() => Ok(v.as_bytes()[0]),
            other => Err(AppError::ConfigError(format!(
                "CSV delimiter must be a single ASCII character, got '{}'",
                other
            ))),
        }
    }
}

fn read_number<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| AppError::ConfigError(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}
