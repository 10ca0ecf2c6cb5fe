use log::{debug, error, info, LevelFilter};
use std::sync::Once;
use std::time::Instant;

static INIT: Once = Once::new();

/// Install `env_logger` once per process.
///
/// `RUST_LOG` wins when set; otherwise the crate logs at debug and the HTTP
/// and runtime crates only report warnings.
pub fn init_logger() {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder
            .filter_level(LevelFilter::Info)
            .filter_module("fieldcrm_lib", LevelFilter::Debug)
            .filter_module("reqwest", LevelFilter::Warn)
            .filter_module("hyper", LevelFilter::Warn)
            .filter_module("tokio", LevelFilter::Warn)
            .parse_default_env()
            .format_timestamp_millis()
            .format_target(false)
            .format_module_path(false);

        if builder.try_init().is_ok() {
            debug!("Logger ready");
        }
    });
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        log::info!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        log::debug!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        log::warn!($($arg)*)
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        log::error!($($arg)*)
    };
}

/// Log lines shared by the store and the import pipeline
pub struct LogContext;

impl LogContext {
    pub fn store_operation(operation: &str, table: &str) {
        debug!("Store: {} on '{}'", operation, table);
    }

    pub fn import_progress(row_number: usize, total: usize, file_name: &str) {
        debug!("Import: '{}' row {}/{}", file_name, row_number, total);
    }

    pub fn import_summary(file_name: &str, total: u32, successful: u32, failed: u32) {
        info!(
            "Import: '{}' completed ({} rows, {} imported, {} failed)",
            file_name, total, successful, failed
        );
    }

    pub fn error_with_context(error: &dyn std::error::Error, context: &str) {
        error!("{}: {}", context, error);
    }
}

/// Logs how long an operation took when finished
pub struct TimedOperation {
    started: Instant,
    label: String,
}

impl TimedOperation {
    pub fn new(label: &str) -> Self {
        debug!("Started {}", label);
        Self {
            started: Instant::now(),
            label: label.to_string(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    pub fn finish(self) -> u64 {
        let elapsed = self.elapsed_ms();
        debug!("Finished {} in {}ms", self.label, elapsed);
        elapsed
    }

    /// Info level, with a short outcome appended
    pub fn finish_with_info(self, outcome: &str) -> u64 {
        let elapsed = self.elapsed_ms();
        info!("Finished {} in {}ms: {}", self.label, elapsed, outcome);
        elapsed
    }
}
