// Shared Kernel
// Cross-cutting pieces used by every module

pub mod config; // Environment-driven configuration
pub mod errors; // Shared error types
pub mod utils; // Shared utilities

// Re-exports for convenience
pub use config::{AppConfig, RemoteStoreConfig, SimulationConfig, StoreBackend};
pub use errors::{AppError, AppResult};
