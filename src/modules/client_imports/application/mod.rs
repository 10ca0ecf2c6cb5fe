pub mod service;

pub use service::ClientImportService;
