pub mod models;
pub mod repository;

pub use models::CLIENT_IMPORTS_TABLE;
pub use repository::ClientImportRepositoryImpl;
