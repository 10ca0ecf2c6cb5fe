pub mod client_imports;
pub mod records;
