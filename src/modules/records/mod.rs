/// Record store module
///
/// Owner-scoped table access shared by every CRM feature:
/// - Domain: row shape, filters, store / identity traits, change events
/// - Infrastructure: in-memory store, hosted REST store, identity providers,
///   change feed and the publishing decorator
pub mod domain;
pub mod infrastructure;

// Re-exports for easy access
pub use domain::{
    AuthUser, ChangeEvent, ChangeKind, IdentityProvider, QueryFilter, Record, RecordStore,
    SortDirection,
};
pub use infrastructure::{
    ChangeFeed, MemoryRecordStore, ObservedRecordStore, PostgrestRecordStore, StaticIdentity,
    Subscription, SupabaseIdentity,
};
