pub mod change_feed;
pub mod identity;
pub mod memory_store;
pub mod observed_store;
pub mod postgrest_store;

pub use change_feed::{ChangeFeed, Subscription};
pub use identity::{StaticIdentity, SupabaseIdentity};
pub use memory_store::MemoryRecordStore;
pub use observed_store::ObservedRecordStore;
pub use postgrest_store::PostgrestRecordStore;
