pub mod events;
pub mod identity;
pub mod record;
pub mod repository;

pub use events::{ChangeEvent, ChangeKind};
pub use identity::{AuthUser, IdentityProvider};
pub use record::{QueryFilter, Record, SortDirection};
pub use repository::RecordStore;
