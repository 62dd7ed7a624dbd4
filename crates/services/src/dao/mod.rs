pub mod base;
pub mod presence;

pub use base::{BaseDao, StoreError, StoreResult};
pub use presence::{PresenceDao, PresenceStore};
