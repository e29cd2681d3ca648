//! Local post cache.
//!
//! This module provides the store the rest of the app reads from:
//! - Posts keyed by id, every write an upsert
//! - Transactional "clear confirmed, insert page" for refreshes
//! - Local-only posts survive refreshes untouched
//! - Lazy paginated reads for list views

mod pager;
mod storage;
mod traits;

pub use pager::paged_read;
pub use storage::SqliteStorage;
pub use traits::PostStore;
