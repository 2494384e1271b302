//! # Memory Storage - redb
//!
//! Embedded, on-disk [`HotStore`](memory_core::storage::HotStore) adapter
//! for the L1 turn window, backed by [`redb`].
//!
//! ## Example
//!
//! ```no_run
//! use memory_storage_redb::RedbHotStore;
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = RedbHotStore::new(Path::new("./memory.redb")).await?;
//! # Ok(())
//! # }
//! ```

use memory_core::Error;
use std::time::Duration;

mod hot_store;

pub use hot_store::RedbHotStore;

/// Timeout for a single blocking redb operation.
const DB_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Run a blocking redb operation on a dedicated thread with a timeout.
async fn with_db_timeout<T, F>(operation: F) -> memory_core::Result<T>
where
    F: FnOnce() -> memory_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(DB_OPERATION_TIMEOUT, tokio::task::spawn_blocking(operation)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(Error::TierStorageError(format!("task join error: {join_err}"))),
        Err(_) => Err(Error::TierStorageError(format!(
            "database operation timed out after {DB_OPERATION_TIMEOUT:?}"
        ))),
    }
}
