//! Persistence adapter: an asynchronous string-keyed blob store plus the
//! codecs for the two values the board keeps in it.
//!
//! The same serialized array doubles as the backup file format, so the
//! codec helpers are shared between the adapter and backup export/restore.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::item::Item;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Key holding the JSON-serialized item array.
pub const ITEMS_KEY: &str = "canvasImageEditorState";

/// Key holding the selected item's id; absent when nothing is selected.
pub const SELECTION_KEY: &str = "canvasActiveSelection";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async adapter operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Durable string-keyed blob store. Every operation is independently
/// fallible; callers are expected to keep working from in-memory state when
/// one fails.
pub trait KvStore: Send + Sync {
    /// Read a value, `None` when the key is absent.
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>>;

    /// Write a value.
    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Delete a key; deleting an absent key is not an error.
    fn remove(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;
}

/// Serialize an item array for the items key or a backup file.
pub fn encode_items(items: &[Item]) -> StorageResult<String> {
    serde_json::to_string(items).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Parse an item array. Anything that is not a JSON array of items is an
/// error, leaving the caller's scene untouched.
pub fn decode_items(json: &str) -> StorageResult<Vec<Item>> {
    serde_json::from_str(json).map_err(|e| StorageError::Serialization(e.to_string()))
}

#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
    // Minimal polling executor for tests; adapter futures never actually
    // suspend.
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        match f.as_mut().poll(&mut cx) {
            Poll::Ready(result) => return result,
            Poll::Pending => {}
        }
    }
}
