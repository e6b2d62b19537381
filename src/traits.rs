use crate::error::Result;
use crate::models::{Catalog, ChapterListing, Notification, ReadingPosition};
use serde_json::Value;

/// Hierarchical key-value store addressed by dot-delimited paths such as
/// `comic.<host>.<titlekey>`. `get` and `set` operate on whole subtrees.
pub trait SettingsStore: Send + Sync {
    fn has(&self, path: &str) -> Result<bool>;

    fn get(&self, path: &str) -> Result<Option<Value>>;

    fn set(&self, path: &str, value: Value) -> Result<()>;
}

/// Per-host capability that lists the chapters currently published for a comic
#[async_trait::async_trait]
pub trait ChapterFetcher: Send + Sync {
    async fn grab_chapters(&self, titlekey: &str, link: &str) -> Result<ChapterListing>;
}

/// OS-level alert sink
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<()>;
}

/// A view that renders subscription state. Only the favorites list makes use
/// of `has_subscription`.
pub trait SubscribeView: Send + Sync {
    fn update_subscribe_ui(&self, catalog: &Catalog, has_subscription: bool);
}

pub trait Translator: Send + Sync {
    fn translate(&self);
}

/// Source of the reader's current position
pub trait ReaderState: Send + Sync {
    fn current_position(&self) -> Option<ReadingPosition>;
}

/// Out-of-process channel carrying the pending-update badge count
pub trait UpdateSignal: Send + Sync {
    fn send(&self, channel: &str, count: usize) -> Result<()>;
}
