pub mod catalog;
pub mod config;
pub mod error;
pub mod fetchers;
pub mod merge;
pub mod models;
pub mod notifier;
pub mod registry;
pub mod settings;
pub mod subscriber;
pub mod traits;
pub mod ui;
pub mod utils;

pub use error::{ComicSubError, Result};
pub use subscriber::{SubscriptionManager, UiAction};
