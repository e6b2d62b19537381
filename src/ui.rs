//! Push targets refreshed after every subscription state change, plus the
//! console implementations the CLI renders with.

use crate::config::UiConfig;
use crate::error::Result;
use crate::models::{Catalog, ReadingPosition};
use crate::traits::{ReaderState, SubscribeView, Translator, UpdateSignal};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Every target a UI refresh pushes to.
pub struct UiHub {
    views: Vec<Arc<dyn SubscribeView>>,
    translator: Box<dyn Translator>,
    reader: Arc<dyn ReaderState>,
    signal: Box<dyn UpdateSignal>,
    channel: String,
}

impl UiHub {
    pub fn new(
        channel: impl Into<String>,
        reader: Arc<dyn ReaderState>,
        translator: Box<dyn Translator>,
        signal: Box<dyn UpdateSignal>,
    ) -> Self {
        Self {
            views: Vec::new(),
            translator,
            reader,
            signal,
            channel: channel.into(),
        }
    }

    pub fn with_view(mut self, view: Arc<dyn SubscribeView>) -> Self {
        self.views.push(view);
        self
    }

    /// Search list, favorites table and the reader session, signalling
    /// through `ui.signal_path` when set.
    pub fn console(config: &UiConfig, session: Arc<ReaderSession>) -> Self {
        let signal: Box<dyn UpdateSignal> = match &config.signal_path {
            Some(path) => Box::new(SignalFile::new(path)),
            None => Box::new(LogSignal),
        };

        Self::new(
            config.signal_channel.clone(),
            session.clone(),
            Box::new(LocaleTranslator::new(&config.locale)),
            signal,
        )
        .with_view(Arc::new(SearchListView))
        .with_view(Arc::new(FavoritesView))
        .with_view(session)
    }

    pub fn push(&self, catalog: &Catalog, has_subscription: bool) {
        for view in &self.views {
            view.update_subscribe_ui(catalog, has_subscription);
        }
    }

    pub fn translate(&self) {
        self.translator.translate();
    }

    pub fn current_position(&self) -> Option<ReadingPosition> {
        self.reader.current_position()
    }

    pub fn send_badge(&self, count: usize) -> Result<()> {
        self.signal.send(&self.channel, count)
    }
}

pub struct SearchListView;

impl SubscribeView for SearchListView {
    fn update_subscribe_ui(&self, catalog: &Catalog, _has_subscription: bool) {
        let total: usize = catalog.values().map(|comics| comics.len()).sum();
        debug!("Search list refreshed with {} known comics", total);
    }
}

/// Prints the subscribed comics as a table.
pub struct FavoritesView;

impl SubscribeView for FavoritesView {
    fn update_subscribe_ui(&self, catalog: &Catalog, has_subscription: bool) {
        if !has_subscription {
            println!("📭 No subscriptions yet");
            return;
        }

        println!("📚 Subscribed comics:");
        println!("{:<12} {:<30} {:<10} {:<20} {:<6}", "Host", "Title", "Chapters", "Newest", "New");
        println!("{}", "-".repeat(82));

        for (host, comics) in catalog {
            for comic in comics.values().filter(|comic| comic.subscribed) {
                println!(
                    "{:<12} {:<30} {:<10} {:<20} {:<6}",
                    host,
                    comic.title,
                    comic.chapters_count,
                    comic.newestchapter,
                    if comic.hasupdate { "●" } else { "" }
                );
            }
        }
    }
}

/// The comic currently open in the reader.
#[derive(Default)]
pub struct ReaderSession {
    position: Mutex<Option<ReadingPosition>>,
}

impl ReaderSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, host: &str, titlekey: &str, page_idx: u32) {
        *self.position.lock().unwrap_or_else(|e| e.into_inner()) = Some(ReadingPosition {
            host: host.to_string(),
            titlekey: titlekey.to_string(),
            page_idx,
        });
    }

    pub fn close(&self) {
        *self.position.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

impl ReaderState for ReaderSession {
    fn current_position(&self) -> Option<ReadingPosition> {
        self.position.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl SubscribeView for ReaderSession {
    fn update_subscribe_ui(&self, catalog: &Catalog, _has_subscription: bool) {
        if let Some(position) = self.current_position() {
            let subscribed = catalog
                .get(&position.host)
                .and_then(|comics| comics.get(&position.titlekey))
                .is_some_and(|comic| comic.subscribed);
            debug!("Reader on {}.{} (subscribed: {})", position.host, position.titlekey, subscribed);
        }
    }
}

pub struct LocaleTranslator {
    locale: String,
}

impl LocaleTranslator {
    pub fn new(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
        }
    }
}

impl Translator for LocaleTranslator {
    fn translate(&self) {
        debug!("Refreshing translated labels for locale {}", self.locale);
    }
}

/// Writes `{"channel", "count"}` to a file watched by another process.
pub struct SignalFile {
    path: PathBuf,
}

impl SignalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl UpdateSignal for SignalFile {
    fn send(&self, channel: &str, count: usize) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let payload = serde_json::json!({ "channel": channel, "count": count });
        fs::write(&self.path, serde_json::to_string(&payload)?)?;
        Ok(())
    }
}

pub struct LogSignal;

impl UpdateSignal for LogSignal {
    fn send(&self, channel: &str, count: usize) -> Result<()> {
        info!("[{}] {} comics with unseen chapters", channel, count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_session_position() {
        let session = ReaderSession::new();
        assert!(session.current_position().is_none());

        session.open("siteA", "comicX", 7);
        assert_eq!(
            session.current_position(),
            Some(ReadingPosition {
                host: "siteA".to_string(),
                titlekey: "comicX".to_string(),
                page_idx: 7,
            })
        );

        session.close();
        assert!(session.current_position().is_none());
    }

    #[test]
    fn test_signal_file_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run").join("badge.json");

        SignalFile::new(&path).send("comic-update", 3).unwrap();

        let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, serde_json::json!({ "channel": "comic-update", "count": 3 }));
    }
}
