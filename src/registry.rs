use crate::config::Config;
use crate::error::Result;
use crate::fetchers::HtmlChapterFetcher;
use crate::traits::ChapterFetcher;
use std::collections::HashMap;
use tracing::{info, warn};

/// Registry of chapter fetchers, keyed by host
#[derive(Default)]
pub struct FetcherRegistry {
    fetchers: HashMap<String, Box<dyn ChapterFetcher>>,
}

impl FetcherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One fetcher per configured host. Hosts with an unknown `fetcher_type`
    /// are left unregistered and their comics are skipped during checks.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut registry = Self::new();

        for (host, host_config) in &config.hosts {
            match host_config.fetcher_type.as_str() {
                "html" => {
                    registry.register_fetcher(host, Box::new(HtmlChapterFetcher::new(host_config.clone())?));
                    info!("Registered html fetcher for host: {}", host);
                }
                other => warn!("Unknown fetcher type '{}' for host: {}", other, host),
            }
        }

        Ok(registry)
    }

    pub fn register_fetcher(&mut self, host: &str, fetcher: Box<dyn ChapterFetcher>) {
        self.fetchers.insert(host.to_string(), fetcher);
    }

    pub fn get_fetcher(&self, host: &str) -> Option<&dyn ChapterFetcher> {
        self.fetchers.get(host).map(|f| f.as_ref())
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.fetchers.keys().map(|host| host.as_str())
    }
}
