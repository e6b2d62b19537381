use crate::catalog::CatalogStore;
use crate::error::{ComicSubError, Result};
use crate::merge::merge_chapters;
use crate::models::{any_subscribed, badge_count, Catalog, ChapterListing, ComicRecord, SweepReport};
use crate::registry::FetcherRegistry;
use crate::traits::{Notifier, SettingsStore};
use crate::ui::UiHub;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Actions the views can fire at the manager.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    Register {
        host: String,
        titlekey: String,
        title: String,
        link: String,
        thumbnail: String,
    },
    Subscribe {
        host: String,
        titlekey: String,
        title: String,
        link: String,
        thumbnail: String,
    },
    Unsubscribe {
        host: String,
        titlekey: String,
    },
    UpdateAllUi,
}

enum FetchOutcome {
    Fetched(ChapterListing),
    Failed,
    Skipped,
}

/// Owns every collaborator the subscription workflow touches.
pub struct SubscriptionManager {
    catalog: CatalogStore,
    fetchers: FetcherRegistry,
    notifier: Box<dyn Notifier>,
    ui: UiHub,
    app_name: String,
}

impl SubscriptionManager {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        fetchers: FetcherRegistry,
        notifier: Box<dyn Notifier>,
        ui: UiHub,
    ) -> Self {
        Self {
            catalog: CatalogStore::new(settings),
            fetchers,
            notifier,
            ui,
            app_name: "Comic Reader".to_string(),
        }
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    /// Stores a comic unless `(host, titlekey)` is already known, and returns
    /// the stored record either way.
    pub fn register(
        &self,
        host: &str,
        titlekey: &str,
        title: &str,
        link: &str,
        thumbnail: &str,
        subscribed: bool,
    ) -> Result<ComicRecord> {
        if let Some(existing) = self.catalog.get_comic(host, titlekey)? {
            debug!("Comic {}.{} already registered", host, titlekey);
            return Ok(existing);
        }

        let comic = ComicRecord::new(title, link, thumbnail, subscribed);
        self.catalog.set_comic(host, titlekey, &comic)?;
        info!("➕ Registered comic '{}' ({}.{})", title, host, titlekey);

        Ok(comic)
    }

    /// Toggles the subscription, registering the comic as subscribed when it
    /// is unknown. A comic that ends up subscribed is checked right away.
    pub async fn subscribe(&self, host: &str, titlekey: &str, title: &str, link: &str, thumbnail: &str) -> Result<()> {
        let comic = match self.catalog.get_comic(host, titlekey)? {
            Some(mut comic) => {
                comic.subscribed = !comic.subscribed;
                self.catalog.set_comic(host, titlekey, &comic)?;
                comic
            }
            None => self.register(host, titlekey, title, link, thumbnail, true)?,
        };

        info!(
            "{} {}.{}",
            if comic.subscribed { "Subscribed to" } else { "Unsubscribed from" },
            host,
            titlekey
        );

        self.update_ui()?;

        if comic.subscribed {
            self.check_update_single(host, titlekey).await?;
        }

        Ok(())
    }

    pub fn unsubscribe(&self, host: &str, titlekey: &str) -> Result<()> {
        if let Some(mut comic) = self.catalog.get_comic(host, titlekey)? {
            comic.subscribed = false;
            self.catalog.set_comic(host, titlekey, &comic)?;
            info!("Unsubscribed from {}.{}", host, titlekey);
            self.update_ui()?;
        }
        Ok(())
    }

    pub async fn check_update_single(&self, host: &str, titlekey: &str) -> Result<SweepReport> {
        info!("---- Start checking for {} comic's updates ----", titlekey);

        let mut catalog = self.catalog.load()?.unwrap_or_default();
        let link = catalog
            .get(host)
            .and_then(|comics| comics.get(titlekey))
            .map(|comic| comic.link.clone())
            .ok_or_else(|| ComicSubError::comic_not_found(host, titlekey))?;

        let mut report = SweepReport::start();
        let outcome = self.fetch(host, titlekey, &link).await;
        self.apply(&mut catalog, host, titlekey, outcome, &mut report).await;

        self.complete_sweep(&catalog, &mut report)?;
        Ok(report)
    }

    /// Checks every subscribed comic. All comics of a host are awaited
    /// together, then all hosts; the catalog is persisted once at the end.
    pub async fn check_update(&self) -> Result<SweepReport> {
        info!("---- Start checking for updates ----");

        let mut catalog = self.catalog.load()?.unwrap_or_default();
        let mut report = SweepReport::start();

        let host_checks = catalog.iter().map(|(host, comics)| async move {
            let comic_checks = comics.iter().map(|(titlekey, comic)| async move {
                let outcome = if comic.subscribed {
                    self.fetch(host, titlekey, &comic.link).await
                } else {
                    FetchOutcome::Skipped
                };
                (titlekey.clone(), outcome)
            });
            (host.clone(), join_all(comic_checks).await)
        });
        let results = join_all(host_checks).await;

        for (host, outcomes) in results {
            for (titlekey, outcome) in outcomes {
                self.apply(&mut catalog, &host, &titlekey, outcome, &mut report).await;
            }
        }

        self.complete_sweep(&catalog, &mut report)?;
        Ok(report)
    }

    /// Pushes the catalog to every view, stores the reader's page and emits
    /// the badge count.
    pub fn update_ui(&self) -> Result<()> {
        let mut catalog = self.catalog.load_or_init()?;

        self.ui.push(&catalog, any_subscribed(&catalog));
        self.ui.translate();
        self.save_reading_position(&mut catalog)?;

        let count = badge_count(&catalog);
        if let Err(e) = self.ui.send_badge(count) {
            warn!("Failed to send update count {}: {}", count, e);
        }

        Ok(())
    }

    pub fn has_subscription(&self) -> Result<bool> {
        Ok(self.catalog.load()?.is_some_and(|catalog| any_subscribed(&catalog)))
    }

    pub async fn dispatch(&self, action: UiAction) -> Result<()> {
        match action {
            UiAction::Register { host, titlekey, title, link, thumbnail } => {
                self.register(&host, &titlekey, &title, &link, &thumbnail, false)?;
            }
            UiAction::Subscribe { host, titlekey, title, link, thumbnail } => {
                self.subscribe(&host, &titlekey, &title, &link, &thumbnail).await?;
            }
            UiAction::Unsubscribe { host, titlekey } => self.unsubscribe(&host, &titlekey)?,
            UiAction::UpdateAllUi => self.update_ui()?,
        }
        Ok(())
    }

    /// First refresh once the views are up.
    pub fn ready(&self) -> Result<()> {
        self.update_ui()
    }

    /// Stores the reader's current page before shutdown.
    pub fn unload(&self) -> Result<()> {
        if let Some(mut catalog) = self.catalog.load()? {
            self.save_reading_position(&mut catalog)?;
        }
        Ok(())
    }

    async fn fetch(&self, host: &str, titlekey: &str, link: &str) -> FetchOutcome {
        let Some(fetcher) = self.fetchers.get_fetcher(host) else {
            warn!("No chapter fetcher registered for host: {}", host);
            return FetchOutcome::Skipped;
        };

        match fetcher.grab_chapters(titlekey, link).await {
            Ok(listing) => FetchOutcome::Fetched(listing),
            Err(e) => {
                warn!("⚠️ Failed to fetch chapters of {}.{}: {}", host, titlekey, e);
                FetchOutcome::Failed
            }
        }
    }

    async fn apply(
        &self,
        catalog: &mut Catalog,
        host: &str,
        titlekey: &str,
        outcome: FetchOutcome,
        report: &mut SweepReport,
    ) {
        let listing = match outcome {
            FetchOutcome::Fetched(listing) => listing,
            FetchOutcome::Failed => {
                report.failed += 1;
                return;
            }
            FetchOutcome::Skipped => {
                report.skipped += 1;
                return;
            }
        };

        let Some(comic) = catalog.get_mut(host).and_then(|comics| comics.get_mut(titlekey)) else {
            return;
        };

        debug!("---One Comic Update Checked--- {}.{}", host, titlekey);
        report.fetched += 1;

        if let Some(notification) = merge_chapters(comic, &listing, &self.app_name) {
            report.updated += 1;
            info!("🆕 {}", notification.body);
            if let Err(e) = self.notifier.notify(&notification).await {
                warn!("Failed to deliver notification for {}.{}: {}", host, titlekey, e);
            }
        }
    }

    fn complete_sweep(&self, catalog: &Catalog, report: &mut SweepReport) -> Result<()> {
        self.catalog.save(catalog)?;
        report.finish();

        info!(
            "📊 All updates checked: {} fetched, {} updated, {} failed, {} skipped",
            report.fetched, report.updated, report.failed, report.skipped
        );

        self.update_ui()
    }

    /// Writes the reader's page into its comic. Nothing is stored for page 0
    /// or for a comic that is not in the catalog.
    fn save_reading_position(&self, catalog: &mut Catalog) -> Result<()> {
        let Some(position) = self.ui.current_position() else {
            return Ok(());
        };
        if position.host.is_empty() || position.titlekey.is_empty() || position.page_idx == 0 {
            return Ok(());
        }

        match catalog
            .get_mut(&position.host)
            .and_then(|comics| comics.get_mut(&position.titlekey))
        {
            Some(comic) => {
                comic.lastpage = Some(position.page_idx);
                self.catalog.save(catalog)?;
                debug!("Saved page {} of {}.{}", position.page_idx, position.host, position.titlekey);
            }
            None => debug!("Reader position {}.{} has no record", position.host, position.titlekey),
        }

        Ok(())
    }
}
