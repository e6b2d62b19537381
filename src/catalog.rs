use crate::error::{ComicSubError, Result};
use crate::models::{Catalog, ComicRecord};
use crate::traits::SettingsStore;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Settings key holding the whole catalog.
pub const CATALOG_KEY: &str = "comic";

/// Settings path of one comic. Both segments must be non-empty and free of
/// `.`, which the settings store reads as nesting.
pub fn comic_key_path(host: &str, titlekey: &str) -> Result<String> {
    let key_path = format!("{}.{}.{}", CATALOG_KEY, host, titlekey);
    for segment in [host, titlekey] {
        if segment.is_empty() || segment.contains('.') {
            return Err(ComicSubError::invalid_key_path(key_path));
        }
    }
    Ok(key_path)
}

/// Typed view of the catalog subtree of a [`SettingsStore`].
///
/// Records that fail to deserialize are reported with a warning and then
/// treated as absent.
#[derive(Clone)]
pub struct CatalogStore {
    settings: Arc<dyn SettingsStore>,
}

impl CatalogStore {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }

    pub fn get_comic(&self, host: &str, titlekey: &str) -> Result<Option<ComicRecord>> {
        let key_path = comic_key_path(host, titlekey)?;
        Ok(self
            .settings
            .get(&key_path)?
            .and_then(|value| parse_comic(&key_path, value)))
    }

    pub fn set_comic(&self, host: &str, titlekey: &str, comic: &ComicRecord) -> Result<()> {
        self.settings
            .set(&comic_key_path(host, titlekey)?, serde_json::to_value(comic)?)
    }

    /// The persisted catalog, or `None` if nothing has been stored yet.
    pub fn load(&self) -> Result<Option<Catalog>> {
        Ok(self.settings.get(CATALOG_KEY)?.map(parse_catalog))
    }

    /// Like [`load`](Self::load), but an absent catalog is created empty and
    /// persisted.
    pub fn load_or_init(&self) -> Result<Catalog> {
        match self.load()? {
            Some(catalog) => Ok(catalog),
            None => {
                let catalog = Catalog::new();
                self.save(&catalog)?;
                Ok(catalog)
            }
        }
    }

    /// Writes every record of `catalog` into the stored subtree. Stored nodes
    /// the catalog does not carry are left in place.
    pub fn save(&self, catalog: &Catalog) -> Result<()> {
        let mut hosts = match self.settings.get(CATALOG_KEY)? {
            Some(Value::Object(hosts)) => hosts,
            _ => Map::new(),
        };

        for (host, comics) in catalog {
            let entry = hosts.entry(host.clone()).or_insert(Value::Null);
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(records) = entry {
                for (titlekey, comic) in comics {
                    records.insert(titlekey.clone(), serde_json::to_value(comic)?);
                }
            }
        }

        self.settings.set(CATALOG_KEY, Value::Object(hosts))
    }
}

fn parse_comic(key_path: &str, value: Value) -> Option<ComicRecord> {
    match serde_json::from_value(value) {
        Ok(comic) => Some(comic),
        Err(e) => {
            warn!("Ignoring malformed comic record at {}: {}", key_path, e);
            None
        }
    }
}

fn parse_catalog(value: Value) -> Catalog {
    let Value::Object(hosts) = value else {
        warn!("Ignoring malformed catalog under {:?}", CATALOG_KEY);
        return Catalog::new();
    };

    let mut catalog = Catalog::new();
    for (host, comics) in hosts {
        let Value::Object(comics) = comics else {
            warn!("Ignoring malformed host entry {}.{}", CATALOG_KEY, host);
            continue;
        };

        let mut entries = BTreeMap::new();
        for (titlekey, raw) in comics {
            let key_path = format!("{}.{}.{}", CATALOG_KEY, host, titlekey);
            if let Some(comic) = parse_comic(&key_path, raw) {
                entries.insert(titlekey, comic);
            }
        }
        catalog.insert(host, entries);
    }
    catalog
}
