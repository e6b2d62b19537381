use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Group used for chapters whose source does not name a release group.
pub const DEFAULT_GROUP: &str = "default";

/// `host -> titlekey -> ComicRecord`
pub type Catalog = BTreeMap<String, BTreeMap<String, ComicRecord>>;

/// `group -> chapter key -> ChapterRecord`
pub type ChapterTree = BTreeMap<String, BTreeMap<String, ChapterRecord>>;

/// A stored comic. Unknown fields are rejected, so a settings node that only
/// nests other records is never read as a comic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComicRecord {
    pub title: String,
    pub link: String,
    pub thumbnail: String,
    pub subscribed: bool,
    pub lastread: String,
    #[serde(with = "lastpage_format")]
    pub lastpage: Option<u32>,
    pub chapters: ChapterTree,
    pub chapters_count: usize,
    pub newestchapter: String,
    pub hasupdate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterRecord {
    pub name: String,
    pub ch_link: String,
    #[serde(default)]
    pub read: bool,
}

/// One chapter as reported by a fetcher.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterDescriptor {
    pub name: String,
    pub group: String,
    pub key: String,
    pub link: String,
}

/// Everything a fetcher returns for one comic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterListing {
    pub chapters: Vec<ChapterDescriptor>,
    pub newest: String,
}

/// User-visible alert raised when a comic's chapter count changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
}

/// Where the reader currently is. `page_idx == 0` means nothing to save.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingPosition {
    pub host: String,
    pub titlekey: String,
    pub page_idx: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub fetched: usize,
    pub updated: usize,
    pub failed: usize,
    pub skipped: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl Default for ComicRecord {
    fn default() -> Self {
        Self {
            title: String::new(),
            link: String::new(),
            thumbnail: String::new(),
            subscribed: false,
            lastread: String::new(),
            lastpage: None,
            chapters: ChapterTree::new(),
            chapters_count: 0,
            newestchapter: String::new(),
            hasupdate: true,
        }
    }
}

impl ComicRecord {
    pub fn new(title: &str, link: &str, thumbnail: &str, subscribed: bool) -> Self {
        Self {
            title: title.to_string(),
            link: link.to_string(),
            thumbnail: thumbnail.to_string(),
            subscribed,
            ..Self::default()
        }
    }

    pub fn has_pending_update(&self) -> bool {
        self.subscribed && self.hasupdate
    }
}

impl ChapterDescriptor {
    pub fn new(name: &str, group: &str, key: &str, link: &str) -> Self {
        Self {
            name: name.to_string(),
            group: group.to_string(),
            key: key.to_string(),
            link: link.to_string(),
        }
    }
}

impl SweepReport {
    pub fn start() -> Self {
        let now = Utc::now();
        Self {
            fetched: 0,
            updated: 0,
            failed: 0,
            skipped: 0,
            started_at: now,
            finished_at: now,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }
}

/// Number of comics that are subscribed and flagged with unseen chapters.
pub fn badge_count(catalog: &Catalog) -> usize {
    catalog
        .values()
        .flat_map(|comics| comics.values())
        .filter(|comic| comic.has_pending_update())
        .count()
}

pub fn any_subscribed(catalog: &Catalog) -> bool {
    catalog
        .values()
        .flat_map(|comics| comics.values())
        .any(|comic| comic.subscribed)
}

/// The bookmark is stored as `""` until a page has been recorded.
mod lastpage_format {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Page(u32),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(page) => serializer.serialize_u32(*page),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Page(page) => Some(page),
            Raw::Text(text) => text.trim().parse().ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_record_defaults() {
        let comic = ComicRecord::new("One Piece", "http://a/op", "http://a/op.jpg", false);
        let value = serde_json::to_value(&comic).unwrap();

        assert_eq!(value, json!({
            "title": "One Piece",
            "link": "http://a/op",
            "thumbnail": "http://a/op.jpg",
            "subscribed": false,
            "lastread": "",
            "lastpage": "",
            "chapters": {},
            "chapters_count": 0,
            "newestchapter": "",
            "hasupdate": true
        }));
    }

    #[test]
    fn test_lastpage_accepts_number_and_empty_string() {
        let with_page: ComicRecord = serde_json::from_value(json!({ "lastpage": 12 })).unwrap();
        assert_eq!(with_page.lastpage, Some(12));

        let unset: ComicRecord = serde_json::from_value(json!({ "lastpage": "" })).unwrap();
        assert_eq!(unset.lastpage, None);
    }

    #[test]
    fn test_nesting_node_is_not_a_record() {
        let nested = json!({ "2": { "title": "Vol 2", "subscribed": true } });
        assert!(serde_json::from_value::<ComicRecord>(nested).is_err());
    }

    #[test]
    fn test_badge_count_example() {
        let catalog: Catalog = serde_json::from_value(json!({
            "siteA": {
                "comicX": { "subscribed": true, "hasupdate": true },
                "comicY": { "subscribed": false, "hasupdate": true }
            }
        }))
        .unwrap();

        assert_eq!(badge_count(&catalog), 1);
        assert!(any_subscribed(&catalog));
    }

    #[test]
    fn test_any_subscribed_empty() {
        assert!(!any_subscribed(&Catalog::new()));
        assert_eq!(badge_count(&Catalog::new()), 0);
    }
}
