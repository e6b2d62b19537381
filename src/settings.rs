use crate::error::{ComicSubError, Result};
use crate::traits::SettingsStore;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

fn segments(path: &str) -> Result<Vec<&str>> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|part| part.is_empty()) {
        return Err(ComicSubError::invalid_key_path(path));
    }
    Ok(parts)
}

fn lookup<'a>(root: &'a Value, path: &str) -> Result<Option<&'a Value>> {
    let mut node = root;
    for part in segments(path)? {
        match node.get(part) {
            Some(child) => node = child,
            None => return Ok(None),
        }
    }
    Ok(Some(node))
}

/// Replaces the subtree at `path`, creating (or overwriting non-object)
/// intermediate nodes on the way down.
fn assign(root: &mut Value, path: &str, value: Value) -> Result<()> {
    let parts = segments(path)?;
    assign_parts(root, &parts, value);
    Ok(())
}

fn assign_parts(node: &mut Value, parts: &[&str], value: Value) {
    match parts.split_first() {
        None => *node = value,
        Some((head, rest)) => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            if let Value::Object(map) = node {
                let child = map.entry(head.to_string()).or_insert(Value::Null);
                assign_parts(child, rest, value);
            }
        }
    }
}

fn lock(tree: &Mutex<Value>) -> MutexGuard<'_, Value> {
    tree.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Settings persisted as one JSON document, rewritten on every `set`.
pub struct JsonSettings {
    path: PathBuf,
    tree: Mutex<Value>,
}

impl JsonSettings {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let tree = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                Value::Object(Map::new())
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            info!("Settings file {:?} not found, starting empty", path);
            Value::Object(Map::new())
        };

        Ok(Self {
            path,
            tree: Mutex::new(tree),
        })
    }

    fn flush(&self, tree: &Value) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(tree)?)?;
        debug!("Settings written to {:?}", self.path);
        Ok(())
    }
}

impl SettingsStore for JsonSettings {
    fn has(&self, path: &str) -> Result<bool> {
        Ok(lookup(&lock(&self.tree), path)?.is_some())
    }

    fn get(&self, path: &str) -> Result<Option<Value>> {
        Ok(lookup(&lock(&self.tree), path)?.cloned())
    }

    fn set(&self, path: &str, value: Value) -> Result<()> {
        let mut tree = lock(&self.tree);
        assign(&mut tree, path, value)?;
        self.flush(&tree)
    }
}

/// Settings kept only in memory.
pub struct MemorySettings {
    tree: Mutex<Value>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self {
            tree: Mutex::new(Value::Object(Map::new())),
        }
    }

    pub fn with_value(tree: Value) -> Self {
        Self {
            tree: Mutex::new(tree),
        }
    }

    pub fn snapshot(&self) -> Value {
        lock(&self.tree).clone()
    }
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for MemorySettings {
    fn has(&self, path: &str) -> Result<bool> {
        Ok(lookup(&lock(&self.tree), path)?.is_some())
    }

    fn get(&self, path: &str) -> Result<Option<Value>> {
        Ok(lookup(&lock(&self.tree), path)?.cloned())
    }

    fn set(&self, path: &str, value: Value) -> Result<()> {
        assign(&mut lock(&self.tree), path, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_creates_intermediate_nodes() {
        let settings = MemorySettings::new();
        settings.set("comic.siteA.comicX", json!({ "title": "X" })).unwrap();

        assert!(settings.has("comic").unwrap());
        assert!(settings.has("comic.siteA").unwrap());
        assert!(!settings.has("comic.siteB").unwrap());
        assert_eq!(settings.get("comic.siteA.comicX.title").unwrap(), Some(json!("X")));
    }

    #[test]
    fn test_set_replaces_whole_subtree() {
        let settings = MemorySettings::new();
        settings.set("comic.siteA.comicX", json!({ "title": "X" })).unwrap();
        settings.set("comic", json!({ "siteB": {} })).unwrap();

        assert!(!settings.has("comic.siteA").unwrap());
        assert_eq!(settings.get("comic").unwrap(), Some(json!({ "siteB": {} })));
    }

    #[test]
    fn test_set_through_scalar_overwrites_it() {
        let settings = MemorySettings::with_value(json!({ "comic": 3 }));
        settings.set("comic.siteA", json!({})).unwrap();

        assert_eq!(settings.snapshot(), json!({ "comic": { "siteA": {} } }));
    }

    #[test]
    fn test_rejects_empty_segments() {
        let settings = MemorySettings::new();

        assert!(matches!(settings.get("comic..x"), Err(ComicSubError::InvalidKeyPath(_))));
        assert!(settings.set("", json!(1)).is_err());
    }

    #[test]
    fn test_json_settings_persist_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("settings.json");

        let settings = JsonSettings::open(&path).unwrap();
        assert!(!settings.has("comic").unwrap());
        settings.set("comic.siteA.comicX.subscribed", json!(true)).unwrap();

        let reopened = JsonSettings::open(&path).unwrap();
        assert_eq!(
            reopened.get("comic.siteA.comicX.subscribed").unwrap(),
            Some(json!(true))
        );
    }

    #[test]
    fn test_json_settings_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(JsonSettings::open(&path), Err(ComicSubError::Serialization(_))));
    }
}
