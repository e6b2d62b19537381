use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub settings: SettingsConfig,
    pub hosts: HashMap<String, HostConfig>,
    pub checker: CheckerConfig,
    pub notifications: NotificationConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// JSON file backing the settings store
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    pub name: String,
    pub base_url: String,
    pub fetcher_type: String,
    pub rate_limit_ms: u64,
    pub user_agent: Option<String>,
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub selectors: SelectorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorsConfig {
    pub chapter_list: String,
    pub chapter_title: String,
    pub chapter_url: String,
    /// Element holding the release group name; chapters without one land in
    /// [`DEFAULT_GROUP`](crate::models::DEFAULT_GROUP).
    pub chapter_group: Option<String>,
    /// Element holding the newest chapter label. Falls back to the first
    /// chapter title in document order.
    pub newest: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    pub interval_minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub app_name: String,
    pub gotify_url: Option<String>,
    pub gotify_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub locale: String,
    pub signal_channel: String,
    pub signal_path: Option<String>,
}

impl Config {
    /// Load `path` (optional) layered with `COMICSUB` environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("COMICSUB").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, content)?;
        Ok(())
    }
}

impl Default for SelectorsConfig {
    fn default() -> Self {
        Self {
            chapter_list: "#chapterlist li".to_string(),
            chapter_title: ".chapternum".to_string(),
            chapter_url: "a".to_string(),
            chapter_group: None,
            newest: None,
        }
    }
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: "data/settings.json".to_string(),
        }
    }
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 30,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            app_name: "Comic Reader".to_string(),
            gotify_url: None,
            gotify_token: None,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            locale: "en".to_string(),
            signal_channel: "comic-update".to_string(),
            signal_path: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut hosts = HashMap::new();

        hosts.insert("eros".to_string(), HostConfig {
            name: "Eros Moon".to_string(),
            base_url: "https://eros-moon.xyz".to_string(),
            fetcher_type: "html".to_string(),
            rate_limit_ms: 1500,
            user_agent: None,
            headers: None,
            selectors: SelectorsConfig::default(),
        });

        Config {
            settings: SettingsConfig::default(),
            hosts,
            checker: CheckerConfig::default(),
            notifications: NotificationConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.ui.signal_channel, "comic-update");
        assert_eq!(config.notifications.app_name, "Comic Reader");
        assert!(config.hosts.contains_key("eros"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.checker.interval_minutes = 5;
        config.ui.locale = "zh-TW".to_string();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.checker.interval_minutes, 5);
        assert_eq!(loaded.ui.locale, "zh-TW");
        assert_eq!(loaded.hosts["eros"].selectors.chapter_list, "#chapterlist li");
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[ui]\nlocale = \"fr\"\n\n[checker]\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.ui.locale, "fr");
        assert_eq!(config.ui.signal_channel, "comic-update");
        assert_eq!(config.checker.interval_minutes, 30);
        assert_eq!(config.settings.path, "data/settings.json");
    }

    #[test]
    fn test_env_overrides_single_key() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("COMICSUB__NOTIFICATIONS__GOTIFY_TOKEN", "env-token");

        let config = Config::load(dir.path().join("absent.toml"));
        std::env::remove_var("COMICSUB__NOTIFICATIONS__GOTIFY_TOKEN");

        let config = config.unwrap();
        assert_eq!(config.notifications.gotify_token.as_deref(), Some("env-token"));
        assert_eq!(config.notifications.app_name, "Comic Reader");
    }
}
