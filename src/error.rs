use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComicSubError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Comic not found: {0}")]
    ComicNotFound(String),

    #[error("Invalid settings key path: {0:?}")]
    InvalidKeyPath(String),
}

impl ComicSubError {
    pub fn scraping(msg: impl Into<String>) -> Self {
        Self::Scraping(msg.into())
    }

    pub fn comic_not_found(host: &str, titlekey: &str) -> Self {
        Self::ComicNotFound(format!("{}.{}", host, titlekey))
    }

    pub fn invalid_key_path(path: impl Into<String>) -> Self {
        Self::InvalidKeyPath(path.into())
    }
}

pub type Result<T> = std::result::Result<T, ComicSubError>;
