use crate::config::HostConfig;
use crate::error::{ComicSubError, Result};
use crate::models::{ChapterDescriptor, ChapterListing, DEFAULT_GROUP};
use crate::traits::ChapterFetcher;
use crate::utils::{absolutize, HttpClient};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info};

/// Chapter listing scraped from a comic page with the host's CSS selectors
pub struct HtmlChapterFetcher {
    http_client: HttpClient,
    config: HostConfig,
    limiter: Option<DefaultDirectRateLimiter>,
    key_regex: Regex,
}

impl HtmlChapterFetcher {
    pub fn new(config: HostConfig) -> Result<Self> {
        let limiter = Quota::with_period(Duration::from_millis(config.rate_limit_ms)).map(RateLimiter::direct);
        // Last path segment of the chapter link, ignoring query and fragment
        let key_regex = Regex::new(r"([^/?#]+)/?(?:[?#].*)?$").map_err(|e| ComicSubError::scraping(e.to_string()))?;

        Ok(Self {
            http_client: HttpClient::new()?,
            config,
            limiter,
            key_regex,
        })
    }

    pub fn parse_listing(&self, html: &str, page_url: &str) -> Result<ChapterListing> {
        let selectors = &self.config.selectors;
        let document = Html::parse_document(html);

        let list_selector = parse_selector(&selectors.chapter_list)?;
        let title_selector = parse_selector(&selectors.chapter_title)?;
        let url_selector = parse_selector(&selectors.chapter_url)?;
        let group_selector = selectors.chapter_group.as_deref().map(parse_selector).transpose()?;

        let mut chapters = Vec::new();
        for (index, element) in document.select(&list_selector).enumerate() {
            let name = element
                .select(&title_selector)
                .next()
                .map(|el| element_text(&el))
                .unwrap_or_default();

            let href = element
                .select(&url_selector)
                .next()
                .and_then(|el| el.value().attr("href"))
                .unwrap_or_default();

            if name.is_empty() || href.is_empty() {
                debug!("[HTML FETCHER] Skipping incomplete chapter entry #{}", index);
                continue;
            }

            let link = absolutize(page_url, href)?;

            let group = group_selector
                .as_ref()
                .and_then(|sel| element.select(sel).next())
                .map(|el| element_text(&el))
                .filter(|group| !group.is_empty())
                .unwrap_or_else(|| DEFAULT_GROUP.to_string());

            let key = self
                .key_regex
                .captures(&link)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| index.to_string());

            chapters.push(ChapterDescriptor { name, group, key, link });
        }

        let newest = match &selectors.newest {
            Some(newest) => {
                let newest_selector = parse_selector(newest)?;
                document.select(&newest_selector).next().map(|el| element_text(&el))
            }
            None => None,
        }
        .or_else(|| chapters.first().map(|chapter| chapter.name.clone()))
        .unwrap_or_default();

        Ok(ChapterListing { chapters, newest })
    }
}

#[async_trait::async_trait]
impl ChapterFetcher for HtmlChapterFetcher {
    async fn grab_chapters(&self, titlekey: &str, link: &str) -> Result<ChapterListing> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        info!("[HTML FETCHER] Fetching chapters of {} from: {}", titlekey, link);
        let html = self.http_client.get(link, &self.config).await?;
        debug!("[HTML FETCHER] HTML length: {}", html.len());

        let listing = self.parse_listing(&html, link)?;
        info!("[HTML FETCHER] Found {} chapters for {}", listing.chapters.len(), titlekey);

        Ok(listing)
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ComicSubError::scraping(format!("invalid selector {:?}: {:?}", selector, e)))
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
