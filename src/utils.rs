use crate::config::HostConfig;
use crate::error::Result;
use reqwest::Client;
use std::time::Duration;

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("ComicSub/0.1 (Comic Subscription Checker)")
            .build()?;

        Ok(Self { client })
    }

    pub async fn get(&self, url: &str, config: &HostConfig) -> Result<String> {
        let mut request = self.client.get(url);

        if let Some(user_agent) = &config.user_agent {
            request = request.header("User-Agent", user_agent);
        }

        if let Some(headers) = &config.headers {
            for (key, value) in headers {
                request = request.header(key, value);
            }
        }

        let response = request.send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

/// Makes `href` absolute against `base`. Protocol-relative links get https.
pub fn absolutize(base: &str, href: &str) -> Result<String> {
    if href.starts_with("//") {
        return Ok(format!("https:{}", href));
    }
    let base = url::Url::parse(base)?;
    Ok(base.join(href)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolutize() {
        assert_eq!(
            absolutize("https://site.test/comic/x", "/comic/x/1").unwrap(),
            "https://site.test/comic/x/1"
        );
        assert_eq!(
            absolutize("https://site.test/comic/x/", "2").unwrap(),
            "https://site.test/comic/x/2"
        );
        assert_eq!(
            absolutize("https://site.test/", "//cdn.test/a.jpg").unwrap(),
            "https://cdn.test/a.jpg"
        );
        assert_eq!(
            absolutize("https://site.test/", "https://other.test/c").unwrap(),
            "https://other.test/c"
        );
        assert!(absolutize("not a url", "/x").is_err());
    }
}
