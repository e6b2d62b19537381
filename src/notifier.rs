use crate::config::NotificationConfig;
use crate::error::Result;
use crate::models::Notification;
use crate::traits::Notifier;
use tracing::info;

/// Writes notifications to the log
#[derive(Clone, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        info!("🔔 {}: {}", notification.title, notification.body);
        Ok(())
    }
}

/// Pushes notifications to a Gotify server
#[derive(Clone)]
pub struct GotifyNotifier {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl GotifyNotifier {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            token,
        }
    }
}

#[async_trait::async_trait]
impl Notifier for GotifyNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        self.client
            .post(format!("{}/message", self.base_url.trim_end_matches('/')))
            .query(&[("token", self.token.as_str())])
            .json(&serde_json::json!({
                "title": notification.title,
                "message": notification.body,
                "extras": {
                    "client::notification": {
                        "bigImageUrl": notification.icon
                    }
                }
            }))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

/// Gotify when both url and token are configured, the log otherwise.
pub fn from_config(config: &NotificationConfig) -> Box<dyn Notifier> {
    match (&config.gotify_url, &config.gotify_token) {
        (Some(url), Some(token)) => Box::new(GotifyNotifier::new(url.clone(), token.clone())),
        _ => Box::new(LogNotifier),
    }
}
