//! Reporting of fatal failures to an external channel.
//!
//! A [`Notifier`] never fails: delivery problems are logged and otherwise ignored.

use std::time::Duration;

use log::{debug, error};
use reqwest::blocking::Client;

const NOTIFY_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// A channel that messages about failed runs are sent to
pub trait Notifier {
    /// Deliver a message. Errors are logged, not returned
    fn notify(&self, message: &str);
}

/// A [`Notifier`] posting messages to a Discord webhook
pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
}

impl DiscordNotifier {
    pub fn new(webhook_url: &str) -> Result<DiscordNotifier, reqwest::Error> {
        Ok(DiscordNotifier {
            client: Client::builder().timeout(NOTIFY_HTTP_TIMEOUT).build()?,
            webhook_url: webhook_url.to_owned(),
        })
    }
}

impl Notifier for DiscordNotifier {
    fn notify(&self, message: &str) {
        let res = self
            .client
            .post(&self.webhook_url)
            .json(&serde_json::json!({ "content": message }))
            .send()
            .and_then(|r| r.error_for_status());
        match res {
            Ok(r) => debug!("Sent notification to Discord: {}", r.status()),
            Err(e) => error!("Error sending notification to Discord: {}", e),
        }
    }
}
