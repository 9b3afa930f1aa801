use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;

use super::{HostsSource, SourceError};

const DNS4ME_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// A source that downloads the hosts list of a dns4me account and appends a set of custom records to it.
///
/// This source does not perform any sort of caching, each call to [`HostsSource::hosts()`] will download the list again.
///
/// To create a new source, use the [`Dns4meSource::from_config()`] function
#[non_exhaustive]
pub struct Dns4meSource {
    client: Client,
    hosts_url: String,
    custom_records: String,
}

/// Configuration for [`Dns4meSource`]. Must be supplied when creating a [`Dns4meSource`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Dns4meSourceConfig<'a> {
    /// Base URL of the API, without a trailing slash. Usually `https://dns4me.net/api/v2`
    pub api_base: &'a str,
    /// The dns4me API key, which is part of the hosts URL
    pub api_key: &'a str,
    /// Hosts-formatted records to append to the downloaded list
    pub custom_records: &'a str,
}

// The API key is part of the URL, so neither may be printed
impl std::fmt::Debug for Dns4meSourceConfig<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dns4meSourceConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &"<REDACTED>")
            .field("custom_records", &self.custom_records)
            .finish()
    }
}

impl HostsSource for Dns4meSource {
    fn hosts(&self) -> Result<String, SourceError> {
        debug!("Downloading dns4me hosts list");
        let hosts = self
            .client
            .get(&self.hosts_url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| e.without_url())?;
        debug!("Downloaded {} lines from dns4me", hosts.lines().count());

        Ok(format!("{}\n{}", hosts, self.custom_records)
            .trim()
            .to_owned())
    }
}

impl Dns4meSource {
    /// Create a new [`Dns4meSource`] with the supplied configuration.
    /// Returns an error if the HTTP client could not be initialized
    pub fn from_config(config: &Dns4meSourceConfig) -> Result<Dns4meSource, SourceError> {
        let client = Client::builder().timeout(DNS4ME_HTTP_TIMEOUT).build()?;
        Ok(Dns4meSource {
            client,
            hosts_url: format!(
                "{}/get_hosts/hosts/{}",
                config.api_base.trim_end_matches('/'),
                config.api_key
            ),
            custom_records: config.custom_records.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    async fn fetch(server: &MockServer, custom_records: &'static str) -> Result<String, SourceError> {
        let api_base = server.uri();
        tokio::task::spawn_blocking(move || {
            Dns4meSource::from_config(&Dns4meSourceConfig {
                api_base: &api_base,
                api_key: "key123",
                custom_records,
            })?
            .hosts()
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn should_append_custom_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_hosts/hosts/key123"))
            .respond_with(ResponseTemplate::new(200).set_body_string("1.1.1.1 a.example\n"))
            .expect(1)
            .mount(&server)
            .await;

        let hosts = fetch(&server, "2.2.2.2 b.example").await.unwrap();
        assert_eq!(hosts, "1.1.1.1 a.example\n\n2.2.2.2 b.example");
    }

    #[tokio::test]
    async fn should_trim_without_custom_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("1.1.1.1 a.example\n"))
            .mount(&server)
            .await;

        let hosts = fetch(&server, "").await.unwrap();
        assert_eq!(hosts, "1.1.1.1 a.example");
    }

    #[tokio::test]
    async fn should_fail_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = fetch(&server, "").await.unwrap_err();
        assert!(!err.to_string().contains("key123"));
    }
}
