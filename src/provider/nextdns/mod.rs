use std::time::Duration;

use log::{debug, info, trace};
use reqwest::{
    blocking::Client,
    header::{HeaderMap, HeaderValue},
};
use serde::Deserialize;

use super::{Provider, ProviderError, RemoteRewrite, Rewrite};

const NEXTDNS_API_KEY_HEADER: &str = "x-api-key";
const NEXTDNS_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// A [`Provider`] connecting to the NextDNS API for listing, creating and deleting the rewrites of a single profile.
///
/// To create a provider, use the [`NextDnsProvider::from_config()`] function.
#[non_exhaustive]
pub struct NextDnsProvider {
    client: Client,
    rewrites_url: String,
    dry_run: bool,
}

/// Configuration object for a [`NextDnsProvider`]. Must be supplied when creating a provider.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct NextDnsProviderConfig<'a> {
    /// Base URL of the API, without a trailing slash. Usually `https://api.nextdns.io`
    pub api_base: &'a str,
    /// The id of the profile ("configuration") whose rewrites are managed
    pub profile: &'a str,
    /// The API key to authenticate with
    pub api_key: &'a str,
}

// Never print the API key
impl std::fmt::Debug for NextDnsProviderConfig<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NextDnsProviderConfig")
            .field("api_base", &self.api_base)
            .field("profile", &self.profile)
            .field("api_key", &"<REDACTED>")
            .finish()
    }
}

impl std::fmt::Debug for NextDnsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NextDnsProvider")
            .field("rewrites_url", &self.rewrites_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct RewritesResponse {
    data: Vec<RemoteRewrite>,
}

impl NextDnsProvider {
    pub fn from_config(config: &NextDnsProviderConfig) -> Result<NextDnsProvider, ProviderError> {
        let mut key = HeaderValue::from_str(config.api_key)
            .map_err(|e| format!("Invalid NextDNS API key: {}", e))?;
        key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(NEXTDNS_API_KEY_HEADER, key);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(NEXTDNS_HTTP_TIMEOUT)
            .build()?;

        Ok(NextDnsProvider {
            client,
            rewrites_url: format!(
                "{}/profiles/{}/rewrites",
                config.api_base.trim_end_matches('/'),
                config.profile
            ),
            dry_run: false,
        })
    }
}

impl Provider for NextDnsProvider {
    fn supports_dry_run(&self) -> bool {
        true
    }

    fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    fn rewrites(&self) -> Result<Vec<RemoteRewrite>, ProviderError> {
        debug!("Reading rewrites from {}", self.rewrites_url);
        let rewrites = self
            .client
            .get(&self.rewrites_url)
            .send()?
            .error_for_status()?
            .json::<RewritesResponse>()?
            .data;
        trace!("Collected rewrites: {:?}", rewrites);
        Ok(rewrites)
    }

    fn create_rewrite(&self, rewrite: &Rewrite) -> Result<(), ProviderError> {
        if self.dry_run {
            info!("Dry-run: would create rewrite {}", rewrite);
            return Ok(());
        }
        let response = self
            .client
            .post(&self.rewrites_url)
            .json(rewrite)
            .send()?
            .error_for_status()?;
        debug!("Created rewrite {}: {}", rewrite, response.status());
        Ok(())
    }

    fn delete_rewrite(&self, id: &str) -> Result<(), ProviderError> {
        if self.dry_run {
            info!("Dry-run: would delete rewrite with id {}", id);
            return Ok(());
        }
        let response = self
            .client
            .delete(format!("{}/{}", self.rewrites_url, id))
            .send()?
            .error_for_status()?;
        debug!("Deleted rewrite with id {}: {}", id, response.status());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        matchers::{body_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    const PROFILE: &str = "abc123";
    const KEY: &str = "secret-key";

    // The blocking client has to be built, used and dropped outside of the async runtime
    async fn with_provider<T, F>(server: &MockServer, f: F) -> T
    where
        F: FnOnce(NextDnsProvider) -> T + Send + 'static,
        T: Send + 'static,
    {
        let api_base = server.uri();
        tokio::task::spawn_blocking(move || {
            let provider = NextDnsProvider::from_config(&NextDnsProviderConfig {
                api_base: &api_base,
                profile: PROFILE,
                api_key: KEY,
            })
            .unwrap();
            f(provider)
        })
        .await
        .unwrap()
    }

    fn rewrite(name: &str, content: &str) -> Rewrite {
        Rewrite {
            name: name.to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn should_return_rewrites() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/profiles/abc123/rewrites"))
            .and(header("X-Api-Key", KEY))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"id": "1a", "name": "a.example", "content": "1.1.1.1"},
                    {"id": "2b", "name": "b.example", "content": "2001:db8::1", "type": "AAAA"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let rewrites = with_provider(&server, |p| p.rewrites()).await.unwrap();

        assert_eq!(
            rewrites,
            vec![
                RemoteRewrite {
                    id: "1a".to_string(),
                    rewrite: rewrite("a.example", "1.1.1.1"),
                },
                RemoteRewrite {
                    id: "2b".to_string(),
                    rewrite: rewrite("b.example", "2001:db8::1"),
                },
            ]
        );
    }

    #[tokio::test]
    async fn should_return_rewrites_with_numeric_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/profiles/abc123/rewrites"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"id": 1, "name": "a.x", "content": "1.1.1.1"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let rewrites = with_provider(&server, |p| p.rewrites()).await.unwrap();

        assert_eq!(
            rewrites,
            vec![RemoteRewrite {
                id: "1".to_string(),
                rewrite: rewrite("a.x", "1.1.1.1"),
            }]
        );
    }

    #[tokio::test]
    async fn should_fail_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let res = with_provider(&server, |p| p.rewrites()).await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn should_create_rewrite() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/profiles/abc123/rewrites"))
            .and(header("X-Api-Key", KEY))
            .and(body_json(
                serde_json::json!({"name": "a.example", "content": "1.2.3.4"}),
            ))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let res = with_provider(&server, |p| {
            p.create_rewrite(&rewrite("a.example", "1.2.3.4"))
        })
        .await;
        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn should_delete_rewrite() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/profiles/abc123/rewrites/1a"))
            .and(header("X-Api-Key", KEY))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let res = with_provider(&server, |p| p.delete_rewrite("1a")).await;
        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn should_report_failed_delete() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let res = with_provider(&server, |p| p.delete_rewrite("missing")).await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn should_support_dry_run() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (supported, created, deleted) = with_provider(&server, |mut p| {
            let supported = p.supports_dry_run();
            p.set_dry_run(true);
            (
                supported,
                p.create_rewrite(&rewrite("a.example", "1.2.3.4")),
                p.delete_rewrite("1a"),
            )
        })
        .await;
        assert!(supported);
        assert!(created.is_ok());
        assert!(deleted.is_ok());
    }

    #[test]
    fn should_not_print_api_key() {
        let config = NextDnsProviderConfig {
            api_base: "https://api.nextdns.io",
            profile: PROFILE,
            api_key: KEY,
        };
        assert!(!format!("{:?}", config).contains(KEY));
    }
}
