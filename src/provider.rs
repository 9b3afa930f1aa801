//! Access to the DNS service that stores the rewrites we manage.
//!
//! Each provider implements the [`Provider`] trait.
//! The following providers are currently available:
//! - [`NextDnsProvider`]: Rewrites of a NextDNS profile

mod nextdns;

pub use nextdns::{NextDnsProvider, NextDnsProviderConfig};

use std::fmt::Display;

#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Deserializer, Serialize};

/// A provider is a DNS service such as NextDNS that serves rewrites to clients.
/// It implements a few basic methods to read and modify these rewrites.
#[cfg_attr(test, automock)]
pub trait Provider {
    /// Returns whether this provider supports running in dry-run mode, with no changes being made
    fn supports_dry_run(&self) -> bool;
    fn set_dry_run(&mut self, dry_run: bool);

    /// Get all rewrites currently registered with the provider
    fn rewrites(&self) -> Result<Vec<RemoteRewrite>, ProviderError>;

    /// Create a single rewrite
    fn create_rewrite(&self, rewrite: &Rewrite) -> Result<(), ProviderError>;

    /// Delete a single rewrite by its provider-assigned id
    fn delete_rewrite(&self, id: &str) -> Result<(), ProviderError>;
}

// Generic error returned by a provider action
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderError {
    msg: String,
}
impl Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.msg.as_str())
    }
}
impl std::error::Error for ProviderError {}

impl From<String> for ProviderError {
    fn from(s: String) -> Self {
        ProviderError { msg: s }
    }
}
impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError { msg: e.to_string() }
    }
}

/// A DNS rewrite, mapping a domain name to an address.
///
/// Two rewrites are the same if both `name` and `content` match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rewrite {
    pub name: String,
    pub content: String,
}
impl Display for Rewrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.name, self.content)
    }
}

/// A [`Rewrite`] as stored by a provider, carrying the id the provider assigned to it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct RemoteRewrite {
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    #[serde(flatten)]
    pub rewrite: Rewrite,
}
impl Display for RemoteRewrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.rewrite, self.id)
    }
}

// Ids are opaque, accept them as JSON strings or numbers
fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
