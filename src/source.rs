//! A way to retrieve the hosts-formatted text that describes the rewrites we want.
//! Each source implements the [`HostsSource`] trait.
//!
//! The following sources are currently available:
//! - [`CustomSource`]: Returns a static list of custom records
//! - [`Dns4meSource`]: Downloads the dns4me hosts list and appends custom records to it

mod custom;
mod dns4me;

pub use custom::CustomSource;
pub use dns4me::{Dns4meSource, Dns4meSourceConfig};

use std::fmt::Display;

/// A `HostsSource` can be used to retrieve hosts-file formatted text, see [`crate::hosts`].
pub trait HostsSource {
    fn hosts(&self) -> Result<String, SourceError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceError {
    msg: String,
}
impl Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.msg)
    }
}
impl std::error::Error for SourceError {}
impl From<String> for SourceError {
    fn from(s: String) -> Self {
        SourceError { msg: s }
    }
}
impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        SourceError { msg: e.to_string() }
    }
}
