//! Main crate for the `nextdns4me` application.
//!
//! `nextdns4me` keeps the rewrite list of a NextDNS profile in sync with a hosts-style record list,
//! either fetched from dns4me and merged with custom records, or made of custom records only.
//!
//! The following modules might be of interest if you want to add new functionality:
//! - [`provider`]s hold the current rewrites and accept changes to them
//! - [`source`]s produce the hosts text that describes the target state, [`hosts`] turns it into rewrites
//! - [`plan`] computes the changes needed to go from the current to the target state
//! - [`executor`] applies a plan concurrently, throttled by a [`ratelimit`] limiter
//! - [`notify`] reports fatal failures to an external channel
//! - [`job`] ties all of the above together into a single run

#![allow(clippy::uninlined_format_args)]

pub mod executor;
pub mod hosts;
pub mod job;
pub mod notify;
pub mod plan;
pub mod provider;
pub mod ratelimit;
pub mod source;
