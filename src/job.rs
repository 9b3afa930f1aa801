//! A single synchronisation run: fetch both states, compare them and apply the difference.
//!
//! Fatal failures are logged and reported through a [`DiscordNotifier`] before being returned.
//! Failures of individual changes are part of the [`RunResult`] and do not fail the run.

use std::{num::NonZeroUsize, str::FromStr, time::Duration};

use log::{error, info};
use thiserror::Error;

use crate::{
    executor::{Executor, ExecutorError, RunResult},
    hosts,
    notify::{DiscordNotifier, Notifier},
    plan::Plan,
    provider::{NextDnsProvider, NextDnsProviderConfig, Provider, ProviderError},
    ratelimit::SlidingWindowLimiter,
    source::{CustomSource, Dns4meSource, Dns4meSourceConfig, HostsSource, SourceError},
};

/// Where the target rewrites come from
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RunMode {
    /// Download the dns4me hosts list and merge it with the custom records
    Internal,
    /// Use the custom records only
    External,
}
impl FromStr for RunMode {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "internal" => Ok(RunMode::Internal),
            "external" => Ok(RunMode::External),
            _ => Err(JobError::RunMode(s.to_owned())),
        }
    }
}
/// Everything a run needs to know. Usually built from the command line
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct JobConfig<'a> {
    /// Run mode as given by the user, see [`RunMode`]
    pub run: &'a str,
    pub nextdns_api_base: &'a str,
    pub nextdns_profile: &'a str,
    pub nextdns_api_key: &'a str,
    pub dns4me_api_base: &'a str,
    pub dns4me_api_key: Option<&'a str>,
    pub custom_records: Option<&'a str>,
    pub discord_webhook_url: &'a str,
    pub rate_limit_calls: NonZeroUsize,
    pub rate_limit_period: Duration,
    pub dry_run: bool,
}

// Keys and the webhook URL must not end up in logs
impl std::fmt::Debug for JobConfig<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobConfig")
            .field("run", &self.run)
            .field("nextdns_api_base", &self.nextdns_api_base)
            .field("nextdns_profile", &self.nextdns_profile)
            .field("dns4me_api_base", &self.dns4me_api_base)
            .field("custom_records", &self.custom_records)
            .field("rate_limit_calls", &self.rate_limit_calls)
            .field("rate_limit_period", &self.rate_limit_period)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

/// Failures that abort a run
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Invalid run mode '{0}'. Please use 'internal' or 'external'.")]
    RunMode(String),
    #[error("Error setting up NextDNS provider: {0}")]
    Provider(ProviderError),
    #[error("Error fetching current rewrites from NextDNS: {0}")]
    CurrentRewrites(ProviderError),
    #[error("Error fetching or processing dns4me hosts: {0}")]
    Hosts(SourceError),
    #[error("Error applying changes: {0}")]
    Executor(#[from] ExecutorError),
}

/// Perform a run and report any fatal error through the configured webhook
pub fn run_job(config: &JobConfig) -> Result<RunResult, JobError> {
    sync(config).map_err(|e| {
        error!("{}", e);
        match DiscordNotifier::new(config.discord_webhook_url) {
            Ok(notifier) => notifier.notify(&e.to_string()),
            Err(ne) => error!("Unable to create Discord notifier: {}", ne),
        }
        e
    })
}

fn get_provider(config: &JobConfig) -> Result<NextDnsProvider, ProviderError> {
    let mut provider = NextDnsProvider::from_config(&NextDnsProviderConfig {
        api_base: config.nextdns_api_base,
        profile: config.nextdns_profile,
        api_key: config.nextdns_api_key,
    })?;
    if config.dry_run && provider.supports_dry_run() {
        provider.set_dry_run(true);
    }
    Ok(provider)
}

fn get_source(config: &JobConfig, mode: RunMode) -> Result<Box<dyn HostsSource>, SourceError> {
    let custom_records = config.custom_records.unwrap_or_default();
    match mode {
        RunMode::Internal => {
            info!("Internal run - fetching dns4me and merging with custom records");
            let api_key = config
                .dns4me_api_key
                .ok_or_else(|| "no dns4me API key configured".to_string())?;
            Ok(Box::new(Dns4meSource::from_config(&Dns4meSourceConfig {
                api_base: config.dns4me_api_base,
                api_key,
                custom_records,
            })?))
        }
        RunMode::External => {
            info!("External run - updating NextDNS rewrites with custom records only");
            Ok(Box::new(CustomSource::new(custom_records)))
        }
    }
}

fn sync(config: &JobConfig) -> Result<RunResult, JobError> {
    let mode: RunMode = config.run.parse()?;

    let provider = get_provider(config).map_err(JobError::Provider)?;
    info!("Connected to NextDNS");

    let current = provider.rewrites().map_err(JobError::CurrentRewrites)?;
    info!("Retrieved {} rewrites from NextDNS", current.len());

    let source = get_source(config, mode).map_err(JobError::Hosts)?;
    let target = hosts::parse_records(&source.hosts().map_err(JobError::Hosts)?);
    info!("Parsed {} target rewrites", target.len());

    let plan = Plan::generate(&current, &target);
    info!("Creating the following rewrites: {:?}", plan.create_actions);
    info!("Deleting the following rewrites: {:?}", plan.delete_actions);
    if plan.is_empty() {
        info!("Nothing to do");
        return Ok(RunResult::default());
    }

    let limiter = SlidingWindowLimiter::new(config.rate_limit_calls, config.rate_limit_period);
    let executor = Executor::try_new(&provider, &limiter)?;
    info!("Applying plan");
    let result = executor.run(plan);

    if result.failures.is_empty() {
        info!(
            "Plan applied. {} changes made, no errors were encountered",
            result.successes.len()
        );
    } else {
        error!(
            "The following errors were encountered while applying changes: {:?}",
            result.failures
        );
    }

    info!("Completed");
    Ok(result)
}
