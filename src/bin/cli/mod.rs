use std::{num::NonZeroUsize, time::Duration};

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use nextdns4me::job::JobConfig;

macro_rules! env_prefix {
    () => {
        "NEXTDNS4ME_"
    };
}

#[derive(Clone, PartialEq, Eq, Hash, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Where the target rewrites come from. internal: dns4me hosts list plus custom records, external: custom records only
    // Checked by the job, an invalid value is reported through the webhook
    #[arg(
        short = 'r',
        long,
        required = true,
        value_name = "internal|external",
        env = concat!(env_prefix!(), "RUN")
    )]
    pub run: String,

    /// ID of the NextDNS profile ("configuration") whose rewrites are managed
    #[arg(long, required = true, value_name = "PROFILE", env = "NEXTDNS_CONFIG")]
    pub nextdns_profile: String,

    /// NextDNS API key to authenticate with
    #[arg(
        long,
        required = true,
        value_name = "API_KEY",
        env = "NEXTDNS_APIKEY",
        hide_env_values = true
    )]
    pub nextdns_api_key: String,

    /// dns4me API key used to download the hosts list
    #[arg(
        long,
        required_if_eq("run", "internal"),
        value_name = "API_KEY",
        env = "DNS4ME_APIKEY",
        hide_env_values = true
    )]
    pub dns4me_api_key: Option<String>,

    /// Custom records in hosts-file syntax (`<ip> <domain> [domain...]`, one entry per line)
    #[arg(
        long,
        required_if_eq("run", "external"),
        value_name = "RECORDS",
        env = "CUSTOM_RECORDS"
    )]
    pub custom_records: Option<String>,

    /// Discord webhook to notify when a run fails
    #[arg(
        long,
        required = true,
        value_name = "URL",
        env = concat!(env_prefix!(), "DISCORD_WEBHOOK_URL"),
        hide_env_values = true
    )]
    pub discord_webhook_url: String,

    /// Base URL of the NextDNS API
    #[arg(
        long,
        default_value = "https://api.nextdns.io",
        value_name = "URL",
        env = concat!(env_prefix!(), "NEXTDNS_API_BASE")
    )]
    pub nextdns_api_base: String,

    /// Base URL of the dns4me API
    #[arg(
        long,
        default_value = "https://dns4me.net/api/v2",
        value_name = "URL",
        env = concat!(env_prefix!(), "DNS4ME_API_BASE")
    )]
    pub dns4me_api_base: String,

    /// Maximum number of changes sent to NextDNS per rate limit period
    #[arg(
        long,
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..),
        value_name = "CALLS",
        env = concat!(env_prefix!(), "RATE_LIMIT_CALLS")
    )]
    pub rate_limit_calls: u64,

    /// Length of the rate limit period in seconds
    #[arg(
        long,
        default_value_t = 60,
        value_name = "SECONDS",
        env = concat!(env_prefix!(), "RATE_LIMIT_PERIOD")
    )]
    pub rate_limit_period: u64,

    /// Set the loglevel of the application
    #[arg(
        value_enum,
        short = 'l',
        long,
        default_value_t = Loglevel::Info,
        value_name = "LEVEL",
        env = concat!(env_prefix!(), "LOGLEVEL")
    )]
    pub loglevel: Loglevel,

    /// Do not make any changes to the rewrites, only show what would happen
    #[arg(
        long,
        short = 'd',
        action,
        default_value_t = false,
        env = concat!(env_prefix!(), "DRY_RUN")
    )]
    pub dry_run: bool,
}

impl Cli {
    pub fn job_config(&self) -> JobConfig<'_> {
        JobConfig {
            run: &self.run,
            nextdns_api_base: &self.nextdns_api_base,
            nextdns_profile: &self.nextdns_profile,
            nextdns_api_key: &self.nextdns_api_key,
            dns4me_api_base: &self.dns4me_api_base,
            dns4me_api_key: self.dns4me_api_key.as_deref(),
            custom_records: self.custom_records.as_deref(),
            discord_webhook_url: &self.discord_webhook_url,
            rate_limit_calls: usize::try_from(self.rate_limit_calls)
                .ok()
                .and_then(NonZeroUsize::new)
                .unwrap_or(NonZeroUsize::MIN),
            rate_limit_period: Duration::from_secs(self.rate_limit_period),
            dry_run: self.dry_run,
        }
    }
}

// Keys and the webhook URL must not end up in logs
impl std::fmt::Debug for Cli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cli")
            .field("run", &self.run)
            .field("nextdns_profile", &self.nextdns_profile)
            .field("custom_records", &self.custom_records)
            .field("nextdns_api_base", &self.nextdns_api_base)
            .field("dns4me_api_base", &self.dns4me_api_base)
            .field("rate_limit_calls", &self.rate_limit_calls)
            .field("rate_limit_period", &self.rate_limit_period)
            .field("loglevel", &self.loglevel)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

/// Used to set the applications loglevel
// This is essentially a re-creation of log:Level. However, that enum doesn't derive ValueEnum, so we have to do it manually here
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, ValueEnum)]
pub enum Loglevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}
impl From<Loglevel> for LevelFilter {
    fn from(ll: Loglevel) -> Self {
        match ll {
            Loglevel::Error => LevelFilter::Error,
            Loglevel::Warn => LevelFilter::Warn,
            Loglevel::Info => LevelFilter::Info,
            Loglevel::Debug => LevelFilter::Debug,
            Loglevel::Trace => LevelFilter::Trace,
        }
    }
}
