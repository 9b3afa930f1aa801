use std::{fmt::Display, num::NonZeroUsize, thread};

use log::{debug, error, info};
use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};
use thiserror::Error;

use crate::{
    plan::Plan,
    provider::{Provider, ProviderError, RemoteRewrite, Rewrite},
    ratelimit::SlidingWindowLimiter,
};

/// An executor applies a [`Plan`] to a provider.
///
/// All deletions are performed first, then all creations. Within each group, calls are spread over a pool of
/// worker threads, and every call waits for the rate limiter before being issued.
pub struct Executor<'a> {
    provider: &'a (dyn Provider + Sync),
    limiter: &'a SlidingWindowLimiter,
    pool: ThreadPool,
}

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("unable to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// A single change made to a provider
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Create(Rewrite),
    Delete(RemoteRewrite),
}
impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Create(r) => write!(f, "create {}", r),
            Action::Delete(r) => write!(f, "delete {}", r),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct RunResult {
    pub successes: Vec<Action>,
    pub failures: Vec<(Action, ProviderError)>,
}

impl<'a> Executor<'a> {
    /// Create a new executor with one worker per available CPU
    pub fn try_new(
        provider: &'a (dyn Provider + Sync),
        limiter: &'a SlidingWindowLimiter,
    ) -> Result<Executor<'a>, ExecutorError> {
        let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        Executor::with_workers(provider, limiter, workers)
    }

    pub fn with_workers(
        provider: &'a (dyn Provider + Sync),
        limiter: &'a SlidingWindowLimiter,
        workers: usize,
    ) -> Result<Executor<'a>, ExecutorError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("executor-{}", i))
            .build()?;
        debug!("Started executor with {} workers", pool.current_num_threads());
        Ok(Executor {
            provider,
            limiter,
            pool,
        })
    }

    pub fn run(&self, plan: Plan) -> RunResult {
        let mut result = RunResult::default();

        info!("Deleting {} rewrites", plan.delete_actions.len());
        let deletions = plan
            .delete_actions
            .into_iter()
            .map(Action::Delete)
            .collect::<Vec<_>>();
        self.apply_all(deletions, &mut result);

        info!("Creating {} rewrites", plan.create_actions.len());
        let creations = plan
            .create_actions
            .into_iter()
            .map(Action::Create)
            .collect::<Vec<_>>();
        self.apply_all(creations, &mut result);

        result
    }

    // Run a group of actions on the pool and wait for all of them to complete
    fn apply_all(&self, actions: Vec<Action>, result: &mut RunResult) {
        let outcomes = self.pool.install(|| {
            actions
                .into_par_iter()
                .map(|action| {
                    let outcome = self.apply(&action);
                    (action, outcome)
                })
                .collect::<Vec<_>>()
        });

        for (action, outcome) in outcomes {
            match outcome {
                Ok(_) => result.successes.push(action),
                Err(e) => {
                    error!("Failed to {}: {}", action, e);
                    result.failures.push((action, e));
                }
            }
        }
    }

    fn apply(&self, action: &Action) -> Result<(), ProviderError> {
        self.limiter.acquire();
        debug!("Applying action: {}", action);
        match action {
            Action::Create(r) => self.provider.create_rewrite(r),
            Action::Delete(r) => self.provider.delete_rewrite(&r.id),
        }
    }
}
