//! Fan-out/fan-in runner for per-item remote actions.
//!
//! All actions of one call run on the caller's task and interleave at their
//! await points. Dropping a future cancels it, so the runner always drives
//! every action to completion before reporting; the first failure observed
//! (in completion order) is the one surfaced.

use std::future::Future;

use futures::StreamExt;
use futures::stream::{self, FuturesUnordered};

use crate::error::{BulkError, MigrateError};

/// How many item actions may be in flight at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrencyPolicy {
    #[default]
    Unbounded,
    Limited(usize),
}

impl ConcurrencyPolicy {
    /// `0` means unbounded.
    pub fn from_limit(limit: usize) -> Self {
        match limit {
            0 => ConcurrencyPolicy::Unbounded,
            n => ConcurrencyPolicy::Limited(n),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BulkRunner {
    policy: ConcurrencyPolicy,
}

impl BulkRunner {
    pub fn new(policy: ConcurrencyPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ConcurrencyPolicy {
        self.policy
    }

    /// Run `action` once per item and wait for all of them to settle.
    ///
    /// `operation` labels the aggregate error.
    pub async fn run_all<I, T, F, Fut, E>(
        &self,
        operation: &str,
        items: I,
        action: F,
    ) -> Result<(), BulkError>
    where
        I: IntoIterator<Item = T>,
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Into<MigrateError>,
    {
        let futures = items.into_iter().map(&action);

        let outcomes: Vec<Result<(), E>> = match self.policy {
            ConcurrencyPolicy::Unbounded | ConcurrencyPolicy::Limited(0) => {
                futures.collect::<FuturesUnordered<_>>().collect().await
            }
            ConcurrencyPolicy::Limited(limit) => {
                stream::iter(futures).buffer_unordered(limit).collect().await
            }
        };

        let total = outcomes.len();
        let mut failed = 0;
        let mut first = None;
        for outcome in outcomes {
            if let Err(e) = outcome {
                failed += 1;
                if first.is_none() {
                    first = Some(e.into());
                }
            }
        }

        match first {
            None => Ok(()),
            Some(first) => {
                tracing::debug!(operation, failed, total, "bulk operation failed");
                Err(BulkError {
                    operation: operation.to_string(),
                    failed,
                    total,
                    first: Box::new(first),
                })
            }
        }
    }
}
