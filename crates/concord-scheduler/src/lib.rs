// SPDX-License-Identifier: Apache-2.0
//! A small bounded-parallelism primitive: callers submit a batch of async
//! closures, the scheduler runs up to `max_concurrency` of them at a time,
//! and the call does not return until every closure in the batch has
//! finished — a join-all barrier, not a queue you can stream results out of.
//! This is exactly what the orchestrator needs for epoch fan-out (§4.9: "await
//! completion of the full fan-out before proceeding") and the Mutator's
//! shadow-trial fan-out (§4.6 Phase B).
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

pub struct Scheduler {
    max_concurrency: usize,
}

impl Scheduler {
    pub fn new(max_concurrency: usize) -> Self {
        Self { max_concurrency: max_concurrency.max(1) }
    }

    /// Run every task in `tasks` with at most `max_concurrency` running at
    /// once, returning results in the same order they were submitted. A
    /// task that panics is logged and its slot contributes no result —
    /// callers that need index-stable output should have their closures
    /// return a `Result`/`Option` and check for gaps themselves; this keeps
    /// one runaway episode from taking down an entire epoch.
    pub async fn run_all<F, Fut, T>(&self, tasks: Vec<F>) -> Vec<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut set = JoinSet::new();

        for (index, task) in tasks.into_iter().enumerate() {
            let permit = semaphore.clone();
            set.spawn(async move {
                let _permit = permit.acquire_owned().await.expect("scheduler semaphore closed");
                (index, task().await)
            });
        }

        let mut slots: Vec<Option<T>> = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, value)) => {
                    if slots.len() <= index {
                        slots.resize_with(index + 1, || None);
                    }
                    slots[index] = Some(value);
                }
                Err(e) => warn!(error = %e, "fan-out task panicked; dropping its slot"),
            }
        }

        slots.into_iter().flatten().collect()
    }
}
