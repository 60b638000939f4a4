//! Bounded set of detached tasks
//!
//! Buys and sells run outside the stream loops. Each task holds a semaphore
//! permit while it runs; when none is free the caller waits, and says so in
//! the log, instead of queueing unbounded work.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Semaphore, TryAcquireError};
use tokio::task::{JoinError, JoinSet};
use tracing::{error, warn};

pub struct TaskSet {
    tasks: Mutex<JoinSet<()>>,
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl TaskSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            tasks: Mutex::new(JoinSet::new()),
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    fn tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start `task` once a slot is free.
    pub async fn spawn<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permit = match self.permits.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(TryAcquireError::NoPermits) => {
                warn!(
                    "⚠️ {} tasks already running, waiting for a free slot to start {}",
                    self.capacity, name
                );
                match self.permits.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                }
            }
            Err(TryAcquireError::Closed) => return,
        };

        let mut tasks = self.tasks();
        while let Some(result) = tasks.try_join_next() {
            log_join_result(result);
        }
        tasks.spawn(async move {
            task.await;
            drop(permit);
        });
    }

    /// Tasks spawned and not yet reaped
    pub fn len(&self) -> usize {
        self.tasks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks().is_empty()
    }

    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }

    /// Wait for every tracked task, including ones spawned while draining.
    pub async fn drain(&self) {
        loop {
            let mut batch = std::mem::take(&mut *self.tasks());
            if batch.is_empty() {
                return;
            }
            while let Some(result) = batch.join_next().await {
                log_join_result(result);
            }
        }
    }
}

fn log_join_result(result: Result<(), JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            error!("Background task panicked: {}", e);
        }
    }
}
