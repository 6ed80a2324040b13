//! Delayed callbacks for internal signals.
//!
//! The game loop lives on a plain thread and blocks on its inbound queue,
//! so it cannot sleep to wait for the next frame. Instead it hands a
//! callback to [`SignalTimers`], which sleeps on a one-worker tokio runtime
//! and runs the callback (typically "enqueue this signal") when the delay
//! expires.
//!
//! Every timer is tracked until it fires or is cancelled. A timer fires at
//! most once, and never after [`SignalTimers::cancel`] or
//! [`SignalTimers::cancel_all`] removed it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::{Builder, Runtime};
use tokio::task::AbortHandle;
use tracing::{debug, trace};

use crate::TickError;

/// Handle to one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

type Pending = Arc<Mutex<HashMap<TimerId, AbortHandle>>>;

/// Owns the timer runtime and the set of pending timers.
pub struct SignalTimers {
    runtime: Option<Runtime>,
    pending: Pending,
    next_id: u64,
}

impl SignalTimers {
    /// Starts the timer runtime.
    ///
    /// # Errors
    /// Returns `TickError::Runtime` if the runtime thread cannot start.
    pub fn new() -> Result<Self, TickError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("arena-timers")
            .enable_time()
            .build()
            .map_err(TickError::Runtime)?;

        Ok(Self {
            runtime: Some(runtime),
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: 0,
        })
    }

    /// Runs `callback` once `delay` has elapsed.
    ///
    /// # Errors
    /// Returns `TickError::ShutDown` after [`shutdown`](Self::shutdown).
    pub fn schedule<F>(&mut self, delay: Duration, callback: F) -> Result<TimerId, TickError>
    where
        F: FnOnce() + Send + 'static,
    {
        let runtime = self.runtime.as_ref().ok_or(TickError::ShutDown)?;
        let id = TimerId(self.next_id);
        self.next_id += 1;

        // Held across spawn so the task cannot look itself up before it is
        // registered.
        let mut pending = self.pending.lock();
        let registry = Arc::clone(&self.pending);
        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let fire = registry.lock().remove(&id).is_some();
            if fire {
                trace!(%id, "timer fired");
                callback();
            }
        });
        pending.insert(id, task.abort_handle());

        trace!(%id, delay_us = delay.as_micros() as u64, "timer scheduled");
        Ok(id)
    }

    /// Cancels one timer. Returns `false` if it already fired or was
    /// cancelled.
    pub fn cancel(&self, id: TimerId) -> bool {
        match self.pending.lock().remove(&id) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Cancels every pending timer and returns how many there were.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<(TimerId, AbortHandle)> = self.pending.lock().drain().collect();
        for (_, handle) in &drained {
            handle.abort();
        }
        if !drained.is_empty() {
            debug!(cancelled = drained.len(), "pending timers cancelled");
        }
        drained.len()
    }

    /// Number of timers that have neither fired nor been cancelled.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Ids of every pending timer, oldest first.
    pub fn pending_ids(&self) -> Vec<TimerId> {
        let mut ids: Vec<TimerId> = self.pending.lock().keys().copied().collect();
        ids.sort();
        ids
    }

    /// Cancels every pending timer and stops the runtime. Idempotent.
    pub fn shutdown(&mut self) {
        self.cancel_all();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
            debug!("timer runtime stopped");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.runtime.is_none()
    }
}

impl Drop for SignalTimers {
    fn drop(&mut self) {
        self.shutdown();
    }
}
