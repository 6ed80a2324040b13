//! The package queue: the bridge between network I/O and game logic.
//!
//! Two unbounded FIFO channels:
//!
//! ```text
//!             enqueue_input                 dequeue_input
//!  Reactor ──────────────────→ [ inbound ] ──────────────→ logic thread
//!  timers  ──────────────────→
//!
//!             dequeue_output                enqueue_output
//!  Reactor ←────────────────── [ outbound ] ←───────────── logic thread
//! ```
//!
//! This is the only synchronization point between the reactor threads and
//! the logic thread. There is no priority, no deduplication and no
//! backpressure beyond memory: traffic in a small arena game is bursty but
//! bounded.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::Endpoint;

/// An item travelling towards the logic thread.
///
/// `message == None` is the disconnection sentinel for `endpoint`.
/// Internal signals are enqueued with `endpoint == None`.
#[derive(Debug, Clone, PartialEq)]
pub struct InputPack<M> {
    pub message: Option<M>,
    pub endpoint: Option<Endpoint>,
}

impl<M> InputPack<M> {
    /// A message received from `endpoint`.
    pub fn new(message: M, endpoint: Endpoint) -> Self {
        Self {
            message: Some(message),
            endpoint: Some(endpoint),
        }
    }

    /// An internally generated item with no endpoint attached.
    pub fn signal(message: M) -> Self {
        Self {
            message: Some(message),
            endpoint: None,
        }
    }

    /// The "this endpoint disconnected" sentinel.
    pub fn disconnected(endpoint: Endpoint) -> Self {
        Self {
            message: None,
            endpoint: Some(endpoint),
        }
    }

    /// Returns `true` if this pack is the disconnection sentinel.
    pub fn is_disconnection(&self) -> bool {
        self.message.is_none()
    }
}

/// An item travelling towards the network.
///
/// `message == None` means "close every endpoint in `endpoints`".
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPack<M> {
    pub message: Option<M>,
    pub endpoints: Vec<Endpoint>,
}

impl<M> OutputPack<M> {
    /// A message addressed to every endpoint in `endpoints`.
    pub fn new(message: M, endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        Self {
            message: Some(message),
            endpoints: endpoints.into_iter().collect(),
        }
    }

    /// A message addressed to a single endpoint.
    pub fn to(message: M, endpoint: Endpoint) -> Self {
        Self {
            message: Some(message),
            endpoints: vec![endpoint],
        }
    }

    /// A request to close every endpoint in `endpoints`.
    pub fn close(endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        Self {
            message: None,
            endpoints: endpoints.into_iter().collect(),
        }
    }

    /// Returns `true` if this pack closes its endpoints.
    pub fn is_close(&self) -> bool {
        self.message.is_none()
    }
}

/// Bidirectional pair of FIFO queues.
///
/// Cloning a `PackageQueue` gives another handle to the *same* two queues,
/// so the reactor, the logic thread and the timers can each own one.
pub struct PackageQueue<I, O> {
    input_tx: Sender<InputPack<I>>,
    input_rx: Receiver<InputPack<I>>,
    output_tx: Sender<OutputPack<O>>,
    output_rx: Receiver<OutputPack<O>>,
}

// Manual impl: channel handles are clonable regardless of `I` and `O`.
impl<I, O> Clone for PackageQueue<I, O> {
    fn clone(&self) -> Self {
        Self {
            input_tx: self.input_tx.clone(),
            input_rx: self.input_rx.clone(),
            output_tx: self.output_tx.clone(),
            output_rx: self.output_rx.clone(),
        }
    }
}

impl<I, O> Default for PackageQueue<I, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I, O> PackageQueue<I, O> {
    /// Creates a new pair of empty queues.
    pub fn new() -> Self {
        let (input_tx, input_rx) = crossbeam_channel::unbounded();
        let (output_tx, output_rx) = crossbeam_channel::unbounded();
        Self {
            input_tx,
            input_rx,
            output_tx,
            output_rx,
        }
    }

    /// Pushes an item towards the logic thread. Never blocks.
    pub fn enqueue_input(&self, pack: InputPack<I>) {
        // Sending only fails once every receiver is gone, and this handle
        // holds one.
        let _ = self.input_tx.send(pack);
    }

    /// Pops the oldest inbound item.
    ///
    /// `None` as timeout blocks until an item arrives. Returns `None` if the
    /// timeout elapsed first.
    pub fn dequeue_input(&self, timeout: Option<Duration>) -> Option<InputPack<I>> {
        dequeue(&self.input_rx, timeout)
    }

    /// Pushes an item towards the network. Never blocks.
    pub fn enqueue_output(&self, pack: OutputPack<O>) {
        let _ = self.output_tx.send(pack);
    }

    /// Pops the oldest outbound item. Same timeout rules as
    /// [`dequeue_input`](Self::dequeue_input).
    pub fn dequeue_output(&self, timeout: Option<Duration>) -> Option<OutputPack<O>> {
        dequeue(&self.output_rx, timeout)
    }

    /// Number of items waiting in the inbound queue.
    pub fn input_len(&self) -> usize {
        self.input_rx.len()
    }

    /// Number of items waiting in the outbound queue.
    pub fn output_len(&self) -> usize {
        self.output_rx.len()
    }
}

fn dequeue<T>(rx: &Receiver<T>, timeout: Option<Duration>) -> Option<T> {
    match timeout {
        None => rx.recv().ok(),
        Some(timeout) if timeout.is_zero() => match rx.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        },
        Some(timeout) => match rx.recv_timeout(timeout) {
            Ok(item) => Some(item),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        },
    }
}
