//! Error types for the timing layer.

/// Errors that can occur while setting up timers.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The timer runtime could not be started.
    #[error("failed to start timer runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// The timer facility was already shut down.
    #[error("timers are shut down")]
    ShutDown,
}
