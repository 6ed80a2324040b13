/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listening port is already bound by another socket.
    #[error("port {0} is already in use")]
    AddressInUse(u16),

    /// Binding the listening socket failed for another reason.
    #[error("bind on port {port} failed: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// Opening an outbound connection failed.
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Registering a socket with the selector failed.
    #[error("selector registration failed: {0}")]
    Register(#[source] std::io::Error),

    /// Creating the selector failed.
    #[error("selector creation failed: {0}")]
    Selector(#[source] std::io::Error),

    /// Serializing an outbound message failed.
    #[error("serialize failed: {0}")]
    Serialize(String),

    /// Spawning a reactor thread failed.
    #[error("thread spawn failed: {0}")]
    Spawn(#[source] std::io::Error),

    /// The reactor is already running.
    #[error("reactor is already running")]
    AlreadyRunning,
}
