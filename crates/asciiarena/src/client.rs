//! `ClientConnection`: the client side of the wire, over the same reactor.

use std::time::{Duration, Instant};

use asciiarena_protocol::{ClientMessage, JsonFraming, LoginStatus, ServerMessage, VERSION};
use asciiarena_transport::{Endpoint, OutputPack, PackageQueue, Reactor};
use tracing::{debug, trace};

use crate::ArenaError;

/// Wire framing of the client side: decodes server messages, encodes
/// client messages.
pub type ClientFraming = JsonFraming<ServerMessage, ClientMessage>;

type ClientQueue = PackageQueue<ServerMessage, ClientMessage>;

/// One connection to an ASCII Arena server.
pub struct ClientConnection {
    reactor: Reactor<ClientFraming, ServerMessage>,
    queue: ClientQueue,
    server: Endpoint,
}

impl ClientConnection {
    /// Connects to `host:port` and starts the client reactor.
    ///
    /// # Errors
    /// Returns `ArenaError::Transport` if the connection is refused or the
    /// reactor cannot start.
    pub fn connect(host: &str, port: u16) -> Result<Self, ArenaError> {
        let queue = ClientQueue::new();
        let mut reactor = Reactor::new(ClientFraming::default(), queue.clone())?;
        let server = reactor.connect(host, port)?;
        reactor.run()?;
        debug!(host, port, %server, "connected");
        Ok(Self {
            reactor,
            queue,
            server,
        })
    }

    /// The endpoint of the server connection.
    pub fn endpoint(&self) -> Endpoint {
        self.server
    }

    pub fn send(&self, message: ClientMessage) {
        trace!(kind = message.kind(), "sending");
        self.queue.enqueue_output(OutputPack::to(message, self.server));
    }

    /// Waits for the next server message accepted by `filter`. Other
    /// messages are skipped.
    ///
    /// # Errors
    /// `ArenaError::Disconnected` if the server closes the connection,
    /// `ArenaError::Timeout` if nothing matching arrives in time.
    pub fn receive(
        &self,
        timeout: Duration,
        mut filter: impl FnMut(&ServerMessage) -> bool,
    ) -> Result<ServerMessage, ArenaError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ArenaError::Timeout(timeout));
            }
            let pack = self
                .queue
                .dequeue_input(Some(remaining))
                .ok_or(ArenaError::Timeout(timeout))?;
            match pack.message {
                None => return Err(ArenaError::Disconnected),
                Some(message) if filter(&message) => return Ok(message),
                Some(message) => trace!(kind = message.kind(), "skipped"),
            }
        }
    }

    /// Waits for the next server message of any kind.
    ///
    /// # Errors
    /// Same as [`receive`](Self::receive).
    pub fn next_message(&self, timeout: Duration) -> Result<ServerMessage, ArenaError> {
        self.receive(timeout, |_| true)
    }

    /// Sends our version and waits for the server's verdict. Returns the
    /// server version.
    ///
    /// # Errors
    /// `ArenaError::IncompatibleVersion` if the server rejects us, plus the
    /// errors of [`receive`](Self::receive).
    pub fn check_version(&self, timeout: Duration) -> Result<String, ArenaError> {
        self.send(ClientMessage::Version {
            value: VERSION.to_string(),
        });
        match self.receive(timeout, |m| matches!(m, ServerMessage::CheckedVersion { .. }))? {
            ServerMessage::CheckedVersion {
                value,
                validation: true,
            } => Ok(value),
            ServerMessage::CheckedVersion { value, .. } => Err(ArenaError::IncompatibleVersion(value)),
            _ => Err(ArenaError::Disconnected),
        }
    }

    /// Asks to play as `character` and returns the server's answer.
    ///
    /// # Errors
    /// Same as [`receive`](Self::receive).
    pub fn login(&self, character: char, timeout: Duration) -> Result<LoginStatus, ArenaError> {
        self.send(ClientMessage::Login {
            character: character.to_string(),
        });
        match self.receive(timeout, |m| matches!(m, ServerMessage::LoginStatus { .. }))? {
            ServerMessage::LoginStatus { status } => Ok(status),
            _ => Err(ArenaError::Disconnected),
        }
    }

    /// Closes the connection and stops the client reactor.
    pub fn close(mut self) {
        self.queue.enqueue_output(OutputPack::close([self.server]));
        self.reactor.stop();
        debug!(server = %self.server, "connection closed");
    }
}
