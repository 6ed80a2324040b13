//! `Server`: the reactor, the game loop thread and their shared queue.
//!
//! ```text
//! Reactor (arena-net-read / arena-net-write) ⇄ ServerQueue ⇄ GameLoop (arena-logic)
//! ```

use std::net::SocketAddr;
use std::thread::{self, JoinHandle};

use asciiarena_protocol::{ClientMessage, JsonFraming, ServerMessage};
use asciiarena_transport::{InputPack, Listener, Reactor};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::handler::GameLoop;
use crate::signal::{ServerInput, ServerQueue, Signal};
use crate::ArenaError;

/// Wire framing of the server side: decodes client messages, encodes
/// server messages.
pub type ServerFraming = JsonFraming<ClientMessage, ServerMessage>;

/// A running ASCII Arena server.
///
/// Dropping the server shuts it down.
pub struct Server {
    reactor: Reactor<ServerFraming, ServerInput>,
    queue: ServerQueue,
    listener: Listener,
    game: Option<JoinHandle<()>>,
}

impl Server {
    /// Binds the listening port and starts every server thread.
    ///
    /// # Errors
    /// Fails on an invalid configuration, a busy port
    /// (`TransportError::AddressInUse`) or a thread that cannot start.
    pub fn start(config: ServerConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        let queue = ServerQueue::new();
        let mut reactor = Reactor::new(ServerFraming::default(), queue.clone())?;
        let listener = reactor.listen(config.port)?;
        let game_loop = GameLoop::new(config, queue.clone())?;

        reactor.run()?;
        let game = match thread::Builder::new()
            .name("arena-logic".into())
            .spawn(move || game_loop.run())
        {
            Ok(game) => game,
            Err(e) => {
                reactor.stop();
                return Err(ArenaError::Spawn(e));
            }
        };

        info!(addr = %listener.local_addr(), "server listening");
        Ok(Self {
            reactor,
            queue,
            listener,
            game: Some(game),
        })
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    pub fn port(&self) -> u16 {
        self.listener.port()
    }

    /// Number of live client connections.
    pub fn connection_count(&self) -> usize {
        self.reactor.connection_count()
    }

    /// Returns `true` until the server has been shut down.
    pub fn is_running(&self) -> bool {
        self.game.is_some()
    }

    /// Blocks until the game loop ends, then stops the reactor.
    pub fn wait(mut self) {
        self.join_game();
        self.reactor.stop();
    }

    /// Stops the game loop, cancels its timers and closes every connection.
    /// Idempotent.
    pub fn shutdown(&mut self) {
        if self.game.is_none() {
            return;
        }
        self.queue
            .enqueue_input(InputPack::signal(Signal::Shutdown.into()));
        self.join_game();
        self.reactor.stop();
        info!("server stopped");
    }

    fn join_game(&mut self) {
        if let Some(game) = self.game.take() {
            if game.join().is_err() {
                warn!("game loop panicked");
            }
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.shutdown();
    }
}
