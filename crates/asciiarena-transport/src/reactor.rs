//! The network reactor: one readiness selector, two threads.
//!
//! ```text
//!                    ┌──────────────── Reactor ────────────────┐
//!  accept/recv ────→ │ read thread:  poll → accept / recv      │ ──→ inbound queue
//!                    │               → Framing::split          │
//!  send/close  ←──── │ write thread: outbound queue → send     │ ←── outbound queue
//!                    │               or close                  │
//!                    └─────────────────────────────────────────┘
//! ```
//!
//! Every live connection lives in an explicit registry owned by the reactor,
//! so `stop()` can enumerate and close them without asking the selector.
//!
//! The selector is edge-triggered: once a socket reports readiness the read
//! thread keeps receiving bounded chunks until the socket would block.
//!
//! A connection's lock is held from `recv` until the received messages are
//! queued, and teardown takes the same lock before queueing the
//! disconnection sentinel. Nothing from an endpoint is ever queued after
//! its sentinel.

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener as StdTcpListener, TcpStream as StdTcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Registry, Token};
use parking_lot::Mutex;
use tracing::{debug, error, info, trace, warn};

use crate::{Endpoint, Framing, InputPack, PackageQueue, TransportError};

/// Size of a single receive.
pub const MAX_BUFFER_SIZE: usize = 4096;

/// Upper bound for every blocking wait in the reactor threads. `stop()` is
/// observed within one of these.
pub const BLOCKING_TIME: Duration = Duration::from_millis(50);

/// How long a send may keep retrying a socket that would block.
const SEND_TIMEOUT: Duration = Duration::from_millis(500);

const EVENTS_CAPACITY: usize = 128;

/// Handle to a listening socket returned by [`Reactor::listen`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Listener {
    endpoint: Endpoint,
    local_addr: SocketAddr,
}

impl Listener {
    /// The reactor key of the listening socket.
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// The address the socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The bound port. Useful when listening on port 0.
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }
}

struct Connection {
    stream: TcpStream,
    peer: Option<SocketAddr>,
    closed: bool,
}

type SharedConnection = Arc<Mutex<Connection>>;

#[derive(Default)]
struct ConnectionRegistry {
    connections: HashMap<Endpoint, SharedConnection>,
    listeners: HashMap<Endpoint, TcpListener>,
}

struct Shared<F: Framing, I> {
    registry: Registry,
    tracked: Mutex<ConnectionRegistry>,
    framing: Mutex<F>,
    queue: PackageQueue<I, F::Outbound>,
    running: AtomicBool,
    next_id: AtomicU64,
}

/// Readiness-based socket multiplexer feeding a [`PackageQueue`].
///
/// `F` splits and serializes messages; `I` is the inbound item type of the
/// queue. Anything `F` decodes must convert into `I`, which lets the logic
/// side put its own internal items (timers, signals) in the same queue.
pub struct Reactor<F: Framing, I: Send + 'static> {
    shared: Arc<Shared<F, I>>,
    poll: Option<Poll>,
    threads: Option<(JoinHandle<Poll>, JoinHandle<()>)>,
}

impl<F: Framing, I: Send + 'static> Reactor<F, I> {
    /// Stops both threads, then closes every tracked connection and listener.
    ///
    /// Each closed connection produces its disconnection sentinel in the
    /// inbound queue. Safe to call more than once.
    pub fn stop(&mut self) {
        self.shared.running.store(false, Ordering::Release);

        if let Some((input, output)) = self.threads.take() {
            match input.join() {
                Ok(poll) => self.poll = Some(poll),
                Err(_) => error!("reactor read thread panicked"),
            }
            if output.join().is_err() {
                error!("reactor write thread panicked");
            }
        }

        for endpoint in self.shared.endpoints() {
            self.shared.close_connection(endpoint);
        }

        let listeners = std::mem::take(&mut self.shared.tracked.lock().listeners);
        for (endpoint, mut listener) in listeners {
            if let Err(e) = self.shared.registry.deregister(&mut listener) {
                trace!(%endpoint, error = %e, "listener deregister failed");
            }
            debug!(%endpoint, "listener closed");
        }
    }

    /// Whether the reactor threads are running.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Number of tracked connections (listeners excluded).
    pub fn connection_count(&self) -> usize {
        self.shared.tracked.lock().connections.len()
    }

    /// Every tracked connection, in no particular order.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.shared.endpoints()
    }

    /// Remote address of a tracked connection.
    pub fn peer_addr(&self, endpoint: Endpoint) -> Option<SocketAddr> {
        let connection = self.shared.connection(endpoint)?;
        let peer = connection.lock().peer;
        peer
    }

    /// Closes one connection through the regular teardown path.
    ///
    /// Returns `false` if the endpoint was not tracked (already closed).
    pub fn close(&self, endpoint: Endpoint) -> bool {
        self.shared.close_connection(endpoint)
    }
}

impl<F, I> Reactor<F, I>
where
    F: Framing,
    I: From<F::Inbound> + Send + 'static,
{
    /// Creates a reactor feeding `queue`, using `framing` for (de)serialization.
    pub fn new(
        framing: F,
        queue: PackageQueue<I, F::Outbound>,
    ) -> Result<Self, TransportError> {
        let poll = Poll::new().map_err(TransportError::Selector)?;
        let registry = poll.registry().try_clone().map_err(TransportError::Selector)?;

        let shared = Arc::new(Shared {
            registry,
            tracked: Mutex::new(ConnectionRegistry::default()),
            framing: Mutex::new(framing),
            queue,
            running: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        });

        Ok(Self {
            shared,
            poll: Some(poll),
            threads: None,
        })
    }

    /// Binds `0.0.0.0:port` and registers it for accept-readiness.
    ///
    /// # Errors
    /// [`TransportError::AddressInUse`] if the port is taken. Nothing is
    /// retried; what to do next is the caller's decision.
    pub fn listen(&self, port: u16) -> Result<Listener, TransportError> {
        let std_listener = StdTcpListener::bind(("0.0.0.0", port)).map_err(|source| {
            if source.kind() == io::ErrorKind::AddrInUse {
                error!(port, "port is already in use");
                TransportError::AddressInUse(port)
            } else {
                error!(port, error = %source, "problem initializing the server");
                TransportError::Bind { port, source }
            }
        })?;
        std_listener
            .set_nonblocking(true)
            .map_err(|source| TransportError::Bind { port, source })?;
        let local_addr = std_listener
            .local_addr()
            .map_err(|source| TransportError::Bind { port, source })?;

        let mut listener = TcpListener::from_std(std_listener);
        let endpoint = self.shared.next_endpoint();
        {
            let mut tracked = self.shared.tracked.lock();
            self.shared
                .registry
                .register(&mut listener, token(endpoint), Interest::READABLE)
                .map_err(TransportError::Register)?;
            tracked.listeners.insert(endpoint, listener);
        }

        info!(port = local_addr.port(), "listening");
        Ok(Listener {
            endpoint,
            local_addr,
        })
    }

    /// Opens a connection to `host:port` and registers it for read-readiness.
    pub fn connect(&self, host: &str, port: u16) -> Result<Endpoint, TransportError> {
        let addr = format!("{host}:{port}");
        let stream = StdTcpStream::connect((host, port)).map_err(|source| {
            error!(%addr, error = %source, "can not connect");
            TransportError::Connect {
                addr: addr.clone(),
                source,
            }
        })?;
        stream.set_nonblocking(true).map_err(|source| TransportError::Connect {
            addr: addr.clone(),
            source,
        })?;
        let _ = stream.set_nodelay(true);
        let peer = stream.peer_addr().ok();

        let endpoint = self.shared.track(TcpStream::from_std(stream), peer)?;
        info!(%endpoint, %addr, "new connection");
        Ok(endpoint)
    }

    /// Starts the read and write threads.
    pub fn run(&mut self) -> Result<(), TransportError> {
        let poll = self.poll.take().ok_or(TransportError::AlreadyRunning)?;
        self.shared.running.store(true, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        let input = thread::Builder::new()
            .name("arena-net-read".into())
            .spawn(move || shared.input_process(poll))
            .map_err(TransportError::Spawn)?;

        let shared = Arc::clone(&self.shared);
        let output = thread::Builder::new()
            .name("arena-net-write".into())
            .spawn(move || shared.output_process())
            .map_err(TransportError::Spawn)?;

        self.threads = Some((input, output));
        debug!("reactor running");
        Ok(())
    }
}

impl<F: Framing, I: Send + 'static> Drop for Reactor<F, I> {
    fn drop(&mut self) {
        if self.threads.is_some() {
            self.stop();
        }
    }
}

impl<F: Framing, I: Send + 'static> Shared<F, I> {
    fn next_endpoint(&self) -> Endpoint {
        Endpoint::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn connection(&self, endpoint: Endpoint) -> Option<SharedConnection> {
        self.tracked.lock().connections.get(&endpoint).cloned()
    }

    fn endpoints(&self) -> Vec<Endpoint> {
        self.tracked.lock().connections.keys().copied().collect()
    }

    /// Registers a stream and starts tracking it.
    fn track(
        &self,
        mut stream: TcpStream,
        peer: Option<SocketAddr>,
    ) -> Result<Endpoint, TransportError> {
        let endpoint = self.next_endpoint();
        // Register while holding the registry lock: the read thread cannot
        // look the endpoint up before it is inserted.
        let mut tracked = self.tracked.lock();
        self.registry
            .register(&mut stream, token(endpoint), Interest::READABLE)
            .map_err(TransportError::Register)?;
        tracked
            .connections
            .insert(endpoint, Arc::new(Mutex::new(Connection {
                stream,
                peer,
                closed: false,
            })));
        Ok(endpoint)
    }

    /// Teardown path shared by read errors, close packages and `stop()`.
    ///
    /// Unregister, close, notify the logic side, drop framing state. Only
    /// the first call for an endpoint does anything. Must not be called
    /// while holding the connection's lock.
    fn close_connection(&self, endpoint: Endpoint) -> bool {
        let Some(connection) = self.tracked.lock().connections.remove(&endpoint) else {
            return false;
        };

        let mut connection = connection.lock();
        connection.closed = true;
        if let Err(e) = self.registry.deregister(&mut connection.stream) {
            trace!(%endpoint, error = %e, "deregister failed");
        }
        let _ = connection.stream.shutdown(Shutdown::Both);

        self.queue.enqueue_input(InputPack::disconnected(endpoint));
        self.framing.lock().untrack(endpoint);
        debug!(%endpoint, peer = ?connection.peer, "connection closed");
        true
    }

    fn output_process(&self) {
        while self.running.load(Ordering::Acquire) {
            let Some(pack) = self.queue.dequeue_output(Some(BLOCKING_TIME)) else {
                continue;
            };

            match pack.message {
                Some(message) => self.send(&message, &pack.endpoints),
                None => {
                    for endpoint in pack.endpoints {
                        self.close_connection(endpoint);
                    }
                }
            }
        }
        debug!("reactor write thread stopped");
    }

    /// Serializes once, sends to every endpoint.
    ///
    /// A failed send closes the connection: the frame may be half written,
    /// and anything sent after it would be read as garbage.
    fn send(&self, message: &F::Outbound, endpoints: &[Endpoint]) {
        let data = match self.framing.lock().serialize(message) {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "dropping outbound message");
                return;
            }
        };

        for endpoint in endpoints {
            let Some(connection) = self.connection(*endpoint) else {
                trace!(%endpoint, "package for untracked endpoint");
                continue;
            };
            let result = {
                let mut guard = connection.lock();
                if guard.closed {
                    continue;
                }
                send_all(&mut guard.stream, &data)
            };
            match result {
                Ok(()) => trace!(%endpoint, bytes = data.len(), "sent"),
                Err(e) => {
                    warn!(%endpoint, error = %e, "send failed, closing connection");
                    self.close_connection(*endpoint);
                }
            }
        }
    }
}

impl<F, I> Shared<F, I>
where
    F: Framing,
    I: From<F::Inbound> + Send + 'static,
{
    fn input_process(&self, mut poll: Poll) -> Poll {
        let mut events = Events::with_capacity(EVENTS_CAPACITY);

        while self.running.load(Ordering::Acquire) {
            if let Err(e) = poll.poll(&mut events, Some(BLOCKING_TIME)) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                error!(error = %e, "selector wait failed");
                break;
            }

            for event in events.iter() {
                let endpoint = Endpoint::new(event.token().0 as u64);
                let is_listener = self.tracked.lock().listeners.contains_key(&endpoint);
                if is_listener {
                    self.accept_all(endpoint);
                } else {
                    self.receive_all(endpoint);
                }
            }
        }

        debug!("reactor read thread stopped");
        poll
    }

    fn accept_all(&self, listener: Endpoint) {
        loop {
            let accepted = {
                let mut tracked = self.tracked.lock();
                let Some(socket) = tracked.listeners.get_mut(&listener) else {
                    return;
                };
                socket.accept()
            };

            match accepted {
                Ok((stream, addr)) => {
                    let _ = stream.set_nodelay(true);
                    match self.track(stream, Some(addr)) {
                        Ok(endpoint) => debug!(%endpoint, %addr, "new connection"),
                        Err(e) => warn!(%addr, error = %e, "could not track connection"),
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    return;
                }
            }
        }
    }

    fn receive_all(&self, endpoint: Endpoint) {
        let Some(connection) = self.connection(endpoint) else {
            return;
        };

        let mut buffer = [0u8; MAX_BUFFER_SIZE];
        loop {
            let mut guard = connection.lock();
            if guard.closed {
                return;
            }
            let result = guard.stream.read(&mut buffer);
            match result {
                Ok(0) => {
                    drop(guard);
                    debug!(%endpoint, "peer closed the connection");
                    self.close_connection(endpoint);
                    return;
                }
                // Dispatched under the lock so a concurrent close waits.
                Ok(n) => self.dispatch(&buffer[..n], endpoint),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    drop(guard);
                    debug!(%endpoint, error = %e, "receive failed");
                    self.close_connection(endpoint);
                    return;
                }
            }
        }
    }

    fn dispatch(&self, data: &[u8], endpoint: Endpoint) {
        let messages = self.framing.lock().split(data, endpoint);
        for message in messages {
            trace!(%endpoint, "message received");
            self.queue
                .enqueue_input(InputPack::new(I::from(message), endpoint));
        }
    }
}

fn token(endpoint: Endpoint) -> Token {
    Token(endpoint.into_inner() as usize)
}

fn send_all(stream: &mut TcpStream, mut data: &[u8]) -> io::Result<()> {
    let deadline = Instant::now() + SEND_TIMEOUT;
    while !data.is_empty() {
        match stream.write(data) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => data = &data[n..],
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                if Instant::now() >= deadline {
                    return Err(e);
                }
                thread::sleep(Duration::from_millis(1));
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
