//! Command server I/O task: a multi-client TCP line server.
//!
//! Runs in a dedicated thread using `edge-executor` for cooperative
//! multi-task scheduling and `async-io-mini` timers between polls.  Two
//! concurrent futures share the client table:
//!
//! 1. **Accept**: drains `accept()` on the non-blocking listener every 20ms
//! 2. **Read**: drains every client socket every 5ms, decodes lines, runs
//!    them through the [engine](super::engine), writes the reply and then
//!    pushes the status to listeners
//!
//! ```text
//!  ┌──────────────────────────────────────────────┐
//!  │  Command Thread                              │
//!  │  ┌──────────────────────────────────────────┐│
//!  │  │  edge_executor::LocalExecutor            ││
//!  │  │  ┌─────────┐        ┌─────────────────┐  ││
//!  │  │  │ Accept  │──add──▶│ Read all        │  ││
//!  │  │  │ 20ms ⏱  │        │ 5ms ⏱ → engine  │  ││
//!  │  │  └─────────┘        └─────────────────┘  ││
//!  │  └──────────────────────────────────────────┘│
//!  └──────────────────────────────────────────────┘
//! ```
//!
//! A client that disconnects or errors is dropped from the table.  If it
//! had enrolled, its listener entry goes away on the next failed push.

use core::cell::RefCell;
use core::time::Duration;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use heapless::Vec;
use log::{debug, info, warn};

use crate::app::ports::{EventSink, PinPort};
use crate::app::shared::SharedDoor;

use super::broadcast::{ConnectionId, Subscriber};
use super::codec::LineDecoder;
use super::engine::{self, Reply};

const READ_BUF_SIZE: usize = 512;

/// Concurrent client connections; further connections are closed.
pub const MAX_CLIENTS: usize = 16;

const ACCEPT_INTERVAL: Duration = Duration::from_millis(20);
const READ_INTERVAL: Duration = Duration::from_millis(5);

// ── Per-client state ─────────────────────────────────────────

struct Client {
    id: ConnectionId,
    stream: TcpStream,
    decoder: LineDecoder,
}

impl Client {
    fn new(id: ConnectionId, stream: TcpStream) -> Self {
        Self {
            id,
            stream,
            decoder: LineDecoder::new(),
        }
    }

    /// Drain the socket.  Returns `false` once the client is gone.
    fn poll<P: PinPort, S: EventSink>(&mut self, door: &SharedDoor<P, S>, buf: &mut [u8]) -> bool {
        loop {
            match self.stream.read(buf) {
                Ok(0) => {
                    info!("IO: client {} disconnected", self.id);
                    return false;
                }
                Ok(n) => {
                    if !self.handle_bytes(door, &buf[..n]) {
                        return false;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return true,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    warn!("IO: client {} read error ({}), disconnecting", self.id, e);
                    return false;
                }
            }
        }
    }

    fn handle_bytes<P: PinPort, S: EventSink>(&mut self, door: &SharedDoor<P, S>, data: &[u8]) -> bool {
        let Self {
            id,
            stream,
            decoder,
        } = self;
        let mut alive = true;

        decoder.feed(data, |line| {
            if !alive {
                return;
            }
            let exchange = engine::handle_line(door, line, || subscriber_for(*id, stream));
            if let Err(e) = write_reply(door, *id, stream, &exchange.reply) {
                warn!("IO: reply to client {} failed: {}", id, e);
                alive = false;
            }
            if exchange.broadcast {
                door.broadcast(exchange.reply.status());
            }
        });
        alive
    }
}

/// A second handle on the client socket for status pushes.
fn subscriber_for(id: ConnectionId, stream: &TcpStream) -> Option<Subscriber> {
    match stream.try_clone() {
        Ok(clone) => Some(Subscriber::new(id, clone)),
        Err(e) => {
            warn!("IO: cannot clone connection {} for enroll: {}", id, e);
            None
        }
    }
}

/// Enrolled clients share their socket with the push path, so their
/// replies go through the listener lock.
fn write_reply<P: PinPort, S: EventSink>(
    door: &SharedDoor<P, S>,
    id: ConnectionId,
    stream: &mut TcpStream,
    reply: &Reply,
) -> io::Result<()> {
    let wire = reply.to_wire();
    if let Some(result) = door.write_to_listener(id, &wire) {
        return result;
    }
    stream.write_all(wire.as_bytes())?;
    stream.flush()
}

// ── Async I/O loop ───────────────────────────────────────────

type SharedClients = Rc<RefCell<Vec<Client, MAX_CLIENTS>>>;

/// Accept task: connection setup is infrequent, so a coarse tick is fine.
async fn accept_loop(listener: TcpListener, clients: SharedClients, shutdown: Arc<AtomicBool>) {
    let mut next_id: ConnectionId = 1;
    while !shutdown.load(Ordering::Acquire) {
        loop {
            match listener.accept() {
                Ok((stream, peer)) => {
                    if let Err(e) = stream.set_nonblocking(true) {
                        warn!("IO: cannot configure connection from {}: {}", peer, e);
                        continue;
                    }
                    let id = next_id;
                    next_id += 1;
                    if clients.borrow_mut().push(Client::new(id, stream)).is_err() {
                        warn!("IO: {} clients connected, refusing {}", MAX_CLIENTS, peer);
                    } else {
                        info!("IO: client {} connected from {}", id, peer);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!("IO: accept failed: {}", e);
                    break;
                }
            }
        }
        async_io_mini::Timer::after(ACCEPT_INTERVAL).await;
    }
}

/// Read task: polls every connected client.
async fn read_loop<P: PinPort, S: EventSink>(
    door: Arc<SharedDoor<P, S>>,
    clients: SharedClients,
    shutdown: Arc<AtomicBool>,
) {
    let mut read_buf = [0u8; READ_BUF_SIZE];
    while !shutdown.load(Ordering::Acquire) {
        {
            let mut clients = clients.borrow_mut();
            let mut gone: Vec<ConnectionId, MAX_CLIENTS> = Vec::new();
            for client in clients.iter_mut() {
                if !client.poll(&door, &mut read_buf) {
                    // Capacity equals the table size, so this cannot overflow.
                    let _ = gone.push(client.id);
                }
            }
            if !gone.is_empty() {
                clients.retain(|c| !gone.contains(&c.id));
                debug!("IO: {} clients connected", clients.len());
            }
        }
        async_io_mini::Timer::after(READ_INTERVAL).await;
    }
}

// ── Server ───────────────────────────────────────────────────

/// A bound, not yet running command server.
pub struct CommandServer<P: PinPort, S: EventSink> {
    listener: TcpListener,
    door: Arc<SharedDoor<P, S>>,
    shutdown: Arc<AtomicBool>,
}

impl<P, S> CommandServer<P, S>
where
    P: PinPort + 'static,
    S: EventSink + 'static,
{
    /// Bind the listening socket.  Failing here aborts startup.
    pub fn bind(
        addr: SocketAddr,
        door: Arc<SharedDoor<P, S>>,
        shutdown: Arc<AtomicBool>,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        info!("Command server listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            door,
            shutdown,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Spawn the I/O thread.  It exits once the shutdown flag is raised.
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("coop-rpc".into())
            .spawn(move || self.run())
    }

    fn run(self) {
        let Self {
            listener,
            door,
            shutdown,
        } = self;
        let executor: edge_executor::LocalExecutor<'_, 8> = edge_executor::LocalExecutor::new();
        let clients: SharedClients = Rc::new(RefCell::new(Vec::new()));

        executor
            .spawn(accept_loop(listener, clients.clone(), shutdown.clone()))
            .detach();
        executor
            .spawn(read_loop(door, clients.clone(), shutdown.clone()))
            .detach();

        info!("IO task started ({} max clients)", MAX_CLIENTS);
        futures_lite::future::block_on(executor.run(wait_for_shutdown(shutdown)));
        info!("IO task stopped");
    }
}

async fn wait_for_shutdown(shutdown: Arc<AtomicBool>) {
    while !shutdown.load(Ordering::Acquire) {
        async_io_mini::Timer::after(ACCEPT_INTERVAL).await;
    }
}

// ── Tests ────────────────────────────────────────────────────
