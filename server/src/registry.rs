//! Connection registry: transport connections and the four player seats.
//!
//! The registry tracks two things that deliberately have different
//! lifetimes:
//!
//! - **Connections**: every accepted socket, registered or not, with its
//!   outbound frame channel and a shutdown handle for its reader task.
//! - **Seats**: the four player slots, filled in strict arrival order.
//!   A seat, once taken, is never freed — a disconnect removes the
//!   connection but leaves the seat (and its alive flag) untouched.

use log::info;
use shared::Frame;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

pub use shared::MAX_PLAYERS;

/// Why a CONNECT was not granted a seat.
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    /// All four seats are taken.
    #[error("all seats are taken")]
    RoomFull,
    /// The connection already holds a seat; repeat CONNECTs are ignored.
    #[error("connection already registered")]
    DuplicateConnection,
    /// Empty display name; ignored silently, the connection stays open.
    #[error("empty player name")]
    EmptyName,
    /// The connection disappeared between enqueue and dispatch.
    #[error("unknown connection")]
    UnknownConnection,
}

/// One accepted transport connection.
pub struct Connection {
    /// Peer address, for logging.
    pub addr: SocketAddr,
    /// Outbound frames; drained by the connection's writer task.
    pub sender: mpsc::UnboundedSender<Frame>,
    /// Wakes the connection's reader task so it stops reading.
    pub shutdown: Arc<Notify>,
    /// The seat this connection registered into, if any.
    pub seat: Option<usize>,
}

/// One registered player seat.
#[derive(Debug, Clone)]
pub struct Seat {
    pub name: String,
    pub ip: String,
    pub port: i32,
    /// The connection that registered this seat. The connection may be gone;
    /// the seat stays.
    pub conn_id: u64,
}

/// Maps connections to seats and holds the outbound channel per connection.
#[derive(Default)]
pub struct Registry {
    conns: HashMap<u64, Connection>,
    seats: [Option<Seat>; MAX_PLAYERS],
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a newly accepted connection. No seat is assigned yet.
    pub fn insert_conn(
        &mut self,
        conn_id: u64,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<Frame>,
        shutdown: Arc<Notify>,
    ) {
        info!("connection {} accepted from {}", conn_id, addr);
        self.conns.insert(
            conn_id,
            Connection {
                addr,
                sender,
                shutdown,
                seat: None,
            },
        );
    }

    /// Drops a connection from the I/O layer. The seat it may hold is not
    /// freed and its player is not eliminated.
    pub fn remove_conn(&mut self, conn_id: u64) -> Option<Connection> {
        let conn = self.conns.remove(&conn_id);
        if let Some(conn) = &conn {
            match conn.seat {
                Some(seat) => info!("connection {} (seat {}) disconnected", conn_id, seat),
                None => info!("connection {} disconnected before registering", conn_id),
            }
        }
        conn
    }

    /// Drops a connection and wakes its reader task so the socket is torn
    /// down. Used to reject connections the game refuses to seat.
    pub fn close_conn(&mut self, conn_id: u64) {
        if let Some(conn) = self.remove_conn(conn_id) {
            conn.shutdown.notify_one();
        }
    }

    /// Registers a connection into the next free seat, in arrival order.
    pub fn register(
        &mut self,
        conn_id: u64,
        ip: &str,
        port: i32,
        name: &str,
    ) -> Result<usize, RegisterError> {
        let conn = self
            .conns
            .get_mut(&conn_id)
            .ok_or(RegisterError::UnknownConnection)?;

        if conn.seat.is_some() {
            return Err(RegisterError::DuplicateConnection);
        }
        if name.trim().is_empty() {
            return Err(RegisterError::EmptyName);
        }

        // Seats are never freed, so the first empty one is also the count
        // of filled ones.
        let seat = self
            .seats
            .iter()
            .position(|s| s.is_none())
            .ok_or(RegisterError::RoomFull)?;

        conn.seat = Some(seat);
        self.seats[seat] = Some(Seat {
            name: name.to_string(),
            ip: ip.to_string(),
            port,
            conn_id,
        });

        info!("player '{}' registered into seat {}", name, seat);
        Ok(seat)
    }

    /// The seat a connection registered into, if any.
    pub fn seat_of(&self, conn_id: u64) -> Option<usize> {
        self.conns.get(&conn_id).and_then(|c| c.seat)
    }

    /// The connection currently backing a seat, if it is still around.
    pub fn conn_of_seat(&self, seat: usize) -> Option<u64> {
        let owner = self.seats.get(seat)?.as_ref()?.conn_id;
        self.conns.contains_key(&owner).then_some(owner)
    }

    /// Filled seats in slot order.
    pub fn seats(&self) -> impl Iterator<Item = (usize, &Seat)> {
        self.seats
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|seat| (i, seat)))
    }

    /// Number of filled seats.
    pub fn seat_count(&self) -> usize {
        self.seats.iter().filter(|s| s.is_some()).count()
    }

    /// Outbound channel for one connection.
    pub fn sender_of(&self, conn_id: u64) -> Option<mpsc::UnboundedSender<Frame>> {
        self.conns.get(&conn_id).map(|c| c.sender.clone())
    }

    /// Outbound channels for every live connection, for broadcasts.
    pub fn all_senders(&self) -> Vec<mpsc::UnboundedSender<Frame>> {
        self.conns.values().map(|c| c.sender.clone()).collect()
    }

    /// Number of live connections (registered or not).
    pub fn conn_count(&self) -> usize {
        self.conns.len()
    }
}
