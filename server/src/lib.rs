//! Sherlock-13 game server.
//!
//! The server is split into four layers:
//!
//! - [`network`] — TCP accept loop, per-connection reader/writer tasks
//! - [`worker`] — bounded ingress queue and the worker pool draining it
//! - [`game`] — the authoritative game engine behind the single game lock
//! - [`registry`] — connection-to-seat bookkeeping

pub mod game;
pub mod network;
pub mod registry;
pub mod worker;
