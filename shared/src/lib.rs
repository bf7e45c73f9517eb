//! Shared protocol definitions for the Sherlock-13 game server.
//!
//! This crate is the single source of truth for everything that travels on
//! the wire between the server and its clients:
//!
//! - The framed binary message format ([`Frame`]) and its exact byte layout
//! - The codec that reads and writes whole frames over a TCP stream
//!   ([`read_frame`] / [`write_frame`]) without ever leaking partial reads
//! - The static card data (card names, object names, and the per-card
//!   object tag table) that both sides of the wire agree on
//!
//! The server crate builds its game state on top of these definitions; a
//! client only needs this crate to speak the protocol.

pub mod cards;
pub mod codec;
pub mod frame;

pub use cards::{
    object_counts, CARDS_PER_PLAYER, CARD_COUNT, CARD_NAMES, MAX_PLAYERS,
    OBJECT_COUNT, OBJECT_NAMES, OBJECT_TAGS,
};
pub use codec::{read_frame, write_frame, FrameError};
pub use frame::{error_code, Frame, DEFAULT_PORT, HEADER_LEN};
