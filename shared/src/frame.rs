//! Wire frame types and their exact byte layout.
//!
//! Every message is one frame: a 5-byte header (`kind: u8`,
//! `length: u32` big-endian) followed by a fixed-layout payload whose size
//! is fully determined by the kind. All payload integers are 4-byte signed
//! values in network byte order; strings are fixed-width, NUL-padded byte
//! fields decoded up to the first NUL.

use crate::codec::FrameError;

/// Well-known port the server listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 32000;

/// Size of the frame header: one kind byte plus a big-endian u32 length.
pub const HEADER_LEN: usize = 5;

const KIND_CONNECT: u8 = 0x01;
const KIND_ID_ASSIGN: u8 = 0x02;
const KIND_PLAYER_LIST: u8 = 0x03;
const KIND_DISTRIBUTE: u8 = 0x04;
const KIND_TURN: u8 = 0x05;
const KIND_ASK_OBJECT: u8 = 0x06;
const KIND_ASK_PLAYER: u8 = 0x07;
const KIND_GUESS: u8 = 0x08;
const KIND_VERIFY: u8 = 0x09;
const KIND_GAME_OVER: u8 = 0x0A;
const KIND_ERROR: u8 = 0xFF;

const IP_FIELD: usize = 40;
const CONNECT_NAME_FIELD: usize = 40;
const LIST_NAME_FIELD: usize = 32;
const ERROR_TEXT_FIELD: usize = 32;

/// Numeric codes carried by [`Frame::Error`], with the canonical short text
/// the server puts in the message field.
pub mod error_code {
    /// Action sent by a player who does not hold the turn.
    pub const WRONG_TURN: i32 = 1;
    /// Target player id out of range.
    pub const INVALID_TARGET: i32 = 2;
    /// Target player has been eliminated.
    pub const TARGET_DEAD: i32 = 3;
    /// Object id out of range.
    pub const INVALID_OBJECT: i32 = 4;
    /// Gameplay action while the game is not in progress.
    pub const NOT_IN_PROGRESS: i32 = 5;
    /// Registration attempt while all seats are taken.
    pub const ROOM_FULL: i32 = 6;
    /// Claimed player id disagrees with the sending connection's seat.
    pub const ID_MISMATCH: i32 = 7;
    /// Gameplay action from a connection that never registered.
    pub const NOT_REGISTERED: i32 = 8;
    /// Guessed card id out of range.
    pub const INVALID_CARD: i32 = 9;
}

/// One wire message, either direction.
///
/// The variants mirror the protocol table one-to-one; the enum tag never
/// travels on the wire, only the kind byte and the fixed payload do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Client registration request.
    Connect { ip: String, port: i32, name: String },
    /// Server reply to a successful registration.
    IdAssign { player_id: i32, port: i32 },
    /// One roster entry; the server sends one per filled seat.
    PlayerList { id: i32, name: String },
    /// A player's dealt hand and its derived object counts.
    Distribute {
        cards: [i32; 3],
        obj_counts: [i32; 8],
    },
    /// Announces whose action is now valid.
    Turn { player_id: i32 },
    /// "Does any alive player hold this object?"
    AskObject { asking_player_id: i32, object_id: i32 },
    /// "How many of this object does that player hold?"
    AskPlayer {
        asking_player_id: i32,
        target_player_id: i32,
        object_id: i32,
    },
    /// Attempt to name the culprit card.
    Guess {
        asking_player_id: i32,
        guessed_card_id: i32,
    },
    /// Result of an ask; `target_player_id == -1` means a global ask.
    Verify {
        result_val: i32,
        target_player_id: i32,
        object_id: i32,
    },
    /// Win (`is_winner == 1`), elimination (`0`) or draw (`-1`, `player_id == -1`).
    GameOver { player_id: i32, is_winner: i32 },
    /// Recoverable validation error, unicast to the offender.
    Error { code: i32, message: String },
}

fn put_i32(buf: &mut Vec<u8>, value: i32) {
    buf.extend_from_slice(&value.to_be_bytes());
}

fn put_str(buf: &mut Vec<u8>, value: &str, width: usize) {
    let bytes = value.as_bytes();
    let n = bytes.len().min(width);
    buf.extend_from_slice(&bytes[..n]);
    buf.resize(buf.len() + (width - n), 0);
}

fn get_i32(payload: &[u8], offset: usize) -> i32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&payload[offset..offset + 4]);
    i32::from_be_bytes(raw)
}

fn get_str(payload: &[u8], offset: usize, width: usize) -> String {
    let field = &payload[offset..offset + width];
    let end = field.iter().position(|&b| b == 0).unwrap_or(width);
    String::from_utf8_lossy(&field[..end]).into_owned()
}

impl Frame {
    /// The kind byte written into the frame header.
    pub fn kind(&self) -> u8 {
        match self {
            Frame::Connect { .. } => KIND_CONNECT,
            Frame::IdAssign { .. } => KIND_ID_ASSIGN,
            Frame::PlayerList { .. } => KIND_PLAYER_LIST,
            Frame::Distribute { .. } => KIND_DISTRIBUTE,
            Frame::Turn { .. } => KIND_TURN,
            Frame::AskObject { .. } => KIND_ASK_OBJECT,
            Frame::AskPlayer { .. } => KIND_ASK_PLAYER,
            Frame::Guess { .. } => KIND_GUESS,
            Frame::Verify { .. } => KIND_VERIFY,
            Frame::GameOver { .. } => KIND_GAME_OVER,
            Frame::Error { .. } => KIND_ERROR,
        }
    }

    /// The fixed payload size for a kind, or `None` for an unknown kind.
    ///
    /// Every payload has a size known up front, so the codec can validate
    /// the header before reading (or allocating) anything.
    pub fn payload_len(kind: u8) -> Option<usize> {
        match kind {
            KIND_CONNECT => Some(IP_FIELD + 4 + CONNECT_NAME_FIELD),
            KIND_ID_ASSIGN => Some(8),
            KIND_PLAYER_LIST => Some(4 + LIST_NAME_FIELD),
            KIND_DISTRIBUTE => Some(4 * 3 + 4 * 8),
            KIND_TURN => Some(4),
            KIND_ASK_OBJECT => Some(8),
            KIND_ASK_PLAYER => Some(12),
            KIND_GUESS => Some(8),
            KIND_VERIFY => Some(12),
            KIND_GAME_OVER => Some(8),
            KIND_ERROR => Some(4 + ERROR_TEXT_FIELD),
            _ => None,
        }
    }

    /// Serializes the payload only (no header).
    fn encode_payload(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Frame::Connect { ip, port, name } => {
                put_str(&mut buf, ip, IP_FIELD);
                put_i32(&mut buf, *port);
                put_str(&mut buf, name, CONNECT_NAME_FIELD);
            }
            Frame::IdAssign { player_id, port } => {
                put_i32(&mut buf, *player_id);
                put_i32(&mut buf, *port);
            }
            Frame::PlayerList { id, name } => {
                put_i32(&mut buf, *id);
                put_str(&mut buf, name, LIST_NAME_FIELD);
            }
            Frame::Distribute { cards, obj_counts } => {
                for card in cards {
                    put_i32(&mut buf, *card);
                }
                for count in obj_counts {
                    put_i32(&mut buf, *count);
                }
            }
            Frame::Turn { player_id } => put_i32(&mut buf, *player_id),
            Frame::AskObject {
                asking_player_id,
                object_id,
            } => {
                put_i32(&mut buf, *asking_player_id);
                put_i32(&mut buf, *object_id);
            }
            Frame::AskPlayer {
                asking_player_id,
                target_player_id,
                object_id,
            } => {
                put_i32(&mut buf, *asking_player_id);
                put_i32(&mut buf, *target_player_id);
                put_i32(&mut buf, *object_id);
            }
            Frame::Guess {
                asking_player_id,
                guessed_card_id,
            } => {
                put_i32(&mut buf, *asking_player_id);
                put_i32(&mut buf, *guessed_card_id);
            }
            Frame::Verify {
                result_val,
                target_player_id,
                object_id,
            } => {
                put_i32(&mut buf, *result_val);
                put_i32(&mut buf, *target_player_id);
                put_i32(&mut buf, *object_id);
            }
            Frame::GameOver {
                player_id,
                is_winner,
            } => {
                put_i32(&mut buf, *player_id);
                put_i32(&mut buf, *is_winner);
            }
            Frame::Error { code, message } => {
                put_i32(&mut buf, *code);
                put_str(&mut buf, message, ERROR_TEXT_FIELD);
            }
        }
        buf
    }

    /// Serializes the full frame: header plus payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let payload = self.encode_payload();
        let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
        buf.push(self.kind());
        buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        buf.extend_from_slice(&payload);
        buf
    }

    /// Rebuilds a frame from a kind byte and its payload bytes.
    ///
    /// The payload length must already match [`Frame::payload_len`]; the
    /// codec enforces that before calling here.
    pub fn from_payload(kind: u8, payload: &[u8]) -> Result<Frame, FrameError> {
        let expected = Frame::payload_len(kind).ok_or(FrameError::UnknownKind(kind))?;
        if payload.len() != expected {
            return Err(FrameError::SizeMismatch {
                kind,
                expected,
                got: payload.len(),
            });
        }

        let frame = match kind {
            KIND_CONNECT => Frame::Connect {
                ip: get_str(payload, 0, IP_FIELD),
                port: get_i32(payload, IP_FIELD),
                name: get_str(payload, IP_FIELD + 4, CONNECT_NAME_FIELD),
            },
            KIND_ID_ASSIGN => Frame::IdAssign {
                player_id: get_i32(payload, 0),
                port: get_i32(payload, 4),
            },
            KIND_PLAYER_LIST => Frame::PlayerList {
                id: get_i32(payload, 0),
                name: get_str(payload, 4, LIST_NAME_FIELD),
            },
            KIND_DISTRIBUTE => {
                let mut cards = [0i32; 3];
                for (i, card) in cards.iter_mut().enumerate() {
                    *card = get_i32(payload, 4 * i);
                }
                let mut obj_counts = [0i32; 8];
                for (i, count) in obj_counts.iter_mut().enumerate() {
                    *count = get_i32(payload, 12 + 4 * i);
                }
                Frame::Distribute { cards, obj_counts }
            }
            KIND_TURN => Frame::Turn {
                player_id: get_i32(payload, 0),
            },
            KIND_ASK_OBJECT => Frame::AskObject {
                asking_player_id: get_i32(payload, 0),
                object_id: get_i32(payload, 4),
            },
            KIND_ASK_PLAYER => Frame::AskPlayer {
                asking_player_id: get_i32(payload, 0),
                target_player_id: get_i32(payload, 4),
                object_id: get_i32(payload, 8),
            },
            KIND_GUESS => Frame::Guess {
                asking_player_id: get_i32(payload, 0),
                guessed_card_id: get_i32(payload, 4),
            },
            KIND_VERIFY => Frame::Verify {
                result_val: get_i32(payload, 0),
                target_player_id: get_i32(payload, 4),
                object_id: get_i32(payload, 8),
            },
            KIND_GAME_OVER => Frame::GameOver {
                player_id: get_i32(payload, 0),
                is_winner: get_i32(payload, 4),
            },
            KIND_ERROR => Frame::Error {
                code: get_i32(payload, 0),
                message: get_str(payload, 4, ERROR_TEXT_FIELD),
            },
            _ => return Err(FrameError::UnknownKind(kind)),
        };
        Ok(frame)
    }
}
