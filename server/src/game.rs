//! Authoritative game engine for Sherlock-13.
//!
//! The engine owns all mutable game state: the registry, the shuffled deck,
//! the per-player object table, the culprit card, the turn cursor, the
//! alive flags and the lobby/in-progress/ended status. It is the only
//! writer of that state, and every mutation happens inside one call to
//! [`Game::handle_frame`] while the caller (a worker) holds the single
//! game lock.
//!
//! Handlers never perform I/O. They return a list of [`Outbound`] frames
//! which the worker resolves to per-connection channels and delivers after
//! releasing the lock.

use log::{debug, info, warn};
use rand::seq::SliceRandom;
use shared::{
    error_code, object_counts, Frame, CARDS_PER_PLAYER, CARD_COUNT, CARD_NAMES, MAX_PLAYERS,
    OBJECT_COUNT, OBJECT_NAMES,
};
use tokio::sync::mpsc;

use crate::registry::{RegisterError, Registry};

/// Lifecycle of the single game instance. Transitions are one-directional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// Fewer than four players registered.
    Lobby,
    /// Four seats filled, cards dealt, turns running.
    InProgress,
    /// Someone named the culprit. Terminal.
    Ended,
}

/// A frame the engine wants delivered, with its addressing.
#[derive(Debug)]
pub enum Outbound {
    /// Send to one connection.
    Unicast { conn_id: u64, frame: Frame },
    /// Send to every live connection.
    Broadcast { frame: Frame },
    /// Tear the connection down (used for rejected registrations).
    Close { conn_id: u64 },
}

/// The authoritative game state plus the connection registry.
pub struct Game {
    registry: Registry,
    status: GameStatus,
    /// Permutation of the 13 card ids; `deck[3*seat..3*seat+3]` is a hand,
    /// `deck[12]` is the culprit.
    deck: [i32; CARD_COUNT],
    /// `table[seat][object]` — fixed at deal time.
    table: [[i32; OBJECT_COUNT]; MAX_PLAYERS],
    culprit: i32,
    current_turn: usize,
    alive: [bool; MAX_PLAYERS],
    listen_port: u16,
}

fn err_frame(code: i32, message: &str) -> Frame {
    Frame::Error {
        code,
        message: message.to_string(),
    }
}

impl Game {
    pub fn new(listen_port: u16) -> Self {
        Self {
            registry: Registry::new(),
            status: GameStatus::Lobby,
            deck: [0; CARD_COUNT],
            table: [[0; OBJECT_COUNT]; MAX_PLAYERS],
            culprit: -1,
            current_turn: 0,
            alive: [true; MAX_PLAYERS],
            listen_port,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn current_turn(&self) -> usize {
        self.current_turn
    }

    pub fn is_alive(&self, seat: usize) -> bool {
        self.alive[seat]
    }

    pub fn culprit(&self) -> i32 {
        self.culprit
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Applies one decoded client frame to the game state.
    ///
    /// This is the single dispatch point the worker pool calls under the
    /// game lock. Server-to-client kinds arriving from a client are logged
    /// and dropped; they are structurally valid frames, just meaningless
    /// as commands.
    pub fn handle_frame(&mut self, conn_id: u64, frame: Frame) -> Vec<Outbound> {
        match frame {
            Frame::Connect { ip, port, name } => self.handle_connect(conn_id, &ip, port, &name),
            Frame::AskObject {
                asking_player_id,
                object_id,
            } => self.handle_ask_object(conn_id, asking_player_id, object_id),
            Frame::AskPlayer {
                asking_player_id,
                target_player_id,
                object_id,
            } => self.handle_ask_player(conn_id, asking_player_id, target_player_id, object_id),
            Frame::Guess {
                asking_player_id,
                guessed_card_id,
            } => self.handle_guess(conn_id, asking_player_id, guessed_card_id),
            other => {
                warn!(
                    "connection {} sent server-only kind 0x{:02x}, ignoring",
                    conn_id,
                    other.kind()
                );
                Vec::new()
            }
        }
    }

    /// CONNECT: registers the connection into a seat and, on the fourth
    /// registration, starts the game.
    fn handle_connect(&mut self, conn_id: u64, ip: &str, port: i32, name: &str) -> Vec<Outbound> {
        // The original server hands every player its own port; keep that
        // unless the client brought one along.
        let next_seat = self.registry.seat_count();
        let assigned_port = if port > 0 {
            port
        } else {
            self.listen_port as i32 + 1 + next_seat as i32
        };

        match self.registry.register(conn_id, ip, assigned_port, name) {
            Ok(seat) => {
                let mut out = vec![Outbound::Unicast {
                    conn_id,
                    frame: Frame::IdAssign {
                        player_id: seat as i32,
                        port: assigned_port,
                    },
                }];

                // Rebroadcast the full roster after every registration.
                for (id, s) in self.registry.seats() {
                    out.push(Outbound::Broadcast {
                        frame: Frame::PlayerList {
                            id: id as i32,
                            name: s.name.clone(),
                        },
                    });
                }

                if self.status == GameStatus::Lobby && self.registry.seat_count() == MAX_PLAYERS {
                    out.extend(self.start_game());
                }
                out
            }
            Err(RegisterError::RoomFull) => {
                warn!("connection {} rejected: room full", conn_id);
                vec![
                    Outbound::Unicast {
                        conn_id,
                        frame: err_frame(error_code::ROOM_FULL, "ROOM_FULL"),
                    },
                    Outbound::Close { conn_id },
                ]
            }
            Err(RegisterError::DuplicateConnection) => {
                // Idempotent-rejecting: repeat CONNECTs change nothing.
                debug!("connection {} repeated CONNECT, ignoring", conn_id);
                Vec::new()
            }
            Err(RegisterError::EmptyName) => {
                debug!("connection {} sent empty name, ignoring", conn_id);
                Vec::new()
            }
            Err(RegisterError::UnknownConnection) => Vec::new(),
        }
    }

    /// Shuffles a fresh deck and deals it.
    fn start_game(&mut self) -> Vec<Outbound> {
        let mut deck = [0i32; CARD_COUNT];
        for (i, card) in deck.iter_mut().enumerate() {
            *card = i as i32;
        }
        deck.shuffle(&mut rand::thread_rng());
        self.deal(deck)
    }

    /// Deals a given deck: fixes the object table and the culprit, resets
    /// the alive flags and the turn cursor, and emits each player's hand
    /// plus the opening TURN.
    fn deal(&mut self, deck: [i32; CARD_COUNT]) -> Vec<Outbound> {
        self.deck = deck;
        self.status = GameStatus::InProgress;
        self.alive = [true; MAX_PLAYERS];
        self.current_turn = 0;

        for seat in 0..MAX_PLAYERS {
            let hand = &deck[seat * CARDS_PER_PLAYER..(seat + 1) * CARDS_PER_PLAYER];
            self.table[seat] = object_counts(hand);
        }
        self.culprit = deck[CARD_COUNT - 1];
        debug!(
            "culprit is card {} ({})",
            self.culprit, CARD_NAMES[self.culprit as usize]
        );

        let mut out = Vec::new();
        // Each player sees its own three cards and its own counts only,
        // never the full table.
        for (seat, s) in self.registry.seats() {
            let hand = &deck[seat * CARDS_PER_PLAYER..(seat + 1) * CARDS_PER_PLAYER];
            out.push(Outbound::Unicast {
                conn_id: s.conn_id,
                frame: Frame::Distribute {
                    cards: [hand[0], hand[1], hand[2]],
                    obj_counts: self.table[seat],
                },
            });
        }
        out.push(Outbound::Broadcast {
            frame: Frame::Turn { player_id: 0 },
        });

        info!("all seats filled, game started, seat 0 to act");
        out
    }

    /// Shared validation for all gameplay actions: the game must be in
    /// progress, the connection must hold a seat, the claimed player id
    /// must match that seat, and the seat must hold the turn.
    fn validate_actor(&self, conn_id: u64, claimed_id: i32) -> Result<usize, Frame> {
        if self.status != GameStatus::InProgress {
            return Err(err_frame(error_code::NOT_IN_PROGRESS, "NOT_IN_PROGRESS"));
        }
        let seat = self
            .registry
            .seat_of(conn_id)
            .ok_or_else(|| err_frame(error_code::NOT_REGISTERED, "NOT_REGISTERED"))?;
        if claimed_id != seat as i32 {
            return Err(err_frame(error_code::ID_MISMATCH, "ID_MISMATCH"));
        }
        // An eliminated seat never regains the turn; the cursor can still
        // point at one after the final elimination of a drawn game.
        if seat != self.current_turn || !self.alive[seat] {
            return Err(err_frame(error_code::WRONG_TURN, "WRONG_TURN"));
        }
        Ok(seat)
    }

    /// ASK_OBJECT: does any alive player hold the object at all?
    fn handle_ask_object(&mut self, conn_id: u64, claimed_id: i32, object_id: i32) -> Vec<Outbound> {
        let seat = match self.validate_actor(conn_id, claimed_id) {
            Ok(seat) => seat,
            Err(frame) => return vec![Outbound::Unicast { conn_id, frame }],
        };
        if !(0..OBJECT_COUNT as i32).contains(&object_id) {
            let frame = err_frame(error_code::INVALID_OBJECT, "INVALID_OBJECT");
            return vec![Outbound::Unicast { conn_id, frame }];
        }

        let found = (0..MAX_PLAYERS)
            .any(|p| self.alive[p] && self.table[p][object_id as usize] > 0);
        debug!(
            "seat {} asks about {}: found={}",
            seat, OBJECT_NAMES[object_id as usize], found
        );

        let mut out = vec![Outbound::Broadcast {
            frame: Frame::Verify {
                result_val: found as i32,
                target_player_id: -1,
                object_id,
            },
        }];
        self.advance_turn(&mut out);
        out
    }

    /// ASK_PLAYER: how many of the object does one alive player hold?
    fn handle_ask_player(
        &mut self,
        conn_id: u64,
        claimed_id: i32,
        target_player_id: i32,
        object_id: i32,
    ) -> Vec<Outbound> {
        let seat = match self.validate_actor(conn_id, claimed_id) {
            Ok(seat) => seat,
            Err(frame) => return vec![Outbound::Unicast { conn_id, frame }],
        };
        if !(0..MAX_PLAYERS as i32).contains(&target_player_id) {
            let frame = err_frame(error_code::INVALID_TARGET, "INVALID_TARGET");
            return vec![Outbound::Unicast { conn_id, frame }];
        }
        if !(0..OBJECT_COUNT as i32).contains(&object_id) {
            let frame = err_frame(error_code::INVALID_OBJECT, "INVALID_OBJECT");
            return vec![Outbound::Unicast { conn_id, frame }];
        }
        if !self.alive[target_player_id as usize] {
            let frame = err_frame(error_code::TARGET_DEAD, "TARGET_DEAD");
            return vec![Outbound::Unicast { conn_id, frame }];
        }

        let count = self.table[target_player_id as usize][object_id as usize];
        debug!(
            "seat {} asks seat {} about {}: count={}",
            seat, target_player_id, OBJECT_NAMES[object_id as usize], count
        );

        let mut out = vec![Outbound::Broadcast {
            frame: Frame::Verify {
                result_val: count,
                target_player_id,
                object_id,
            },
        }];
        self.advance_turn(&mut out);
        out
    }

    /// GUESS: name the culprit. Right ends the game; wrong eliminates the
    /// guesser and play continues.
    fn handle_guess(&mut self, conn_id: u64, claimed_id: i32, guessed_card_id: i32) -> Vec<Outbound> {
        let seat = match self.validate_actor(conn_id, claimed_id) {
            Ok(seat) => seat,
            Err(frame) => return vec![Outbound::Unicast { conn_id, frame }],
        };
        if !(0..CARD_COUNT as i32).contains(&guessed_card_id) {
            let frame = err_frame(error_code::INVALID_CARD, "INVALID_CARD");
            return vec![Outbound::Unicast { conn_id, frame }];
        }

        if guessed_card_id == self.culprit {
            info!(
                "seat {} named the culprit ({}), game over",
                seat, CARD_NAMES[self.culprit as usize]
            );
            self.status = GameStatus::Ended;
            vec![Outbound::Broadcast {
                frame: Frame::GameOver {
                    player_id: seat as i32,
                    is_winner: 1,
                },
            }]
        } else {
            info!("seat {} guessed wrong and is eliminated", seat);
            self.alive[seat] = false;
            let mut out = vec![Outbound::Broadcast {
                frame: Frame::GameOver {
                    player_id: seat as i32,
                    is_winner: 0,
                },
            }];
            self.advance_turn(&mut out);
            out
        }
    }

    /// Steps the cursor to the next alive seat, skipping eliminated ones.
    /// With no seat alive the game is a draw: a draw notice goes out and no
    /// further TURN is ever broadcast.
    fn advance_turn(&mut self, out: &mut Vec<Outbound>) {
        if !self.alive.iter().any(|&a| a) {
            info!("no players left alive, declaring a draw");
            out.push(Outbound::Broadcast {
                frame: Frame::GameOver {
                    player_id: -1,
                    is_winner: -1,
                },
            });
            return;
        }

        let mut next = self.current_turn;
        for _ in 0..MAX_PLAYERS {
            next = (next + 1) % MAX_PLAYERS;
            if self.alive[next] {
                break;
            }
        }
        self.current_turn = next;
        out.push(Outbound::Broadcast {
            frame: Frame::Turn {
                player_id: next as i32,
            },
        });
    }

    /// Resolves addressed frames into concrete channel handles, and applies
    /// any connection closures. Called under the game lock; the actual
    /// channel sends happen after the caller releases it.
    pub fn resolve(
        &mut self,
        outbound: Vec<Outbound>,
    ) -> Vec<(mpsc::UnboundedSender<Frame>, Frame)> {
        let mut deliveries = Vec::new();
        for item in outbound {
            match item {
                Outbound::Unicast { conn_id, frame } => {
                    // A missing connection is a disconnected seat; its
                    // frames are silently dropped.
                    if let Some(sender) = self.registry.sender_of(conn_id) {
                        deliveries.push((sender, frame));
                    }
                }
                Outbound::Broadcast { frame } => {
                    for sender in self.registry.all_senders() {
                        deliveries.push((sender, frame.clone()));
                    }
                }
                Outbound::Close { conn_id } => {
                    self.registry.close_conn(conn_id);
                }
            }
        }
        deliveries
    }
}
