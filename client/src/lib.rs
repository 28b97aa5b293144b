//! # Chess Sync Client Library
//!
//! Client-side game-state synchronisation for a chess game played against a
//! server-hosted bot over a persistent Socket.IO channel.
//!
//! ## Architecture Overview
//!
//! ### Speculative Moves
//! A legal move made by the player is applied to the local position at once
//! and sent to the server as a move intent. The board never waits on the
//! round trip.
//!
//! ### Server Reconciliation
//! Every position the server pushes replaces the local one wholesale. The
//! client never merges or replays; the server always wins. An echo of our own
//! speculative move is recognised by its encoding and changes nothing.
//!
//! ### Two-Step Promotion
//! A pawn move onto the last rank is parked until the player picks a piece,
//! so exactly one intent carrying the choice is ever sent.
//!
//! ## Module Organization
//!
//! - `position`: the [`position::PositionEngine`] seam and its shakmaty implementation
//! - `game`: the authoritative-or-speculative [`game::GameStateStore`]
//! - `promotion`: the promotion state machine
//! - `capture`: capture detection for local and pushed moves
//! - `intent`: building outbound move intents
//! - `session`: event dispatch producing side effects for the I/O layer
//! - `input`, `rendering`: the terminal front-end
//! - `network`: the websocket run loop
//!
//! ## Usage Example
//!
//! ```rust
//! use client::game::{GameStateStore, MoveOutcome};
//!
//! let mut store: GameStateStore = GameStateStore::new();
//! let outcome = store
//!     .apply_local_move("e2".parse().unwrap(), "e4".parse().unwrap())
//!     .unwrap();
//! assert!(matches!(outcome, MoveOutcome::Committed(_)));
//!
//! // The server confirms with the same position: nothing changes
//! let reconciliation = store
//!     .reconcile("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1")
//!     .unwrap();
//! assert!(!reconciliation.changed);
//! ```

pub mod capture;
pub mod error;
pub mod game;
pub mod input;
pub mod intent;
pub mod network;
pub mod position;
pub mod promotion;
pub mod rendering;
pub mod session;
