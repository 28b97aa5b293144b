//! Session state and event dispatch
//!
//! Glues the game-state core to the outside world. Inbound server events and
//! player commands go in; a list of [`Effect`]s comes out for the I/O layer
//! to perform. Nothing here touches the network or the terminal.

use crate::error::SyncError;
use crate::game::{CommittedMove, GameStateStore, MoveOutcome};
use crate::input::Command;
use crate::intent;
use crate::position::{ChessPosition, PositionEngine};
use log::{info, warn};
use shared::{CaptureEvent, ClientEvent, ConnectionStatus, ServerEvent, MAX_ROASTS};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Send(ClientEvent),
    Cue(CaptureEvent),
    Render,
    /// A player action that could not be carried out, with the reason.
    Rejected(String),
    Quit,
}

pub struct GameSession<P: PositionEngine = ChessPosition> {
    store: GameStateStore<P>,
    roasts: VecDeque<String>,
    result: Option<String>,
    connection: ConnectionStatus,
}

impl<P: PositionEngine> GameSession<P> {
    pub fn new() -> Self {
        Self {
            store: GameStateStore::new(),
            roasts: VecDeque::with_capacity(MAX_ROASTS),
            result: None,
            connection: ConnectionStatus::Disconnected,
        }
    }

    pub fn store(&self) -> &GameStateStore<P> {
        &self.store
    }

    /// Most recent roasts, oldest first.
    pub fn roasts(&self) -> impl Iterator<Item = &str> {
        self.roasts.iter().map(String::as_str)
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    pub fn set_connection(&mut self, status: ConnectionStatus) -> Vec<Effect> {
        if self.connection == status {
            return Vec::new();
        }
        info!("Connection status: {}", status);
        self.connection = status;
        vec![Effect::Render]
    }

    pub fn handle_server_event(&mut self, event: ServerEvent) -> Vec<Effect> {
        match event {
            ServerEvent::GameInit { fen } => {
                if let Err(e) = self.store.start_game(&fen) {
                    warn!("game:init carried an unreadable position: {}", e);
                }
                self.roasts.clear();
                self.result = None;
                vec![Effect::Render]
            }

            ServerEvent::MoveMade { fen } | ServerEvent::BotMove { fen } => {
                match self.store.reconcile(&fen) {
                    Ok(reconciliation) if reconciliation.changed => {
                        let mut effects = vec![Effect::Render];
                        effects.extend(reconciliation.capture.map(Effect::Cue));
                        effects
                    }
                    // Echo of what we already show, or a dropped payload
                    _ => Vec::new(),
                }
            }

            ServerEvent::BotRoast { text } => {
                while self.roasts.len() >= MAX_ROASTS {
                    self.roasts.pop_front();
                }
                self.roasts.push_back(text);
                vec![Effect::Render]
            }

            ServerEvent::GameOver { result } => {
                info!("Game over: {}", result);
                self.result = Some(result);
                vec![Effect::Render]
            }
        }
    }

    pub fn handle_command(&mut self, command: Command) -> Vec<Effect> {
        // An intent that cannot be sent must not be played locally either
        if matches!(command, Command::Move { .. } | Command::Promote(_))
            && self.connection == ConnectionStatus::Disconnected
        {
            return Self::rejected(SyncError::Offline);
        }

        match command {
            Command::Move { from, to } => match self.store.apply_local_move(from, to) {
                Ok(MoveOutcome::Committed(committed)) => Self::committed_effects(committed),
                Ok(MoveOutcome::PromotionPending(_)) => vec![Effect::Render],
                Err(e) => Self::rejected(e),
            },

            Command::Promote(piece) => match self.store.select_promotion(piece) {
                Ok(committed) => Self::committed_effects(committed),
                Err(e) => Self::rejected(e),
            },

            Command::CancelPromotion => match self.store.cancel_promotion() {
                Some(_) => vec![Effect::Render],
                None => Self::rejected(SyncError::NoPendingPromotion),
            },

            Command::NewGame => vec![Effect::Send(ClientEvent::Reset)],

            Command::Chat(text) => vec![Effect::Send(ClientEvent::ChatMessage { text })],

            Command::Help => vec![Effect::Render],

            Command::Quit => vec![Effect::Quit],
        }
    }

    fn committed_effects(committed: CommittedMove) -> Vec<Effect> {
        let mut effects = vec![Effect::Render];
        effects.extend(committed.capture.map(Effect::Cue));
        effects.push(Effect::Send(intent::emit(committed.intent)));
        effects
    }

    fn rejected(error: SyncError) -> Vec<Effect> {
        vec![Effect::Rejected(error.to_string()), Effect::Render]
    }
}

impl<P: PositionEngine> Default for GameSession<P> {
    fn default() -> Self {
        Self::new()
    }
}
