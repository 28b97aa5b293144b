//! Two-step pawn promotion flow
//!
//! A pawn move onto its last rank cannot be applied until the player picks
//! a piece. The flow parks the move here without touching the board; the
//! player then either resolves it with a choice or cancels it.

use crate::error::SyncError;
use log::debug;
use shared::{Piece, PromotionPiece, Role, Square};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingPromotion {
    pub from: Square,
    pub to: Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromotionChoice {
    pub from: Square,
    pub to: Square,
    pub piece: PromotionPiece,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromotionFlow {
    #[default]
    Idle,
    AwaitingChoice(PendingPromotion),
}

impl PromotionFlow {
    pub fn pending(&self) -> Option<&PendingPromotion> {
        match self {
            PromotionFlow::Idle => None,
            PromotionFlow::AwaitingChoice(pending) => Some(pending),
        }
    }

    pub fn is_awaiting(&self) -> bool {
        matches!(self, PromotionFlow::AwaitingChoice(_))
    }

    /// Idle -> AwaitingChoice. Only one promotion may be parked at a time.
    pub fn begin(&mut self, pending: PendingPromotion) -> Result<(), SyncError> {
        if let PromotionFlow::AwaitingChoice(current) = self {
            return Err(SyncError::PromotionInProgress {
                from: current.from,
                to: current.to,
            });
        }

        debug!("Awaiting promotion choice for {}{}", pending.from, pending.to);
        *self = PromotionFlow::AwaitingChoice(pending);
        Ok(())
    }

    /// AwaitingChoice -> Idle with the player's piece bound to the move.
    pub fn resolve(&mut self, piece: PromotionPiece) -> Option<PromotionChoice> {
        match std::mem::take(self) {
            PromotionFlow::AwaitingChoice(PendingPromotion { from, to }) => {
                Some(PromotionChoice { from, to, piece })
            }
            PromotionFlow::Idle => None,
        }
    }

    /// AwaitingChoice -> Idle, dropping the parked move.
    pub fn cancel(&mut self) -> Option<PendingPromotion> {
        match std::mem::take(self) {
            PromotionFlow::AwaitingChoice(pending) => {
                debug!("Promotion {}{} cancelled", pending.from, pending.to);
                Some(pending)
            }
            PromotionFlow::Idle => None,
        }
    }
}

/// Positional promotion test: a pawn heading for its colour's last rank.
pub fn requires_choice(mover: Option<Piece>, to: Square) -> bool {
    match mover {
        Some(piece) => piece.role == Role::Pawn && to.rank() == piece.color.promotion_rank(),
        None => false,
    }
}
