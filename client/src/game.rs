use crate::capture;
use crate::error::SyncError;
use crate::intent::build_intent;
use crate::position::{ChessPosition, PositionEngine};
use crate::promotion::{requires_choice, PendingPromotion, PromotionFlow};
use log::{debug, info, warn};
use shared::{CaptureEvent, MoveIntent, PromotionPiece, Square};

/// Whether the displayed position came from us or from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    Speculative,
    Confirmed,
}

/// A local move that was applied to the board and must be sent exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommittedMove {
    pub intent: MoveIntent,
    pub capture: Option<CaptureEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Committed(CommittedMove),
    PromotionPending(PendingPromotion),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    /// False when the pushed position matches what is already displayed.
    pub changed: bool,
    pub capture: Option<CaptureEvent>,
}

/// Owns the displayed position and the promotion slot.
///
/// Every mutation replaces the position value wholesale; nothing is undone
/// in place. Server pushes always win over local speculation.
pub struct GameStateStore<P: PositionEngine = ChessPosition> {
    position: P,
    authority: Authority,
    promotion: PromotionFlow,
}

impl<P: PositionEngine> GameStateStore<P> {
    pub fn new() -> Self {
        Self {
            position: P::initial(),
            authority: Authority::Confirmed,
            promotion: PromotionFlow::Idle,
        }
    }

    pub fn position(&self) -> &P {
        &self.position
    }

    pub fn encoding(&self) -> String {
        self.position.encode()
    }

    pub fn authority(&self) -> Authority {
        self.authority
    }

    pub fn is_speculative(&self) -> bool {
        self.authority == Authority::Speculative
    }

    pub fn pending_promotion(&self) -> Option<&PendingPromotion> {
        self.promotion.pending()
    }

    /// Speculatively applies a dragged move.
    ///
    /// A pawn reaching its last rank is parked in the promotion flow and the
    /// board is left untouched until [`select_promotion`](Self::select_promotion).
    pub fn apply_local_move(
        &mut self,
        from: Square,
        to: Square,
    ) -> Result<MoveOutcome, SyncError> {
        if let Some(pending) = self.promotion.pending() {
            return Err(SyncError::PromotionInProgress {
                from: pending.from,
                to: pending.to,
            });
        }

        if requires_choice(self.position.piece_at(from), to) {
            if !self.position.is_legal_move(from, to) {
                debug!("Rejected promotion move {}{}", from, to);
                return Err(SyncError::IllegalMove { from, to });
            }

            let pending = PendingPromotion { from, to };
            self.promotion.begin(pending)?;
            return Ok(MoveOutcome::PromotionPending(pending));
        }

        self.commit(from, to, None).map(MoveOutcome::Committed)
    }

    /// Completes the parked promotion with the player's piece.
    pub fn select_promotion(
        &mut self,
        piece: PromotionPiece,
    ) -> Result<CommittedMove, SyncError> {
        let choice = self.promotion.resolve(piece).ok_or_else(|| {
            warn!("Promotion piece {:?} chosen with no promotion pending", piece);
            SyncError::NoPendingPromotion
        })?;

        self.commit(choice.from, choice.to, Some(choice.piece))
    }

    /// Drops the parked promotion. The board is exactly as before the drag.
    pub fn cancel_promotion(&mut self) -> Option<PendingPromotion> {
        self.promotion.cancel()
    }

    fn commit(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PromotionPiece>,
    ) -> Result<CommittedMove, SyncError> {
        let capture = capture::signal(&self.position, to);

        let next = self
            .position
            .apply_move(from, to, promotion)
            .inspect_err(|e| debug!("Rejected local move: {}", e))?;

        self.position = next;
        self.authority = Authority::Speculative;

        Ok(CommittedMove {
            intent: build_intent(from, to, promotion),
            capture,
        })
    }

    /// Replaces the displayed position with a server-pushed one.
    ///
    /// A malformed encoding leaves the current position in place. A pending
    /// promotion survives only if the pushed position is the one it was
    /// started from.
    pub fn reconcile(&mut self, encoding: &str) -> Result<Reconciliation, SyncError> {
        let incoming =
            P::load(encoding).inspect_err(|e| warn!("Discarding server position: {}", e))?;

        let changed = incoming.encode() != self.position.encode();
        let mut capture = None;

        if changed {
            if self.is_speculative() {
                debug!("Server position replaces local speculation");
            }
            if let Some(pending) = self.promotion.cancel() {
                info!(
                    "Dropped promotion {}{}: position changed underneath it",
                    pending.from, pending.to
                );
            }
            capture = capture::signal_from_diff(&self.position, &incoming);
        }

        self.position = incoming;
        self.authority = Authority::Confirmed;

        Ok(Reconciliation { changed, capture })
    }

    pub fn reset_to_initial(&mut self) {
        self.position = P::initial();
        self.authority = Authority::Confirmed;
        self.promotion = PromotionFlow::Idle;
    }

    /// Handles a new game announced by the server. An unreadable encoding
    /// leaves the fresh initial arrangement.
    pub fn start_game(&mut self, encoding: &str) -> Result<(), SyncError> {
        self.reset_to_initial();
        self.reconcile(encoding).map(|_| ())
    }
}

impl<P: PositionEngine> Default for GameStateStore<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Color, INITIAL_FEN};

    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
    const PROMOTION_FEN: &str = "7k/P7/8/8/8/8/8/K7 w - - 0 1";

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn store_at(fen: &str) -> GameStateStore {
        let mut store = GameStateStore::new();
        store.reconcile(fen).unwrap();
        store
    }

    fn committed(outcome: MoveOutcome) -> CommittedMove {
        match outcome {
            MoveOutcome::Committed(committed) => committed,
            other => panic!("Expected committed move, got {:?}", other),
        }
    }

    #[test]
    fn test_store_creation() {
        let store: GameStateStore = GameStateStore::new();
        assert_eq!(store.encoding(), INITIAL_FEN);
        assert_eq!(store.authority(), Authority::Confirmed);
        assert!(store.pending_promotion().is_none());
    }

    #[test]
    fn test_local_move_commits_speculatively() {
        let mut store: GameStateStore = GameStateStore::new();
        let result = committed(store.apply_local_move(sq("e2"), sq("e4")).unwrap());

        assert_eq!(result.intent, MoveIntent::new(sq("e2"), sq("e4"), None));
        assert_eq!(result.capture, None);
        assert_eq!(store.encoding(), AFTER_E4);
        assert!(store.is_speculative());
    }

    #[test]
    fn test_echo_is_a_no_op() {
        let mut store: GameStateStore = GameStateStore::new();
        store.apply_local_move(sq("e2"), sq("e4")).unwrap();
        let before = store.encoding();

        let reconciliation = store.reconcile(AFTER_E4).unwrap();

        assert!(!reconciliation.changed);
        assert_eq!(reconciliation.capture, None);
        assert_eq!(store.encoding(), before);
        assert_eq!(store.authority(), Authority::Confirmed);
    }

    #[test]
    fn test_server_overwrites_speculation() {
        let mut store: GameStateStore = GameStateStore::new();
        store.apply_local_move(sq("e2"), sq("e4")).unwrap();

        let server = "rnbqkbnr/pppppppp/8/8/3P4/8/PPP1PPPP/RNBQKBNR b KQkq - 0 1";
        let reconciliation = store.reconcile(server).unwrap();

        assert!(reconciliation.changed);
        assert_eq!(store.encoding(), server);
        assert_eq!(store.position().piece_at(sq("e4")), None);
        assert_eq!(store.authority(), Authority::Confirmed);
    }

    #[test]
    fn test_capture_signalled_from_pre_move_board() {
        let mut store = store_at("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2");
        let result = committed(store.apply_local_move(sq("e4"), sq("d5")).unwrap());

        assert_eq!(
            result.capture,
            Some(CaptureEvent {
                captured_color: Color::Black
            })
        );
    }

    #[test]
    fn test_own_piece_destination_is_illegal() {
        let mut store: GameStateStore = GameStateStore::new();
        assert_eq!(
            store.apply_local_move(sq("d1"), sq("d2")),
            Err(SyncError::IllegalMove {
                from: sq("d1"),
                to: sq("d2")
            })
        );
        assert_eq!(store.encoding(), INITIAL_FEN);
        assert!(!store.is_speculative());
    }

    #[test]
    fn test_illegal_moves_leave_position_unchanged() {
        let mut store: GameStateStore = GameStateStore::new();
        let attempts = [("e2", "e5"), ("e7", "e5"), ("a1", "a3"), ("e4", "e5"), ("g1", "g3")];
        for (from, to) in attempts {
            assert!(store.apply_local_move(sq(from), sq(to)).is_err());
            assert_eq!(store.encoding(), INITIAL_FEN);
        }
    }

    #[test]
    fn test_malformed_reconcile_keeps_position() {
        let mut store: GameStateStore = GameStateStore::new();
        store.apply_local_move(sq("e2"), sq("e4")).unwrap();

        let result = store.reconcile("not-a-valid-encoding");

        assert!(matches!(result, Err(SyncError::InvalidEncoding { .. })));
        assert_eq!(store.encoding(), AFTER_E4);
        assert!(store.is_speculative());
    }

    #[test]
    fn test_promotion_parks_without_mutation() {
        let mut store = store_at(PROMOTION_FEN);
        let outcome = store.apply_local_move(sq("a7"), sq("a8")).unwrap();

        assert_eq!(
            outcome,
            MoveOutcome::PromotionPending(PendingPromotion {
                from: sq("a7"),
                to: sq("a8")
            })
        );
        assert_eq!(store.encoding(), PROMOTION_FEN);
        assert!(store.pending_promotion().is_some());
    }

    #[test]
    fn test_promotion_commit_emits_one_intent() {
        let mut store = store_at(PROMOTION_FEN);
        store.apply_local_move(sq("a7"), sq("a8")).unwrap();

        let result = store.select_promotion(PromotionPiece::Rook).unwrap();

        assert_eq!(
            result.intent,
            MoveIntent::new(sq("a7"), sq("a8"), Some(PromotionPiece::Rook))
        );
        assert_eq!(store.encoding(), "R6k/8/8/8/8/8/8/K7 b - - 0 1");
        assert!(store.pending_promotion().is_none());

        // A second choice has nothing to resolve
        assert_eq!(
            store.select_promotion(PromotionPiece::Queen),
            Err(SyncError::NoPendingPromotion)
        );
    }

    #[test]
    fn test_black_promotion() {
        let mut store = store_at("k7/8/8/8/8/8/p6K/8 b - - 0 1");
        store.apply_local_move(sq("a2"), sq("a1")).unwrap();
        let result = store.select_promotion(PromotionPiece::Queen).unwrap();
        assert_eq!(result.intent.promotion(), Some(PromotionPiece::Queen));
        assert_eq!(store.encoding(), "k7/8/8/8/8/8/7K/q7 w - - 0 2");
    }

    #[test]
    fn test_promotion_cancel() {
        let mut store = store_at(PROMOTION_FEN);
        store.apply_local_move(sq("a7"), sq("a8")).unwrap();

        let cancelled = store.cancel_promotion();

        assert_eq!(
            cancelled,
            Some(PendingPromotion {
                from: sq("a7"),
                to: sq("a8")
            })
        );
        assert_eq!(store.encoding(), PROMOTION_FEN);
        assert!(store.pending_promotion().is_none());
    }

    #[test]
    fn test_moves_blocked_while_awaiting_choice() {
        let mut store = store_at(PROMOTION_FEN);
        store.apply_local_move(sq("a7"), sq("a8")).unwrap();

        assert_eq!(
            store.apply_local_move(sq("a1"), sq("b1")),
            Err(SyncError::PromotionInProgress {
                from: sq("a7"),
                to: sq("a8")
            })
        );
        assert_eq!(store.encoding(), PROMOTION_FEN);
    }

    #[test]
    fn test_impossible_promotion_is_rejected_up_front() {
        // a7 pawn cannot jump sideways onto b8
        let mut store = store_at(PROMOTION_FEN);
        assert_eq!(
            store.apply_local_move(sq("a7"), sq("b8")),
            Err(SyncError::IllegalMove {
                from: sq("a7"),
                to: sq("b8")
            })
        );
        assert!(store.pending_promotion().is_none());
    }

    #[test]
    fn test_reconcile_during_promotion() {
        let mut store = store_at(PROMOTION_FEN);
        store.apply_local_move(sq("a7"), sq("a8")).unwrap();

        // Same position pushed again: the choice stays open
        assert!(!store.reconcile(PROMOTION_FEN).unwrap().changed);
        assert!(store.pending_promotion().is_some());

        // Different position: the parked move is gone
        assert!(store.reconcile(INITIAL_FEN).unwrap().changed);
        assert!(store.pending_promotion().is_none());
        assert_eq!(
            store.select_promotion(PromotionPiece::Queen),
            Err(SyncError::NoPendingPromotion)
        );
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut store = store_at(PROMOTION_FEN);
        store.apply_local_move(sq("a7"), sq("a8")).unwrap();

        store.reset_to_initial();

        assert_eq!(store.encoding(), INITIAL_FEN);
        assert!(store.pending_promotion().is_none());
    }

    #[test]
    fn test_start_game() {
        let mut store = store_at(PROMOTION_FEN);
        store.start_game("start").unwrap();
        assert_eq!(store.encoding(), INITIAL_FEN);

        let mut store = store_at(PROMOTION_FEN);
        assert!(store.start_game("garbage").is_err());
        assert_eq!(store.encoding(), INITIAL_FEN);
    }

    #[test]
    fn test_reconcile_reports_opponent_capture() {
        let mut store = store_at("rnbqkbnr/ppp1pppp/8/3P4/8/8/PPPP1PPP/RNBQKBNR b KQkq - 0 2");
        let reconciliation = store
            .reconcile("rnb1kbnr/ppp1pppp/8/3q4/8/8/PPPP1PPP/RNBQKBNR w KQkq - 0 3")
            .unwrap();
        assert_eq!(
            reconciliation.capture,
            Some(CaptureEvent {
                captured_color: Color::White
            })
        );
    }
}
