use shared::{ClientEvent, MoveIntent, PromotionPiece, Square};

/// Builds the outbound request for a move that has already been committed
/// locally. Called exactly once per successful local move.
pub fn build_intent(from: Square, to: Square, promotion: Option<PromotionPiece>) -> MoveIntent {
    MoveIntent::new(from, to, promotion)
}

/// Wraps an intent into the event the channel sends.
pub fn emit(intent: MoveIntent) -> ClientEvent {
    ClientEvent::PlayerMove(intent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_plain_intent() {
        let intent = build_intent("e2".parse().unwrap(), "e4".parse().unwrap(), None);
        assert_eq!(intent.from().to_string(), "e2");
        assert_eq!(intent.to().to_string(), "e4");
        assert_eq!(intent.promotion(), None);
    }

    #[test]
    fn test_emit_player_move() {
        let intent = build_intent(
            "b2".parse().unwrap(),
            "b1".parse().unwrap(),
            Some(PromotionPiece::Rook),
        );
        assert_eq!(emit(intent), ClientEvent::PlayerMove(intent));
        assert_eq!(emit(intent).name(), "player:move");
    }
}
