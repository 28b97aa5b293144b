//! Capture detection from position snapshots

use crate::position::PositionEngine;
use shared::{CaptureEvent, Color, Square};

/// Reports a capture if `to` holds a piece on the pre-move board.
///
/// Must be evaluated before the move is applied: afterwards the destination
/// holds the mover.
pub fn signal<P: PositionEngine>(before: &P, to: Square) -> Option<CaptureEvent> {
    before.piece_at(to).map(|piece| CaptureEvent {
        captured_color: piece.color,
    })
}

/// Derives a capture from two whole-board snapshots, for moves we only see
/// as a pushed position.
pub fn signal_from_diff<P: PositionEngine>(before: &P, after: &P) -> Option<CaptureEvent> {
    let (white_before, black_before) = material(before);
    let (white_after, black_after) = material(after);

    match (white_after < white_before, black_after < black_before) {
        (true, false) => Some(CaptureEvent {
            captured_color: Color::White,
        }),
        (false, true) => Some(CaptureEvent {
            captured_color: Color::Black,
        }),
        _ => None,
    }
}

fn material<P: PositionEngine>(position: &P) -> (usize, usize) {
    Square::all()
        .filter_map(|square| position.piece_at(square))
        .fold((0, 0), |(white, black), piece| match piece.color {
            Color::White => (white + 1, black),
            Color::Black => (white, black + 1),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::ChessPosition;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn load(fen: &str) -> ChessPosition {
        ChessPosition::load(fen).unwrap()
    }

    #[test]
    fn test_signal_occupied_destination() {
        let before = load("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2");
        assert_eq!(
            signal(&before, sq("d5")),
            Some(CaptureEvent {
                captured_color: Color::Black
            })
        );
    }

    #[test]
    fn test_signal_empty_destination() {
        let before = ChessPosition::initial();
        assert_eq!(signal(&before, sq("e4")), None);
    }

    #[test]
    fn test_diff_detects_captured_side() {
        let before = load("rnbqkbnr/ppp1pppp/8/3P4/8/8/PPPP1PPP/RNBQKBNR b KQkq - 0 2");
        let after = load("rnb1kbnr/ppp1pppp/8/3q4/8/8/PPPP1PPP/RNBQKBNR w KQkq - 0 3");
        assert_eq!(
            signal_from_diff(&before, &after),
            Some(CaptureEvent {
                captured_color: Color::White
            })
        );
    }

    #[test]
    fn test_diff_quiet_move() {
        let before = ChessPosition::initial();
        let after = before.apply_move(sq("g1"), sq("f3"), None).unwrap();
        assert_eq!(signal_from_diff(&before, &after), None);
        assert_eq!(signal_from_diff(&before, &before), None);
    }

    #[test]
    fn test_diff_reset_is_not_a_capture() {
        let middlegame = load("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert_eq!(signal_from_diff(&middlegame, &ChessPosition::initial()), None);
    }
}
