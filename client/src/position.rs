//! Position engine contract and its shakmaty-backed implementation
//!
//! The game-state core only ever talks to a position through the
//! [`PositionEngine`] trait: load an encoding, look at a square, ask whether
//! a from/to pair is legal, apply a move, and re-encode. A position value is
//! immutable; applying a move produces a new value, so rolling back is a
//! matter of keeping the old one.

use crate::error::SyncError;
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, EnPassantMode, File, Move, Position, Rank};
use shared::{Color, Piece, PromotionPiece, Role, Square, START_ENCODING};
use std::fmt;

pub trait PositionEngine: Clone + Sized {
    /// The standard initial arrangement.
    fn initial() -> Self;

    /// Parses a board encoding. The literal `"start"` is the initial arrangement.
    fn load(encoding: &str) -> Result<Self, SyncError>;

    fn piece_at(&self, square: Square) -> Option<Piece>;

    /// True if some legal move goes from `from` to `to`, whatever the promotion piece.
    fn is_legal_move(&self, from: Square, to: Square) -> bool;

    fn apply_move(
        &self,
        from: Square,
        to: Square,
        promotion: Option<PromotionPiece>,
    ) -> Result<Self, SyncError>;

    fn encode(&self) -> String;

    fn turn(&self) -> Color;
}

/// A chess position plus its canonical encoding.
///
/// Two positions are equal when they encode identically, which is what the
/// display cares about.
#[derive(Debug, Clone)]
pub struct ChessPosition {
    chess: Chess,
    encoding: String,
}

impl ChessPosition {
    fn from_chess(chess: Chess) -> Self {
        let encoding = Fen::from_position(chess.clone(), EnPassantMode::Legal).to_string();
        Self { chess, encoding }
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    fn matching_moves(&self, from: Square, to: Square) -> impl Iterator<Item = Move> {
        let from = to_board_square(from);
        let to = to_board_square(to);
        self.chess
            .legal_moves()
            .into_iter()
            .filter(move |m| move_matches(m, from, to))
    }
}

impl PositionEngine for ChessPosition {
    fn initial() -> Self {
        Self::from_chess(Chess::default())
    }

    fn load(encoding: &str) -> Result<Self, SyncError> {
        let trimmed = encoding.trim();
        if trimmed == START_ENCODING {
            return Ok(Self::initial());
        }

        let fen = Fen::from_ascii(trimmed.as_bytes())
            .map_err(|e| SyncError::invalid_encoding(encoding, e))?;
        let chess: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| SyncError::invalid_encoding(encoding, e))?;

        Ok(Self::from_chess(chess))
    }

    fn piece_at(&self, square: Square) -> Option<Piece> {
        self.chess
            .board()
            .piece_at(to_board_square(square))
            .map(from_board_piece)
    }

    fn is_legal_move(&self, from: Square, to: Square) -> bool {
        self.matching_moves(from, to).next().is_some()
    }

    fn apply_move(
        &self,
        from: Square,
        to: Square,
        promotion: Option<PromotionPiece>,
    ) -> Result<Self, SyncError> {
        let wanted = promotion.map(|piece| to_board_role(piece.role()));
        let chosen = self
            .matching_moves(from, to)
            .find(|m| m.promotion() == wanted)
            .ok_or(SyncError::IllegalMove { from, to })?;

        let mut chess = self.chess.clone();
        chess.play_unchecked(&chosen);
        Ok(Self::from_chess(chess))
    }

    fn encode(&self) -> String {
        self.encoding.clone()
    }

    fn turn(&self) -> Color {
        from_board_color(self.chess.turn())
    }
}

impl PartialEq for ChessPosition {
    fn eq(&self, other: &Self) -> bool {
        self.encoding == other.encoding
    }
}

impl Eq for ChessPosition {}

impl fmt::Display for ChessPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoding)
    }
}

// Castling is dragged as king-to-destination (e1g1), but the rules engine
// encodes it as king-takes-rook.
fn move_matches(m: &Move, from: shakmaty::Square, to: shakmaty::Square) -> bool {
    match m {
        Move::Castle { king, rook } => *king == from && castle_destination(*king, *rook) == to,
        _ => m.from() == Some(from) && m.to() == to,
    }
}

fn castle_destination(king: shakmaty::Square, rook: shakmaty::Square) -> shakmaty::Square {
    let file = if rook.file() < king.file() {
        File::C
    } else {
        File::G
    };
    shakmaty::Square::from_coords(file, king.rank())
}

fn to_board_square(square: Square) -> shakmaty::Square {
    shakmaty::Square::from_coords(
        File::new(u32::from(square.file())),
        Rank::new(u32::from(square.rank())),
    )
}

fn to_board_role(role: Role) -> shakmaty::Role {
    match role {
        Role::Pawn => shakmaty::Role::Pawn,
        Role::Knight => shakmaty::Role::Knight,
        Role::Bishop => shakmaty::Role::Bishop,
        Role::Rook => shakmaty::Role::Rook,
        Role::Queen => shakmaty::Role::Queen,
        Role::King => shakmaty::Role::King,
    }
}

fn from_board_color(color: shakmaty::Color) -> Color {
    match color {
        shakmaty::Color::White => Color::White,
        shakmaty::Color::Black => Color::Black,
    }
}

fn from_board_piece(piece: shakmaty::Piece) -> Piece {
    let role = match piece.role {
        shakmaty::Role::Pawn => Role::Pawn,
        shakmaty::Role::Knight => Role::Knight,
        shakmaty::Role::Bishop => Role::Bishop,
        shakmaty::Role::Rook => Role::Rook,
        shakmaty::Role::Queen => Role::Queen,
        shakmaty::Role::King => Role::King,
    };
    Piece::new(from_board_color(piece.color), role)
}
