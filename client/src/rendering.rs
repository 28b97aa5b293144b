use crate::game::Authority;
use crate::input::HELP;
use crate::position::PositionEngine;
use crate::session::GameSession;
use log::{debug, info};
use shared::{CaptureEvent, Color, ConnectionStatus, Piece, PromotionPiece, Square};
use std::io::{self, Write};

const ROASTS_SHOWN: usize = 5;

/// Receives side-effect cues derived from position changes.
pub trait CueSink {
    fn capture(&mut self, event: CaptureEvent);
}

/// Rings the terminal bell on captures.
pub struct TerminalCues<W: Write> {
    out: W,
}

impl<W: Write> TerminalCues<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> CueSink for TerminalCues<W> {
    fn capture(&mut self, event: CaptureEvent) {
        info!("Capture: a {} piece was taken", event.captured_color);
        if let Err(e) = self.out.write_all(b"\x07").and_then(|_| self.out.flush()) {
            debug!("Could not ring bell: {}", e);
        }
    }
}

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Renderer
    }

    pub fn render<W: Write, P: PositionEngine>(
        &self,
        out: &mut W,
        session: &GameSession<P>,
    ) -> io::Result<()> {
        writeln!(out)?;
        self.draw_status(out, session)?;
        self.draw_board(out, session.store().position())?;

        if let Some(pending) = session.store().pending_promotion() {
            self.draw_promotion_prompt(out, pending.from, pending.to)?;
        }

        if let Some(result) = session.result() {
            writeln!(out, "*** Game Over: {} *** (type `new` to play again)", result)?;
        }

        self.draw_roasts(out, session)?;
        out.flush()
    }

    fn draw_status<W: Write, P: PositionEngine>(
        &self,
        out: &mut W,
        session: &GameSession<P>,
    ) -> io::Result<()> {
        let badge = match session.connection() {
            ConnectionStatus::Connected => "●",
            ConnectionStatus::Disconnected => "○",
        };
        let turn = match session.store().position().turn() {
            Color::White => "White",
            Color::Black => "Black",
        };
        let marker = match session.store().authority() {
            Authority::Speculative => " (awaiting server)",
            Authority::Confirmed => "",
        };

        writeln!(
            out,
            "{} Status: {} | {} to move{}",
            badge,
            session.connection(),
            turn,
            marker
        )
    }

    /// Draws the board with rank 8 on top.
    pub fn draw_board<W: Write, P: PositionEngine>(
        &self,
        out: &mut W,
        position: &P,
    ) -> io::Result<()> {
        for rank in (0..8u8).rev() {
            write!(out, "{} ", rank + 1)?;
            for file in 0..8u8 {
                let symbol = Square::new(file, rank)
                    .and_then(|square| position.piece_at(square))
                    .map(Piece::to_char)
                    .unwrap_or('.');
                write!(out, " {}", symbol)?;
            }
            writeln!(out)?;
        }
        writeln!(out, "   a b c d e f g h")
    }

    fn draw_promotion_prompt<W: Write>(
        &self,
        out: &mut W,
        from: Square,
        to: Square,
    ) -> io::Result<()> {
        let choices: Vec<String> = PromotionPiece::ALL
            .iter()
            .map(|piece| piece.as_char().to_string())
            .collect();
        writeln!(
            out,
            "Promote pawn {}{}: choose {} or `cancel`",
            from,
            to,
            choices.join("/")
        )
    }

    fn draw_roasts<W: Write, P: PositionEngine>(
        &self,
        out: &mut W,
        session: &GameSession<P>,
    ) -> io::Result<()> {
        let roasts: Vec<&str> = session.roasts().collect();
        if roasts.is_empty() {
            return Ok(());
        }

        writeln!(out, "-- bot says --")?;
        for roast in &roasts[roasts.len().saturating_sub(ROASTS_SHOWN)..] {
            writeln!(out, "  {}", roast)?;
        }
        Ok(())
    }

    pub fn rejected<W: Write>(&self, out: &mut W, reason: &str) -> io::Result<()> {
        writeln!(out, "✗ {}", reason)
    }

    pub fn help<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", HELP)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
