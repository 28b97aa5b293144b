use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod socketio;

use socketio::Frame;

pub const INITIAL_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
/// Literal the server and the board widget use for the initial arrangement.
pub const START_ENCODING: &str = "start";
pub const MAX_ROASTS: usize = 20;
pub const MAX_CHAT_LEN: usize = 200;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty frame")]
    Empty,
    #[error("unknown engine.io packet type {0:?}")]
    UnknownPacket(char),
    #[error("unknown socket.io packet type {0:?}")]
    UnknownMessage(char),
    #[error("malformed json in frame: {0}")]
    Json(String),
    #[error("event frame carries no event name")]
    MissingEventName,
    #[error("unknown event {0:?}")]
    UnknownEvent(String),
    #[error("invalid payload for {event}: {reason}")]
    Payload { event: String, reason: String },
    #[error("invalid square {0:?}")]
    InvalidSquare(String),
    #[error("invalid promotion piece {0:?}")]
    InvalidPromotion(String),
}

/// A board coordinate, file `a..h` and rank `1..8`, stored zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        (file < 8 && rank < 8).then_some(Self { file, rank })
    }

    pub fn file(self) -> u8 {
        self.file
    }

    pub fn rank(self) -> u8 {
        self.rank
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|rank| (0..8u8).map(move |file| Square { file, rank }))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            char::from(b'a' + self.file),
            char::from(b'1' + self.rank)
        )
    }
}

impl FromStr for Square {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            [file @ b'a'..=b'h', rank @ b'1'..=b'8'] => Ok(Square {
                file: file - b'a',
                rank: rank - b'1',
            }),
            _ => Err(ProtocolError::InvalidSquare(s.to_string())),
        }
    }
}

impl TryFrom<String> for Square {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Square> for String {
    fn from(square: Square) -> Self {
        square.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Zero-based rank on which a pawn of this colour promotes.
    pub fn promotion_rank(self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => f.write_str("white"),
            Color::Black => f.write_str("black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub role: Role,
}

impl Piece {
    pub fn new(color: Color, role: Role) -> Self {
        Self { color, role }
    }

    /// Board-notation letter, upper case for white.
    pub fn to_char(self) -> char {
        let c = match self.role {
            Role::Pawn => 'p',
            Role::Knight => 'n',
            Role::Bishop => 'b',
            Role::Rook => 'r',
            Role::Queen => 'q',
            Role::King => 'k',
        };
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }
}

/// Piece types a pawn may promote to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromotionPiece {
    #[serde(rename = "q")]
    Queen,
    #[serde(rename = "r")]
    Rook,
    #[serde(rename = "b")]
    Bishop,
    #[serde(rename = "n")]
    Knight,
}

impl PromotionPiece {
    pub const ALL: [PromotionPiece; 4] = [
        PromotionPiece::Queen,
        PromotionPiece::Rook,
        PromotionPiece::Bishop,
        PromotionPiece::Knight,
    ];

    pub fn role(self) -> Role {
        match self {
            PromotionPiece::Queen => Role::Queen,
            PromotionPiece::Rook => Role::Rook,
            PromotionPiece::Bishop => Role::Bishop,
            PromotionPiece::Knight => Role::Knight,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            PromotionPiece::Queen => 'q',
            PromotionPiece::Rook => 'r',
            PromotionPiece::Bishop => 'b',
            PromotionPiece::Knight => 'n',
        }
    }
}

impl FromStr for PromotionPiece {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "q" | "queen" => Ok(PromotionPiece::Queen),
            "r" | "rook" => Ok(PromotionPiece::Rook),
            "b" | "bishop" => Ok(PromotionPiece::Bishop),
            "n" | "knight" => Ok(PromotionPiece::Knight),
            _ => Err(ProtocolError::InvalidPromotion(s.to_string())),
        }
    }
}

/// Move request sent to the server after a successful speculative commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    from: Square,
    to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    promotion: Option<PromotionPiece>,
}

impl MoveIntent {
    pub fn new(from: Square, to: Square, promotion: Option<PromotionPiece>) -> Self {
        Self {
            from,
            to,
            promotion,
        }
    }

    pub fn from(&self) -> Square {
        self.from
    }

    pub fn to(&self) -> Square {
        self.to
    }

    pub fn promotion(&self) -> Option<PromotionPiece> {
        self.promotion
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureEvent {
    #[serde(rename = "capturedColor")]
    pub captured_color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    #[default]
    Disconnected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connected => f.write_str("Connected"),
            ConnectionStatus::Disconnected => f.write_str("Disconnected"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FenPayload {
    fen: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct TextPayload {
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResultPayload {
    result: String,
}

/// Events pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    GameInit { fen: String },
    MoveMade { fen: String },
    BotMove { fen: String },
    BotRoast { text: String },
    GameOver { result: String },
}

impl ServerEvent {
    pub const GAME_INIT: &'static str = "game:init";
    pub const MOVE_MADE: &'static str = "move:made";
    pub const BOT_MOVE: &'static str = "bot:move";
    pub const BOT_ROAST: &'static str = "bot:roast";
    pub const GAME_OVER: &'static str = "game:over";

    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::GameInit { .. } => Self::GAME_INIT,
            ServerEvent::MoveMade { .. } => Self::MOVE_MADE,
            ServerEvent::BotMove { .. } => Self::BOT_MOVE,
            ServerEvent::BotRoast { .. } => Self::BOT_ROAST,
            ServerEvent::GameOver { .. } => Self::GAME_OVER,
        }
    }

    /// Maps a decoded event frame onto a typed event.
    pub fn from_frame(name: &str, args: &[Value]) -> Result<Self, ProtocolError> {
        match name {
            Self::GAME_INIT => {
                payload::<FenPayload>(name, args).map(|p| ServerEvent::GameInit { fen: p.fen })
            }
            Self::MOVE_MADE => {
                payload::<FenPayload>(name, args).map(|p| ServerEvent::MoveMade { fen: p.fen })
            }
            Self::BOT_MOVE => {
                payload::<FenPayload>(name, args).map(|p| ServerEvent::BotMove { fen: p.fen })
            }
            Self::BOT_ROAST => {
                payload::<TextPayload>(name, args).map(|p| ServerEvent::BotRoast { text: p.text })
            }
            Self::GAME_OVER => payload::<ResultPayload>(name, args)
                .map(|p| ServerEvent::GameOver { result: p.result }),
            other => Err(ProtocolError::UnknownEvent(other.to_string())),
        }
    }

    pub fn to_frame(&self) -> Frame {
        let data = match self {
            ServerEvent::GameInit { fen }
            | ServerEvent::MoveMade { fen }
            | ServerEvent::BotMove { fen } => serde_json::json!({ "fen": fen }),
            ServerEvent::BotRoast { text } => serde_json::json!({ "text": text }),
            ServerEvent::GameOver { result } => serde_json::json!({ "result": result }),
        };
        Frame::Event {
            name: self.name().to_string(),
            args: vec![data],
        }
    }
}

/// Events the client emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    PlayerMove(MoveIntent),
    Reset,
    ChatMessage { text: String },
}

impl ClientEvent {
    pub const PLAYER_MOVE: &'static str = "player:move";
    pub const RESET: &'static str = "reset";
    pub const CHAT_MESSAGE: &'static str = "chat:message";

    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::PlayerMove(_) => Self::PLAYER_MOVE,
            ClientEvent::Reset => Self::RESET,
            ClientEvent::ChatMessage { .. } => Self::CHAT_MESSAGE,
        }
    }

    pub fn to_frame(&self) -> Frame {
        let args = match self {
            ClientEvent::PlayerMove(intent) => {
                let mut payload = serde_json::json!({
                    "from": intent.from().to_string(),
                    "to": intent.to().to_string(),
                });
                if let Some(piece) = intent.promotion() {
                    payload["promotion"] = Value::String(piece.as_char().to_string());
                }
                vec![payload]
            }
            ClientEvent::Reset => Vec::new(),
            ClientEvent::ChatMessage { text } => vec![serde_json::json!({ "text": text })],
        };
        Frame::Event {
            name: self.name().to_string(),
            args,
        }
    }

    pub fn from_frame(name: &str, args: &[Value]) -> Result<Self, ProtocolError> {
        match name {
            Self::PLAYER_MOVE => payload::<MoveIntent>(name, args).map(ClientEvent::PlayerMove),
            Self::RESET => Ok(ClientEvent::Reset),
            Self::CHAT_MESSAGE => payload::<TextPayload>(name, args)
                .map(|p| ClientEvent::ChatMessage { text: p.text }),
            other => Err(ProtocolError::UnknownEvent(other.to_string())),
        }
    }
}

impl From<MoveIntent> for ClientEvent {
    fn from(intent: MoveIntent) -> Self {
        ClientEvent::PlayerMove(intent)
    }
}

fn payload<T: serde::de::DeserializeOwned>(
    event: &str,
    args: &[Value],
) -> Result<T, ProtocolError> {
    let data = args.first().cloned().unwrap_or(Value::Null);
    serde_json::from_value(data).map_err(|e| ProtocolError::Payload {
        event: event.to_string(),
        reason: e.to_string(),
    })
}
