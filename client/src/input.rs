//! Terminal command parsing
//!
//! Stands in for the drag-and-drop board: a line of text becomes one
//! player command.

use shared::{PromotionPiece, Square, MAX_CHAT_LEN};
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  e2e4 | e2 e4 | e2-e4   move a piece
  q | r | b | n          choose the promotion piece
  cancel                 cancel a pending promotion
  new                    ask the server for a new game
  say <text>             send a chat message
  help                   show this help
  quit                   exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Move { from: Square, to: Square },
    Promote(PromotionPiece),
    CancelPromotion,
    NewGame,
    Chat(String),
    Help,
    Quit,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("nothing to do")]
    Empty,
    #[error("nothing to say")]
    EmptyChat,
    #[error("unrecognised command {0:?}, type `help`")]
    Unknown(String),
}

pub fn parse_command(line: &str) -> Result<Command, ParseCommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ParseCommandError::Empty);
    }

    if let Some(text) = chat_text(line) {
        return parse_chat(text);
    }

    match line.to_ascii_lowercase().as_str() {
        "cancel" | "c" => return Ok(Command::CancelPromotion),
        "new" | "reset" => return Ok(Command::NewGame),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        _ => {}
    }

    if let Ok(piece) = line.parse::<PromotionPiece>() {
        return Ok(Command::Promote(piece));
    }

    parse_move(line).ok_or_else(|| ParseCommandError::Unknown(line.to_string()))
}

fn parse_move(line: &str) -> Option<Command> {
    let compact: String = line
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_ascii_lowercase();

    if compact.len() != 4 || !compact.is_ascii() {
        return None;
    }

    let from = compact[..2].parse().ok()?;
    let to = compact[2..].parse().ok()?;
    Some(Command::Move { from, to })
}

fn chat_text(line: &str) -> Option<&str> {
    ["say", "/chat"].iter().find_map(|prefix| {
        line.get(..prefix.len())
            .filter(|head| head.eq_ignore_ascii_case(prefix))
            .map(|_| &line[prefix.len()..])
            .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
    })
}

fn parse_chat(text: &str) -> Result<Command, ParseCommandError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseCommandError::EmptyChat);
    }
    Ok(Command::Chat(text.chars().take(MAX_CHAT_LEN).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(from: &str, to: &str) -> Command {
        Command::Move {
            from: from.parse().unwrap(),
            to: to.parse().unwrap(),
        }
    }

    #[test]
    fn test_parse_moves() {
        assert_eq!(parse_command("e2e4"), Ok(mv("e2", "e4")));
        assert_eq!(parse_command("  e2 e4 "), Ok(mv("e2", "e4")));
        assert_eq!(parse_command("g1-f3"), Ok(mv("g1", "f3")));
        assert_eq!(parse_command("E7E8"), Ok(mv("e7", "e8")));
    }

    #[test]
    fn test_parse_bad_moves() {
        assert!(matches!(
            parse_command("e2e9"),
            Err(ParseCommandError::Unknown(_))
        ));
        assert!(matches!(
            parse_command("e2e4e5"),
            Err(ParseCommandError::Unknown(_))
        ));
        assert!(matches!(
            parse_command("é2e4"),
            Err(ParseCommandError::Unknown(_))
        ));
    }

    #[test]
    fn test_parse_promotion_choices() {
        assert_eq!(parse_command("q"), Ok(Command::Promote(PromotionPiece::Queen)));
        assert_eq!(parse_command("N"), Ok(Command::Promote(PromotionPiece::Knight)));
        assert_eq!(
            parse_command("bishop"),
            Ok(Command::Promote(PromotionPiece::Bishop))
        );
    }

    #[test]
    fn test_parse_control_commands() {
        assert_eq!(parse_command("cancel"), Ok(Command::CancelPromotion));
        assert_eq!(parse_command("new"), Ok(Command::NewGame));
        assert_eq!(parse_command("reset"), Ok(Command::NewGame));
        assert_eq!(parse_command("help"), Ok(Command::Help));
        assert_eq!(parse_command("quit"), Ok(Command::Quit));
        assert_eq!(parse_command("   "), Err(ParseCommandError::Empty));
    }

    #[test]
    fn test_parse_chat() {
        assert_eq!(
            parse_command("say   you call that a gambit?  "),
            Ok(Command::Chat("you call that a gambit?".to_string()))
        );
        assert_eq!(parse_command("say    "), Err(ParseCommandError::EmptyChat));
        assert_eq!(parse_command("Say hi"), Ok(Command::Chat("hi".to_string())));
        assert_eq!(parse_command("/CHAT gg"), Ok(Command::Chat("gg".to_string())));
        assert!(matches!(
            parse_command("sayonara"),
            Err(ParseCommandError::Unknown(_))
        ));

        let long = format!("say {}", "x".repeat(MAX_CHAT_LEN + 50));
        match parse_command(&long) {
            Ok(Command::Chat(text)) => assert_eq!(text.chars().count(), MAX_CHAT_LEN),
            other => panic!("Expected chat command, got {:?}", other),
        }
    }
}
