use crate::game::input::parse_direction;
use crate::game::room::RoomSnapshot;
use crate::game::types::{Direction, PlayerId, RoomId};
use serde::{Deserialize, Serialize};

pub const NAME_FALLBACK: &str = "anon";
pub const GLYPH_FALLBACK: char = 'o';

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum JsonClientMessage {
  #[serde(rename = "join")]
  Join {
    room: Option<i64>,
    name: Option<String>,
    glyph: Option<String>,
  },
  #[serde(rename = "move")]
  Move { direction: Option<String> },
  #[serde(rename = "exit")]
  Exit,
  #[serde(rename = "quit")]
  Quit,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ClientMessage {
  Join {
    room: Option<RoomId>,
    name: Option<String>,
    glyph: Option<String>,
  },
  Move {
    direction: Direction,
  },
  Exit,
  Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandAction {
  Join,
  Exit,
  Quit,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage<'a> {
  #[serde(rename = "welcome")]
  Welcome {
    #[serde(rename = "playerId")]
    player_id: PlayerId,
  },
  #[serde(rename = "command")]
  Command { ok: bool, action: CommandAction },
  #[serde(rename = "snapshot")]
  Snapshot(&'a RoomSnapshot),
}

/// Room ids are 1..=255; 0 is reserved for "not in a room".
pub fn parse_room_id(value: i64) -> Option<RoomId> {
  RoomId::try_from(value).ok().filter(|room| *room != 0)
}

pub fn decode_client_message(text: &str) -> Option<ClientMessage> {
  let message = serde_json::from_str::<JsonClientMessage>(text).ok()?;
  let message = match message {
    JsonClientMessage::Join { room, name, glyph } => ClientMessage::Join {
      room: room.and_then(parse_room_id),
      name,
      glyph,
    },
    JsonClientMessage::Move { direction } => ClientMessage::Move {
      direction: direction.as_deref().and_then(parse_direction)?,
    },
    JsonClientMessage::Exit => ClientMessage::Exit,
    JsonClientMessage::Quit => ClientMessage::Quit,
  };
  Some(message)
}

pub fn encode_server_message(message: &ServerMessage<'_>) -> anyhow::Result<String> {
  Ok(serde_json::to_string(message)?)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::game::room::PlayerView;
  use crate::game::types::Cell;

  #[test]
  fn decode_join_with_room_name_and_glyph() {
    let message =
      decode_client_message(r##"{"type":"join","room":12,"name":"ann","glyph":"#"}"##).expect("message");
    assert_eq!(
      message,
      ClientMessage::Join {
        room: Some(12),
        name: Some("ann".to_string()),
        glyph: Some("#".to_string()),
      }
    );
  }

  #[test]
  fn join_with_out_of_range_room_has_no_room() {
    for room in ["0", "256", "-3"] {
      let text = format!(r#"{{"type":"join","room":{room}}}"#);
      match decode_client_message(&text).expect("message") {
        ClientMessage::Join { room, .. } => assert_eq!(room, None),
        _ => panic!("unexpected message"),
      }
    }
  }

  #[test]
  fn decode_move_accepts_names_and_arrows() {
    assert_eq!(
      decode_client_message(r#"{"type":"move","direction":"left"}"#),
      Some(ClientMessage::Move {
        direction: Direction::Left
      })
    );
    assert_eq!(
      decode_client_message(r#"{"type":"move","direction":"^"}"#),
      Some(ClientMessage::Move {
        direction: Direction::Up
      })
    );
    assert_eq!(decode_client_message(r#"{"type":"move","direction":"north"}"#), None);
    assert_eq!(decode_client_message(r#"{"type":"move"}"#), None);
  }

  #[test]
  fn decode_rejects_garbage() {
    assert_eq!(decode_client_message("not json"), None);
    assert_eq!(decode_client_message(r#"{"type":"dance"}"#), None);
    assert_eq!(decode_client_message(r#"{"type":"exit"}"#), Some(ClientMessage::Exit));
    assert_eq!(decode_client_message(r#"{"type":"quit"}"#), Some(ClientMessage::Quit));
  }

  #[test]
  fn encode_command_and_welcome() {
    let command = encode_server_message(&ServerMessage::Command {
      ok: true,
      action: CommandAction::Join,
    })
    .expect("json");
    assert_eq!(command, r#"{"type":"command","ok":true,"action":"join"}"#);

    let welcome = encode_server_message(&ServerMessage::Welcome { player_id: 42 }).expect("json");
    assert_eq!(welcome, r#"{"type":"welcome","playerId":42}"#);
  }

  #[test]
  fn encode_snapshot_is_tagged() {
    let snapshot = RoomSnapshot {
      room_id: 3,
      tick: 9,
      grid_size: 30,
      players: vec![PlayerView {
        player_id: 1,
        heading: Direction::Up,
        cells: vec![Cell::new(4, 5)],
        score: 1,
        name: "ann".to_string(),
        glyph: '@',
      }],
      food: vec![Cell::new(0, 1)],
    };
    let text = encode_server_message(&ServerMessage::Snapshot(&snapshot)).expect("json");
    let value: serde_json::Value = serde_json::from_str(&text).expect("value");
    assert_eq!(value["type"], "snapshot");
    assert_eq!(value["roomId"], 3);
    assert_eq!(value["tick"], 9);
    assert_eq!(value["players"][0]["heading"], "up");
    assert_eq!(value["food"][0]["y"], 1);
  }
}
