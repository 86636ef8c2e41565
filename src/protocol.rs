use crate::game::events::GameEvent;
use crate::game::geometry::{ArenaBounds, Cell, Direction};
use crate::game::input::Intent;
use crate::game::scoreboard::GameResult;
use crate::game::snapshot::Snapshot;
use serde::{Deserialize, Serialize};

pub const VERSION: u8 = 1;

pub const TYPE_DIRECTION: u8 = 0x01;
pub const TYPE_DASH: u8 = 0x02;
pub const TYPE_TRAP: u8 = 0x03;

/// Text frames sent by clients, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
  SetName {
    name: String,
  },
  CreateRoom {
    name: Option<String>,
  },
  JoinRoom {
    code: String,
    name: Option<String>,
  },
  Reconnect {
    token: String,
  },
  ToggleReady,
  StartGame,
  Direction {
    direction: String,
  },
  Dash,
  Trap,
  LeaveRoom,
  PlayAgain,
}

pub fn decode_client_text(text: &str) -> Option<ClientMessage> {
  serde_json::from_str(text).ok()
}

/// Binary frames only carry in-game intents: version, type, flags, payload.
pub fn decode_intent(data: &[u8]) -> Option<Intent> {
  let mut reader = Reader::new(data);
  let version = reader.read_u8()?;
  if version != VERSION {
    return None;
  }
  let message_type = reader.read_u8()?;
  let _flags = reader.read_u16()?;
  match message_type {
    TYPE_DIRECTION => {
      let index = reader.read_u8()? as usize;
      Direction::ALL.get(index).copied().map(Intent::Direction)
    }
    TYPE_DASH => Some(Intent::Dash),
    TYPE_TRAP => Some(Intent::Trap),
    _ => None,
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LobbyPlayer {
  pub id: String,
  pub name: String,
  pub ready: bool,
  #[serde(rename = "isHost")]
  pub is_host: bool,
  pub connected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LobbyView {
  pub players: Vec<LobbyPlayer>,
  #[serde(rename = "hostId")]
  pub host_id: String,
  pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
  RoomJoined {
    code: String,
    token: String,
    #[serde(rename = "playerId")]
    player_id: String,
    #[serde(rename = "inGame")]
    in_game: bool,
  },
  Error {
    message: String,
  },
  LobbyUpdate(LobbyView),
  GameStart(Box<Snapshot>),
  GameState(Box<Snapshot>),
  GameOver(GameResult),
  ReturnToLobby(LobbyView),
  FoodEaten {
    #[serde(rename = "snakeId")]
    snake_id: String,
    x: i32,
    y: i32,
    color: String,
  },
  SnakeDied {
    #[serde(rename = "snakeId")]
    snake_id: String,
    body: Vec<Cell>,
    color: String,
  },
  DashActivated {
    #[serde(rename = "snakeId")]
    snake_id: String,
    x: i32,
    y: i32,
    color: String,
  },
  TrapPlaced {
    x: i32,
    y: i32,
  },
  ArenaShrunk(ArenaBounds),
}

impl ServerMessage {
  pub fn error(message: impl Into<String>) -> Self {
    ServerMessage::Error {
      message: message.into(),
    }
  }
}

impl From<GameEvent> for ServerMessage {
  fn from(event: GameEvent) -> Self {
    match event {
      GameEvent::FoodEaten {
        snake_id,
        cell,
        color,
      } => ServerMessage::FoodEaten {
        snake_id,
        x: cell.x,
        y: cell.y,
        color,
      },
      GameEvent::SnakeDied {
        snake_id,
        body,
        color,
      } => ServerMessage::SnakeDied {
        snake_id,
        body,
        color,
      },
      GameEvent::DashActivated {
        snake_id,
        cell,
        color,
      } => ServerMessage::DashActivated {
        snake_id,
        x: cell.x,
        y: cell.y,
        color,
      },
      GameEvent::TrapPlaced { cell } => ServerMessage::TrapPlaced {
        x: cell.x,
        y: cell.y,
      },
      GameEvent::ArenaShrunk { bounds } => ServerMessage::ArenaShrunk(bounds),
      GameEvent::GameEnded(result) => ServerMessage::GameOver(result),
      GameEvent::StateUpdated(snapshot) => ServerMessage::GameState(snapshot),
    }
  }
}

struct Reader<'a> {
  data: &'a [u8],
  offset: usize,
}

impl<'a> Reader<'a> {
  fn new(data: &'a [u8]) -> Self {
    Self { data, offset: 0 }
  }

  fn read_u8(&mut self) -> Option<u8> {
    let value = *self.data.get(self.offset)?;
    self.offset += 1;
    Some(value)
  }

  fn read_u16(&mut self) -> Option<u16> {
    let bytes = self.read_bytes::<2>()?;
    Some(u16::from_le_bytes(bytes))
  }

  fn read_bytes<const N: usize>(&mut self) -> Option<[u8; N]> {
    if self.offset + N > self.data.len() {
      return None;
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&self.data[self.offset..self.offset + N]);
    self.offset += N;
    Some(out)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::game::scoreboard::{ScoreboardEntry, Winner};

  fn frame(message_type: u8, payload: &[u8]) -> Vec<u8> {
    let mut data = vec![VERSION, message_type];
    data.extend_from_slice(&0u16.to_le_bytes());
    data.extend_from_slice(payload);
    data
  }

  #[test]
  fn decode_tagged_client_messages() {
    assert_eq!(
      decode_client_text(r#"{"type":"joinRoom","code":"ABC234"}"#),
      Some(ClientMessage::JoinRoom {
        code: "ABC234".to_string(),
        name: None,
      })
    );
    assert_eq!(
      decode_client_text(r#"{"type":"direction","direction":"LEFT"}"#),
      Some(ClientMessage::Direction {
        direction: "LEFT".to_string(),
      })
    );
    assert_eq!(
      decode_client_text(r#"{"type":"toggleReady"}"#),
      Some(ClientMessage::ToggleReady)
    );
    assert_eq!(decode_client_text(r#"{"type":"teleport"}"#), None);
    assert_eq!(decode_client_text("not json"), None);
  }

  #[test]
  fn decode_binary_intents() {
    assert_eq!(
      decode_intent(&frame(TYPE_DIRECTION, &[3])),
      Some(Intent::Direction(Direction::ALL[3]))
    );
    assert_eq!(decode_intent(&frame(TYPE_DASH, &[])), Some(Intent::Dash));
    assert_eq!(decode_intent(&frame(TYPE_TRAP, &[])), Some(Intent::Trap));
  }

  #[test]
  fn reject_malformed_binary_frames() {
    assert_eq!(decode_intent(&[]), None);
    assert_eq!(decode_intent(&frame(TYPE_DIRECTION, &[])), None);
    assert_eq!(decode_intent(&frame(TYPE_DIRECTION, &[9])), None);
    assert_eq!(decode_intent(&frame(0x7f, &[])), None);

    let mut wrong_version = frame(TYPE_DASH, &[]);
    wrong_version[0] = VERSION + 1;
    assert_eq!(decode_intent(&wrong_version), None);
  }

  #[test]
  fn server_messages_carry_type_tags() {
    let message = ServerMessage::from(GameEvent::FoodEaten {
      snake_id: "a".to_string(),
      cell: Cell::new(3, 4),
      color: "#00ff87".to_string(),
    });
    let value = serde_json::to_value(&message).expect("json");
    assert_eq!(value["type"], "foodEaten");
    assert_eq!(value["snakeId"], "a");
    assert_eq!(value["x"], 3);
    assert_eq!(value["y"], 4);

    let shrunk = ServerMessage::from(GameEvent::ArenaShrunk {
      bounds: ArenaBounds::for_grid(40),
    });
    let value = serde_json::to_value(&shrunk).expect("json");
    assert_eq!(value["type"], "arenaShrunk");
    assert_eq!(value["maxX"], 39);
  }

  #[test]
  fn game_over_serializes_winner_and_scoreboard() {
    let result = GameResult {
      winner: Some(Winner {
        id: "b".to_string(),
        name: "Bea".to_string(),
        score: 25,
        color: "#ff6b6b".to_string(),
      }),
      scoreboard: vec![ScoreboardEntry {
        id: "b".to_string(),
        name: "Bea".to_string(),
        score: 25,
        alive: true,
        kills: 1,
        color: "#ff6b6b".to_string(),
      }],
    };
    let value = serde_json::to_value(ServerMessage::GameOver(result)).expect("json");
    assert_eq!(value["type"], "gameOver");
    assert_eq!(value["winner"]["name"], "Bea");
    assert_eq!(value["scoreboard"][0]["kills"], 1);

    let none = serde_json::to_value(ServerMessage::error("Room is full")).expect("json");
    assert_eq!(none["type"], "error");
    assert_eq!(none["message"], "Room is full");
  }
}
