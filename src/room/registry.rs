use super::session::{Member, SessionHandle};
use super::{Room, RoomSettings};
use crate::app::room_code::{generate_room_code, normalize_room_code};
use crate::leaderboard::Leaderboard;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

/// Lobby failures. The display text is what the client sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LobbyError {
  #[error("Invalid room code")]
  InvalidCode,
  #[error("Room not found")]
  NotFound,
  #[error("Game already in progress")]
  InProgress,
  #[error("Room is full")]
  Full,
  #[error("Already in a room")]
  AlreadyInRoom,
  #[error("Invalid token")]
  InvalidToken,
  #[error("Room no longer exists")]
  RoomGone,
}

#[derive(Debug, Clone)]
struct TokenEntry {
  room_code: String,
  player_id: String,
}

/// A connection's seat in a room.
#[derive(Debug, Clone)]
pub struct Joined {
  pub room: Arc<Room>,
  pub player_id: String,
  pub token: String,
  pub name: String,
}

#[derive(Debug)]
pub struct RoomRegistry {
  rooms: DashMap<String, Arc<Room>>,
  tokens: DashMap<String, TokenEntry>,
  settings: RoomSettings,
  leaderboard: Option<Leaderboard>,
}

impl RoomRegistry {
  pub fn new(settings: RoomSettings, leaderboard: Option<Leaderboard>) -> Self {
    Self {
      rooms: DashMap::new(),
      tokens: DashMap::new(),
      settings,
      leaderboard,
    }
  }

  pub fn room(&self, code: &str) -> Option<Arc<Room>> {
    self.rooms.get(code).map(|entry| Arc::clone(entry.value()))
  }

  pub fn room_count(&self) -> usize {
    self.rooms.len()
  }

  pub async fn create_room(&self, name: &str, session: SessionHandle) -> Result<Joined, LobbyError> {
    let room = loop {
      let code = generate_room_code(&mut rand::thread_rng());
      match self.rooms.entry(code) {
        Entry::Occupied(_) => continue,
        Entry::Vacant(entry) => {
          let room = Arc::new(Room::new(
            entry.key().clone(),
            self.settings,
            self.leaderboard.clone(),
          ));
          entry.insert(Arc::clone(&room));
          break room;
        }
      }
    };
    tracing::info!(room = %room.code(), rooms = self.room_count(), "room created");
    let seated = self.seat(Arc::clone(&room), name, session).await;
    if seated.is_err() {
      self.delete_room(room.code());
    }
    seated
  }

  pub async fn join_room(
    &self,
    code: &str,
    name: &str,
    session: SessionHandle,
  ) -> Result<Joined, LobbyError> {
    let code = normalize_room_code(code).ok_or(LobbyError::InvalidCode)?;
    let room = self.room(&code).ok_or(LobbyError::NotFound)?;
    self.seat(room, name, session).await
  }

  async fn seat(&self, room: Arc<Room>, name: &str, session: SessionHandle) -> Result<Joined, LobbyError> {
    let member = Member::new(name, session);
    let player_id = member.id.clone();
    let token = member.token.clone();
    room.add_member(member).await?;
    self.tokens.insert(
      token.clone(),
      TokenEntry {
        room_code: room.code().to_string(),
        player_id: player_id.clone(),
      },
    );
    Ok(Joined {
      room,
      player_id,
      token,
      name: name.to_string(),
    })
  }

  /// Rebinds a new connection to the member a token was issued for.
  pub async fn reconnect(&self, token: &str, session: SessionHandle) -> Result<Joined, LobbyError> {
    let entry = self
      .tokens
      .get(token)
      .map(|entry| entry.value().clone())
      .ok_or(LobbyError::InvalidToken)?;
    let Some(room) = self.room(&entry.room_code) else {
      self.tokens.remove(token);
      return Err(LobbyError::RoomGone);
    };
    let Some(name) = room.rebind(&entry.player_id, session).await else {
      self.tokens.remove(token);
      return Err(LobbyError::RoomGone);
    };
    Ok(Joined {
      room,
      player_id: entry.player_id,
      token: token.to_string(),
      name,
    })
  }

  /// Explicit leave: forfeits, revokes the token, deletes the room if empty.
  pub async fn leave(&self, joined: &Joined) {
    self.tokens.remove(&joined.token);
    if joined.room.remove_member(&joined.player_id).await == Some(true) {
      self.delete_room(joined.room.code());
    }
  }

  /// Connection dropped. The member keeps their seat for the grace period and
  /// is removed afterwards unless a reconnect rebound them.
  pub async fn disconnect(self: &Arc<Self>, joined: Joined, session_id: String) {
    if !joined.room.detach(&joined.player_id, &session_id).await {
      return;
    }
    tracing::info!(room = %joined.room.code(), player_id = %joined.player_id, "player disconnected");
    let registry = Arc::clone(self);
    let grace = self.settings.reconnect_grace;
    tokio::spawn(async move {
      tokio::time::sleep(grace).await;
      let Some(emptied) = joined.room.expire_member(&joined.player_id, &session_id).await else {
        return;
      };
      registry.tokens.remove(&joined.token);
      if emptied {
        registry.delete_room(joined.room.code());
      }
    });
  }

  fn delete_room(&self, code: &str) {
    if let Some((_, room)) = self.rooms.remove(code) {
      room.shutdown();
      self.tokens.retain(|_, entry| entry.room_code != code);
      tracing::info!(room = %code, rooms = self.room_count(), "room deleted");
    }
  }
}
