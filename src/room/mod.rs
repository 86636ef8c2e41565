pub mod registry;
pub mod session;


pub use registry::{Joined, LobbyError, RoomRegistry};
pub use session::SessionHandle;

use crate::game::constants::{DEFAULT_GRID_SIZE, MAX_ROSTER, TICK_MS};
use crate::game::engine::{Engine, EngineConfig};
use crate::game::events::GameEvent;
use crate::game::input::Intent;
use crate::game::types::{GameMode, RosterEntry};
use crate::leaderboard::Leaderboard;
use crate::protocol::{LobbyPlayer, LobbyView, ServerMessage};
use crate::runtime::TickDriver;
use serde::Serialize;
use session::Member;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy)]
pub struct RoomSettings {
  pub tick: Duration,
  pub start_delay: Duration,
  pub reconnect_grace: Duration,
  pub grid_size: i32,
}

impl Default for RoomSettings {
  fn default() -> Self {
    Self {
      tick: Duration::from_millis(TICK_MS),
      start_delay: Duration::from_millis(3500),
      reconnect_grace: Duration::from_secs(10),
      grid_size: DEFAULT_GRID_SIZE,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomPhase {
  Waiting,
  Playing,
  Finished,
}

/// One lobby and, while playing, the engine it owns.
#[derive(Debug)]
pub struct Room {
  code: String,
  settings: RoomSettings,
  leaderboard: Option<Leaderboard>,
  state: Mutex<RoomState>,
  driver: TickDriver,
}

#[derive(Debug)]
struct RoomState {
  host_id: String,
  members: Vec<Member>,
  phase: RoomPhase,
  engine: Option<Engine>,
}

impl RoomState {
  fn member(&self, player_id: &str) -> Option<&Member> {
    self.members.iter().find(|member| member.id == player_id)
  }

  fn member_mut(&mut self, player_id: &str) -> Option<&mut Member> {
    self.members.iter_mut().find(|member| member.id == player_id)
  }

  fn lobby_view(&self, code: &str) -> LobbyView {
    LobbyView {
      players: self
        .members
        .iter()
        .map(|member| LobbyPlayer {
          id: member.id.clone(),
          name: member.name.clone(),
          ready: member.ready,
          is_host: member.id == self.host_id,
          connected: member.is_connected(),
        })
        .collect(),
      host_id: self.host_id.clone(),
      code: code.to_string(),
    }
  }

  fn broadcast(&self, message: &ServerMessage) {
    for member in &self.members {
      member.send(message);
    }
  }

  /// Lobby updates only go out while nobody is looking at a board.
  fn broadcast_lobby(&self, code: &str) {
    if self.phase == RoomPhase::Waiting {
      self.broadcast(&ServerMessage::LobbyUpdate(self.lobby_view(code)));
    }
  }

  fn can_start(&self) -> bool {
    self.phase == RoomPhase::Waiting
      && self.members.len() >= 2
      && self
        .members
        .iter()
        .all(|member| member.ready || member.id == self.host_id)
  }
}

impl Room {
  pub(crate) fn new(code: String, settings: RoomSettings, leaderboard: Option<Leaderboard>) -> Self {
    Self {
      code,
      settings,
      leaderboard,
      state: Mutex::new(RoomState {
        host_id: String::new(),
        members: Vec::new(),
        phase: RoomPhase::Waiting,
        engine: None,
      }),
      driver: TickDriver::new(),
    }
  }

  pub fn code(&self) -> &str {
    &self.code
  }

  pub async fn phase(&self) -> RoomPhase {
    self.state.lock().await.phase
  }

  pub async fn lobby(&self) -> LobbyView {
    self.state.lock().await.lobby_view(&self.code)
  }

  /// Seats a member. The first member becomes host. The newcomer hears
  /// `roomJoined` before the lobby update that lists them.
  pub(crate) async fn add_member(&self, member: Member) -> Result<(), LobbyError> {
    let mut state = self.state.lock().await;
    if state.phase != RoomPhase::Waiting {
      return Err(LobbyError::InProgress);
    }
    if state.members.len() >= MAX_ROSTER {
      return Err(LobbyError::Full);
    }
    if state.member(&member.id).is_some() {
      return Err(LobbyError::AlreadyInRoom);
    }
    if state.members.is_empty() {
      state.host_id = member.id.clone();
    }
    member.send(&ServerMessage::RoomJoined {
      code: self.code.clone(),
      token: member.token.clone(),
      player_id: member.id.clone(),
      in_game: false,
    });
    tracing::info!(room = %self.code, player_id = %member.id, name = %member.name, "player joined");
    state.members.push(member);
    state.broadcast_lobby(&self.code);
    Ok(())
  }

  pub async fn toggle_ready(&self, player_id: &str) {
    let mut state = self.state.lock().await;
    if state.phase != RoomPhase::Waiting {
      return;
    }
    let Some(member) = state.member_mut(player_id) else { return };
    member.ready = !member.ready;
    state.broadcast_lobby(&self.code);
  }

  /// Host only. Returns whether a game was started.
  pub async fn start_game(self: &Arc<Self>, player_id: &str) -> bool {
    let mut state = self.state.lock().await;
    if state.host_id != player_id || !state.can_start() {
      return false;
    }
    let roster: Vec<RosterEntry> = state
      .members
      .iter()
      .map(|member| RosterEntry::new(&member.id, &member.name))
      .collect();
    let config = EngineConfig {
      grid_size: self.settings.grid_size,
      mode: GameMode::Arena,
      seed: None,
    };
    let engine = match Engine::new(&roster, config) {
      Ok(engine) => engine,
      Err(error) => {
        tracing::warn!(room = %self.code, %error, "failed to build engine");
        return false;
      }
    };

    state.broadcast(&ServerMessage::GameStart(Box::new(engine.snapshot())));
    state.engine = Some(engine);
    state.phase = RoomPhase::Playing;

    let room = Arc::clone(self);
    let generation = self.driver.start(
      self.settings.tick,
      self.settings.start_delay,
      move |generation| {
        let room = Arc::clone(&room);
        async move { room.run_tick(generation).await }
      },
    );
    tracing::info!(room = %self.code, players = roster.len(), generation, "game started");
    true
  }

  async fn run_tick(&self, generation: u64) -> ControlFlow<()> {
    let mut state = self.state.lock().await;
    if !self.driver.is_current(generation) || state.phase != RoomPhase::Playing {
      return ControlFlow::Break(());
    }
    let events = match state.engine.as_mut() {
      Some(engine) => engine.tick(),
      None => return ControlFlow::Break(()),
    };

    let mut result = None;
    for event in events {
      match &event {
        GameEvent::SnakeDied { snake_id, .. } => {
          tracing::debug!(room = %self.code, player_id = %snake_id, "snake died");
        }
        GameEvent::ArenaShrunk { bounds } => {
          tracing::debug!(room = %self.code, ?bounds, "arena shrunk");
        }
        GameEvent::GameEnded(ended) => result = Some(ended.clone()),
        _ => {}
      }
      state.broadcast(&ServerMessage::from(event));
    }

    let Some(result) = result else {
      return ControlFlow::Continue(());
    };
    state.phase = RoomPhase::Finished;
    drop(state);

    tracing::info!(
      room = %self.code,
      winner = ?result.winner.as_ref().map(|winner| winner.name.as_str()),
      "game finished"
    );
    if let Some(leaderboard) = &self.leaderboard {
      if let Err(error) = leaderboard.record_match(&result).await {
        tracing::warn!(room = %self.code, ?error, "failed to record match");
      }
    }
    ControlFlow::Break(())
  }

  /// Relays a client intent. Ignored unless a game is running.
  pub async fn apply_intent(&self, player_id: &str, intent: Intent) {
    let mut state = self.state.lock().await;
    if state.phase != RoomPhase::Playing {
      return;
    }
    if let Some(engine) = state.engine.as_mut() {
      intent.apply(engine, player_id);
    }
  }

  /// Any member may send everyone back to the lobby, even mid-game.
  pub async fn play_again(&self, player_id: &str) {
    let mut state = self.state.lock().await;
    if state.phase == RoomPhase::Waiting || state.member(player_id).is_none() {
      return;
    }
    self.driver.stop();
    state.engine = None;
    state.phase = RoomPhase::Waiting;
    for member in &mut state.members {
      member.ready = false;
    }
    let view = state.lobby_view(&self.code);
    state.broadcast(&ServerMessage::ReturnToLobby(view));
    tracing::info!(room = %self.code, "returned to lobby");
  }

  /// Removes a member, forfeiting their snake. Returns `Some(true)` when the
  /// room is left empty and `None` for unknown members.
  pub(crate) async fn remove_member(&self, player_id: &str) -> Option<bool> {
    let mut state = self.state.lock().await;
    self.remove_locked(&mut state, player_id)
  }

  /// Grace-period expiry: removes the member only if they are still detached
  /// from the session that dropped.
  pub(crate) async fn expire_member(&self, player_id: &str, session_id: &str) -> Option<bool> {
    let mut state = self.state.lock().await;
    let member = state.member(player_id)?;
    if member.is_connected() || member.last_session_id != session_id {
      return None;
    }
    self.remove_locked(&mut state, player_id)
  }

  fn remove_locked(&self, state: &mut RoomState, player_id: &str) -> Option<bool> {
    let index = state
      .members
      .iter()
      .position(|member| member.id == player_id)?;
    if let Some(engine) = state.engine.as_mut() {
      engine.forfeit(player_id);
    }
    let member = state.members.remove(index);
    tracing::info!(room = %self.code, player_id = %member.id, "player left");

    if state.members.is_empty() {
      self.driver.stop();
      state.engine = None;
      return Some(true);
    }
    if state.host_id == player_id {
      state.host_id = state.members[0].id.clone();
    }
    state.broadcast_lobby(&self.code);
    Some(false)
  }

  /// Points an existing member at a new connection. Returns the member's
  /// name, or `None` if they are no longer seated.
  pub(crate) async fn rebind(&self, player_id: &str, session: SessionHandle) -> Option<String> {
    let mut state = self.state.lock().await;
    let snapshot = match (state.phase, state.engine.as_ref()) {
      (RoomPhase::Playing, Some(engine)) => Some(engine.snapshot()),
      _ => None,
    };
    let code = self.code.clone();
    let member = state.member_mut(player_id)?;
    member.last_session_id = session.id().to_string();
    member.session = Some(session);
    member.send(&ServerMessage::RoomJoined {
      code,
      token: member.token.clone(),
      player_id: member.id.clone(),
      in_game: snapshot.is_some(),
    });
    let name = member.name.clone();
    match snapshot {
      Some(snapshot) => member.send(&ServerMessage::GameStart(Box::new(snapshot))),
      None => state.broadcast_lobby(&self.code),
    }
    tracing::info!(room = %self.code, %player_id, "player reconnected");
    Some(name)
  }

  /// Marks a member disconnected if `session_id` is still their live session.
  pub(crate) async fn detach(&self, player_id: &str, session_id: &str) -> bool {
    let mut state = self.state.lock().await;
    let Some(member) = state.member_mut(player_id) else { return false };
    if member.last_session_id != session_id || !member.is_connected() {
      return false;
    }
    member.session = None;
    state.broadcast_lobby(&self.code);
    true
  }

  pub(crate) fn shutdown(&self) {
    self.driver.stop();
  }
}
