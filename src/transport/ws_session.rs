use crate::game::input::{parse_direction, Intent};
use crate::protocol::{decode_client_text, decode_intent, ClientMessage, ServerMessage};
use crate::room::{Joined, LobbyError, RoomRegistry, SessionHandle};
use crate::shared::names::{sanitize_player_name, DEFAULT_PLAYER_NAME};
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

pub async fn handle_socket(socket: WebSocket, registry: Arc<RoomRegistry>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let mut connection = Connection::new(registry, SessionHandle::new(tx));
    tracing::debug!(session_id = %connection.session.id(), "socket connected");

    let send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sender.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = receiver.next().await {
        let Ok(message) = result else { break };
        match message {
            Message::Text(text) => connection.handle_text(&text).await,
            Message::Binary(data) => connection.handle_binary(&data).await,
            Message::Close(_) => break,
            _ => {}
        }
    }

    connection.close().await;
    send_task.abort();
}

/// Per-socket state: the chosen display name and, once seated, the room.
pub struct Connection {
    registry: Arc<RoomRegistry>,
    session: SessionHandle,
    name: String,
    joined: Option<Joined>,
}

impl Connection {
    pub fn new(registry: Arc<RoomRegistry>, session: SessionHandle) -> Self {
        Self {
            registry,
            session,
            name: DEFAULT_PLAYER_NAME.to_string(),
            joined: None,
        }
    }

    pub async fn handle_text(&mut self, text: &str) {
        let Some(message) = decode_client_text(text) else {
            tracing::debug!(session_id = %self.session.id(), "ignoring malformed message");
            return;
        };
        match message {
            ClientMessage::SetName { name } => self.rename(&name),
            ClientMessage::CreateRoom { name } => {
                if self.refuse_if_seated() {
                    return;
                }
                if let Some(name) = name {
                    self.rename(&name);
                }
                let result = self
                    .registry
                    .create_room(&self.name, self.session.clone())
                    .await;
                self.seat(result);
            }
            ClientMessage::JoinRoom { code, name } => {
                if self.refuse_if_seated() {
                    return;
                }
                if let Some(name) = name {
                    self.rename(&name);
                }
                let result = self
                    .registry
                    .join_room(&code, &self.name, self.session.clone())
                    .await;
                self.seat(result);
            }
            ClientMessage::Reconnect { token } => {
                if self.refuse_if_seated() {
                    return;
                }
                let result = self.registry.reconnect(&token, self.session.clone()).await;
                if let Ok(joined) = &result {
                    self.name = joined.name.clone();
                }
                self.seat(result);
            }
            ClientMessage::ToggleReady => {
                if let Some(joined) = &self.joined {
                    joined.room.toggle_ready(&joined.player_id).await;
                }
            }
            ClientMessage::StartGame => {
                if let Some(joined) = &self.joined {
                    joined.room.start_game(&joined.player_id).await;
                }
            }
            ClientMessage::Direction { direction } => {
                if let Some(direction) = parse_direction(&direction) {
                    self.relay(Intent::Direction(direction)).await;
                }
            }
            ClientMessage::Dash => self.relay(Intent::Dash).await,
            ClientMessage::Trap => self.relay(Intent::Trap).await,
            ClientMessage::LeaveRoom => {
                if let Some(joined) = self.joined.take() {
                    self.registry.leave(&joined).await;
                }
            }
            ClientMessage::PlayAgain => {
                if let Some(joined) = &self.joined {
                    joined.room.play_again(&joined.player_id).await;
                }
            }
        }
    }

    pub async fn handle_binary(&mut self, data: &[u8]) {
        match decode_intent(data) {
            Some(intent) => self.relay(intent).await,
            None => tracing::debug!(session_id = %self.session.id(), len = data.len(), "ignoring malformed frame"),
        }
    }

    /// Socket closed. A seated player keeps their seat for the grace period.
    pub async fn close(mut self) {
        if let Some(joined) = self.joined.take() {
            let session_id = self.session.id().to_string();
            self.registry.disconnect(joined, session_id).await;
        }
    }

    fn rename(&mut self, name: &str) {
        self.name = sanitize_player_name(name, DEFAULT_PLAYER_NAME);
    }

    fn refuse_if_seated(&self) -> bool {
        if self.joined.is_some() {
            self.session
                .send(&ServerMessage::error(LobbyError::AlreadyInRoom.to_string()));
            return true;
        }
        false
    }

    fn seat(&mut self, result: Result<Joined, LobbyError>) {
        match result {
            Ok(joined) => self.joined = Some(joined),
            Err(error) => {
                self.session.send(&ServerMessage::error(error.to_string()));
            }
        }
    }

    async fn relay(&self, intent: Intent) {
        if let Some(joined) = &self.joined {
            joined.room.apply_intent(&joined.player_id, intent).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{TYPE_DIRECTION, VERSION};
    use crate::room::{RoomPhase, RoomSettings};
    use serde_json::Value;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn registry() -> Arc<RoomRegistry> {
        Arc::new(RoomRegistry::new(
            RoomSettings {
                tick: Duration::from_millis(20),
                start_delay: Duration::from_secs(60),
                reconnect_grace: Duration::from_secs(60),
                grid_size: 40,
            },
            None,
        ))
    }

    fn connect(registry: &Arc<RoomRegistry>) -> (Connection, UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Connection::new(Arc::clone(registry), SessionHandle::new(tx)),
            rx,
        )
    }

    fn drain(rx: &mut UnboundedReceiver<String>) -> Vec<Value> {
        let mut messages = Vec::new();
        while let Ok(payload) = rx.try_recv() {
            messages.push(serde_json::from_str(&payload).expect("json"));
        }
        messages
    }

    fn last_of(messages: &[Value], kind: &str) -> Value {
        messages
            .iter()
            .rev()
            .find(|message| message["type"] == kind)
            .cloned()
            .unwrap_or_else(|| panic!("no {kind} in {messages:?}"))
    }

    #[tokio::test]
    async fn lobby_flow_over_text_messages() {
        let registry = registry();
        let (mut host, mut host_rx) = connect(&registry);
        let (mut guest, mut guest_rx) = connect(&registry);

        host.handle_text(r#"{"type":"setName","name":"<Ada>"}"#).await;
        host.handle_text(r#"{"type":"createRoom"}"#).await;
        let joined = last_of(&drain(&mut host_rx), "roomJoined");
        let code = joined["code"].as_str().expect("code").to_string();

        guest
            .handle_text(&format!(r#"{{"type":"joinRoom","code":"{}","name":"Bo"}}"#, code.to_lowercase()))
            .await;
        let lobby = last_of(&drain(&mut guest_rx), "lobbyUpdate");
        assert_eq!(lobby["players"][0]["name"], "Ada");
        assert_eq!(lobby["players"][1]["name"], "Bo");

        guest.handle_text(r#"{"type":"toggleReady"}"#).await;
        host.handle_text(r#"{"type":"startGame"}"#).await;
        let start = last_of(&drain(&mut guest_rx), "gameStart");
        assert_eq!(start["state"], "running");
        let room = registry.room(&code).expect("room");
        assert_eq!(room.phase().await, RoomPhase::Playing);
        room.shutdown();
    }

    #[tokio::test]
    async fn lobby_errors_are_reported_to_the_socket() {
        let registry = registry();
        let (mut client, mut rx) = connect(&registry);

        client.handle_text(r#"{"type":"joinRoom","code":"QQQQQQ"}"#).await;
        let error = last_of(&drain(&mut rx), "error");
        assert_eq!(error["message"], "Room not found");

        client.handle_text(r#"{"type":"reconnect","token":"nope"}"#).await;
        assert_eq!(last_of(&drain(&mut rx), "error")["message"], "Invalid token");

        client.handle_text(r#"{"type":"createRoom","name":"Ada"}"#).await;
        client.handle_text(r#"{"type":"createRoom"}"#).await;
        assert_eq!(last_of(&drain(&mut rx), "error")["message"], "Already in a room");
        assert_eq!(registry.room_count(), 1);
    }

    #[tokio::test]
    async fn malformed_input_is_ignored() {
        let registry = registry();
        let (mut client, mut rx) = connect(&registry);

        client.handle_text("not json").await;
        client.handle_text(r#"{"type":"teleport"}"#).await;
        client.handle_text(r#"{"type":"direction","direction":"sideways"}"#).await;
        client.handle_binary(&[9, 9]).await;
        client.handle_binary(&[VERSION, TYPE_DIRECTION, 0, 0, 9]).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn close_keeps_the_seat_for_reconnect() {
        let registry = registry();
        let (mut host, mut host_rx) = connect(&registry);
        host.handle_text(r#"{"type":"createRoom","name":"Ada"}"#).await;
        let joined = last_of(&drain(&mut host_rx), "roomJoined");
        let token = joined["token"].as_str().expect("token").to_string();
        host.close().await;
        assert_eq!(registry.room_count(), 1);

        let (mut returning, mut rx) = connect(&registry);
        returning
            .handle_text(&format!(r#"{{"type":"reconnect","token":"{token}"}}"#))
            .await;
        let rejoined = last_of(&drain(&mut rx), "roomJoined");
        assert_eq!(rejoined["playerId"], joined["playerId"]);
        assert_eq!(returning.name, "Ada");
    }

    #[tokio::test]
    async fn leave_room_frees_the_connection() {
        let registry = registry();
        let (mut client, mut rx) = connect(&registry);
        client.handle_text(r#"{"type":"createRoom"}"#).await;
        client.handle_text(r#"{"type":"leaveRoom"}"#).await;
        assert_eq!(registry.room_count(), 0);

        drain(&mut rx);
        client.handle_text(r#"{"type":"createRoom"}"#).await;
        assert_eq!(last_of(&drain(&mut rx), "roomJoined")["inGame"], false);
    }
}
