use crate::protocol::ServerMessage;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// Outbound half of one websocket connection. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: String,
    sender: UnboundedSender<String>,
}

impl SessionHandle {
    pub fn new(sender: UnboundedSender<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns false once the connection's writer is gone.
    pub fn send(&self, message: &ServerMessage) -> bool {
        match serde_json::to_string(message) {
            Ok(payload) => self.sender.send(payload).is_ok(),
            Err(error) => {
                tracing::warn!(?error, "failed to encode server message");
                false
            }
        }
    }
}

/// A player seated in a room. `id` doubles as the engine entity id and never
/// changes; `session` is swapped on reconnect.
#[derive(Debug)]
pub(crate) struct Member {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) ready: bool,
    pub(crate) token: String,
    pub(crate) session: Option<SessionHandle>,
    pub(crate) last_session_id: String,
}

impl Member {
    pub(crate) fn new(name: &str, session: SessionHandle) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            ready: false,
            token: Uuid::new_v4().to_string(),
            last_session_id: session.id().to_string(),
            session: Some(session),
        }
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    pub(crate) fn send(&self, message: &ServerMessage) {
        if let Some(session) = &self.session {
            session.send(message);
        }
    }
}
