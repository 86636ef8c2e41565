use axum::{
  extract::{State, WebSocketUpgrade},
  http::{Method, StatusCode},
  response::IntoResponse,
  routing::{get, post},
  Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

mod app;
mod bot;
mod game;
mod leaderboard;
mod protocol;
mod room;
mod runtime;
mod shared;
mod solo;
mod transport;

use app::config::{AppConfig, AppMode};
use game::types::GameMode;
use leaderboard::{Leaderboard, SoloSubmission};
use room::RoomRegistry;
use transport::ws_session::handle_socket;

const LEADERBOARD_LIMIT: i64 = 20;

#[derive(Clone)]
struct AppState {
  registry: Arc<RoomRegistry>,
  leaderboard: Leaderboard,
}

#[derive(Debug, Deserialize)]
struct SoloScorePayload {
  name: Option<String>,
  score: Option<f64>,
  #[serde(rename = "survivalTime")]
  survival_time: Option<f64>,
  mode: Option<String>,
}

#[derive(Debug, Serialize)]
struct OkResponse {
  ok: bool,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
  ok: bool,
  error: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let config = AppConfig::from_env()?;
  let leaderboard = Leaderboard::connect(&config.database_url).await?;

  if config.mode == AppMode::Solo {
    let outcome = solo::run(config.solo.clone(), Some(&leaderboard)).await?;
    tracing::info!(
      score = outcome.score,
      survival_secs = outcome.survival_secs,
      winner = ?outcome.result.as_ref().and_then(|result| result.winner.as_ref()).map(|winner| winner.name.as_str()),
      "solo run complete"
    );
    return Ok(());
  }

  let state = Arc::new(AppState {
    registry: Arc::new(RoomRegistry::new(
      config.room_settings(),
      Some(leaderboard.clone()),
    )),
    leaderboard,
  });

  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([Method::GET, Method::POST])
    .allow_headers(Any);

  let app: Router = Router::new()
    .route("/api/health", get(health))
    .route("/api/leaderboard", get(leaderboard_get))
    .route("/api/leaderboard/solo", get(solo_leaderboard_get))
    .route("/api/solo-score", post(solo_score_post))
    .route("/api/ws", get(ws_handler))
    .layer(cors)
    .with_state(state);

  let address = format!("0.0.0.0:{}", config.port);
  tracing::info!("listening on {address}");

  let listener = tokio::net::TcpListener::bind(&address).await?;
  axum::serve(listener, app).await?;

  Ok(())
}

async fn health() -> impl IntoResponse {
  Json(OkResponse { ok: true })
}

fn error_response(status: StatusCode, error: &str) -> axum::response::Response {
  (
    status,
    Json(ErrorResponse {
      ok: false,
      error: error.to_string(),
    }),
  )
    .into_response()
}

async fn leaderboard_get(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  match state.leaderboard.top_players(LEADERBOARD_LIMIT).await {
    Ok(players) => (StatusCode::OK, Json(players)).into_response(),
    Err(error) => {
      tracing::warn!(?error, "failed to load leaderboard");
      error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load leaderboard")
    }
  }
}

async fn solo_leaderboard_get(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  match state.leaderboard.top_solo_scores(LEADERBOARD_LIMIT).await {
    Ok(scores) => (StatusCode::OK, Json(scores)).into_response(),
    Err(error) => {
      tracing::warn!(?error, "failed to load solo leaderboard");
      error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load leaderboard")
    }
  }
}

async fn solo_score_post(
  State(state): State<Arc<AppState>>,
  payload: Result<Json<SoloScorePayload>, axum::extract::rejection::JsonRejection>,
) -> impl IntoResponse {
  let Ok(Json(payload)) = payload else {
    return error_response(StatusCode::BAD_REQUEST, "Invalid data");
  };
  let Some(submission) = solo_submission(payload) else {
    return error_response(StatusCode::BAD_REQUEST, "Invalid data");
  };

  if let Err(error) = state.leaderboard.record_solo_score(&submission).await {
    tracing::warn!(?error, "failed to record solo score");
    return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Submission failed");
  }
  (StatusCode::OK, Json(OkResponse { ok: true })).into_response()
}

/// A submission needs a non-empty name and a finite score.
fn solo_submission(payload: SoloScorePayload) -> Option<SoloSubmission> {
  let name = payload.name.filter(|name| !name.is_empty())?;
  let score = payload.score.filter(|score| score.is_finite())?;
  let survival_time = payload
    .survival_time
    .filter(|seconds| seconds.is_finite())
    .unwrap_or_default();
  let mode = match payload.mode.as_deref() {
    Some("classic") => GameMode::Classic,
    _ => GameMode::Arena,
  };
  Some(SoloSubmission {
    name,
    score: score.floor() as i64,
    survival_time: survival_time.floor() as i64,
    mode,
  })
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let registry = Arc::clone(&state.registry);
  ws.on_upgrade(move |socket| handle_socket(socket, registry))
}
