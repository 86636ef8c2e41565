use crate::bot::{BotController, Difficulty};
use crate::game::constants::{DEFAULT_GRID_SIZE, TICK_MS};
use crate::game::engine::{Engine, EngineConfig};
use crate::game::error::EngineError;
use crate::game::events::GameEvent;
use crate::game::scoreboard::GameResult;
use crate::game::types::{GameMode, RosterEntry};
use crate::leaderboard::{Leaderboard, SoloSubmission};
use crate::runtime::TickDriver;
use crate::shared::names::DEFAULT_PLAYER_NAME;
use anyhow::Context;
use serde::Serialize;
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::sync::oneshot;

pub const MAX_SOLO_BOTS: usize = 4;
pub const PLAYER_ID: &str = "player";
const BOT_NAMES: [&str; MAX_SOLO_BOTS] = ["Viper", "Cobra", "Python", "Mamba"];

#[derive(Debug, Clone)]
pub struct SoloConfig {
  pub mode: GameMode,
  /// Ignored in classic mode.
  pub bots: usize,
  pub difficulty: Difficulty,
  pub name: String,
  pub seed: Option<u64>,
  pub grid_size: i32,
  pub tick: Duration,
  /// Headless runs stop here even if the player is still alive.
  pub max_ticks: u64,
}

impl Default for SoloConfig {
  fn default() -> Self {
    Self {
      mode: GameMode::Arena,
      bots: 3,
      difficulty: Difficulty::default(),
      name: DEFAULT_PLAYER_NAME.to_string(),
      seed: None,
      grid_size: DEFAULT_GRID_SIZE,
      tick: Duration::from_millis(TICK_MS),
      max_ticks: 20_000,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoloOutcome {
  pub score: u32,
  pub survival_secs: u64,
  pub ticks: u64,
  pub mode: GameMode,
  /// False when the tick cap stopped the run.
  pub finished: bool,
  pub result: Option<GameResult>,
}

/// Offline game: the local player plus bots, all piloted by bot controllers.
#[derive(Debug)]
pub struct SoloSession {
  config: SoloConfig,
  engine: Engine,
  pilots: Vec<(String, BotController)>,
  player_death_tick: Option<u64>,
  result: Option<GameResult>,
}

impl SoloSession {
  pub fn new(config: SoloConfig) -> Result<Self, EngineError> {
    let bots = match config.mode {
      GameMode::Arena => config.bots.min(MAX_SOLO_BOTS),
      GameMode::Classic => 0,
    };
    let mut roster = vec![RosterEntry::new(PLAYER_ID, &config.name)];
    roster.extend(
      BOT_NAMES
        .iter()
        .take(bots)
        .enumerate()
        .map(|(index, name)| RosterEntry::new(format!("bot_{index}"), *name)),
    );

    let engine = Engine::new(
      &roster,
      EngineConfig {
        grid_size: config.grid_size,
        mode: config.mode,
        seed: config.seed,
      },
    )?;
    let pilots = roster
      .iter()
      .enumerate()
      .map(|(index, entry)| {
        let seed = config.seed.map(|seed| seed.wrapping_add(index as u64 + 1));
        (entry.id.clone(), BotController::new(config.difficulty, seed))
      })
      .collect();

    Ok(Self {
      config,
      engine,
      pilots,
      player_death_tick: None,
      result: None,
    })
  }

  pub fn engine(&self) -> &Engine {
    &self.engine
  }

  /// Lets every pilot steer from the current snapshot, then advances one tick.
  pub fn step(&mut self) -> Vec<GameEvent> {
    let snapshot = self.engine.snapshot();
    for (id, pilot) in &mut self.pilots {
      for intent in pilot.decide(&snapshot, id) {
        intent.apply(&mut self.engine, id);
      }
    }

    let events = self.engine.tick();
    for event in &events {
      match event {
        GameEvent::SnakeDied { snake_id, .. } if snake_id == PLAYER_ID => {
          let tick = self.engine.tick_count();
          self.player_death_tick.get_or_insert(tick);
          tracing::debug!(tick, "player died");
        }
        GameEvent::GameEnded(result) => self.result = Some(result.clone()),
        _ => {}
      }
    }
    events
  }

  pub fn is_over(&self) -> bool {
    self.engine.is_finished() || self.engine.tick_count() >= self.config.max_ticks
  }

  pub fn outcome(&self) -> SoloOutcome {
    let ticks = self
      .player_death_tick
      .unwrap_or_else(|| self.engine.tick_count());
    let tick_ms = u64::try_from(self.config.tick.as_millis()).unwrap_or(u64::MAX);
    SoloOutcome {
      score: self
        .engine
        .snake(PLAYER_ID)
        .map(|snake| snake.score)
        .unwrap_or_default(),
      survival_secs: ticks.saturating_mul(tick_ms) / 1000,
      ticks,
      mode: self.config.mode,
      finished: self.engine.is_finished(),
      result: self.result.clone(),
    }
  }
}

/// Plays one solo game on the tick driver and records the player's score.
pub async fn run(config: SoloConfig, leaderboard: Option<&Leaderboard>) -> anyhow::Result<SoloOutcome> {
  let mut session = SoloSession::new(config.clone()).context("invalid solo configuration")?;
  tracing::info!(
    mode = config.mode.as_str(),
    bots = config.bots,
    difficulty = config.difficulty.as_str(),
    seed = ?config.seed,
    "solo session started"
  );

  let (done_tx, done_rx) = oneshot::channel();
  let mut done_tx = Some(done_tx);
  let driver = TickDriver::new();
  driver.start(config.tick, Duration::ZERO, move |_| {
    session.step();
    let flow = if session.is_over() {
      if let Some(done_tx) = done_tx.take() {
        let _ = done_tx.send(session.outcome());
      }
      ControlFlow::Break(())
    } else {
      ControlFlow::Continue(())
    };
    std::future::ready(flow)
  });
  let outcome = done_rx
    .await
    .context("solo session stopped without an outcome")?;
  driver.stop();

  tracing::info!(
    score = outcome.score,
    survival_secs = outcome.survival_secs,
    ticks = outcome.ticks,
    finished = outcome.finished,
    "solo session ended"
  );
  if let Some(leaderboard) = leaderboard {
    leaderboard
      .record_solo_score(&SoloSubmission {
        name: config.name.clone(),
        score: i64::from(outcome.score),
        survival_time: i64::try_from(outcome.survival_secs).unwrap_or(i64::MAX),
        mode: config.mode,
      })
      .await
      .context("failed to record solo score")?;
  }
  Ok(outcome)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config(mode: GameMode, bots: usize) -> SoloConfig {
    SoloConfig {
      mode,
      bots,
      seed: Some(11),
      tick: Duration::from_millis(1000),
      max_ticks: 400,
      ..SoloConfig::default()
    }
  }

  fn play_out(session: &mut SoloSession) {
    while !session.is_over() {
      session.step();
    }
  }

  #[test]
  fn arena_seats_named_bots_after_the_player() {
    let session = SoloSession::new(config(GameMode::Arena, 4)).expect("session");
    let snapshot = session.engine().snapshot();
    assert_eq!(snapshot.snakes.len(), 5);
    assert_eq!(snapshot.snakes[PLAYER_ID].name, "Player");
    assert_eq!(snapshot.snakes["bot_0"].name, "Viper");
    assert_eq!(snapshot.snakes["bot_3"].name, "Mamba");
  }

  #[test]
  fn classic_has_no_bots() {
    let session = SoloSession::new(config(GameMode::Classic, 3)).expect("session");
    let snapshot = session.engine().snapshot();
    assert_eq!(snapshot.snakes.len(), 1);
    assert!(snapshot.wormholes.is_empty());
  }

  #[test]
  fn bot_count_is_capped() {
    let session = SoloSession::new(config(GameMode::Arena, 9)).expect("session");
    assert_eq!(session.engine().snapshot().snakes.len(), 1 + MAX_SOLO_BOTS);
  }

  #[test]
  fn tick_cap_ends_an_unfinished_run() {
    let mut session = SoloSession::new(SoloConfig {
      max_ticks: 5,
      ..config(GameMode::Classic, 0)
    })
    .expect("session");
    play_out(&mut session);

    let outcome = session.outcome();
    assert_eq!(session.engine().tick_count(), 5);
    assert!(!outcome.finished);
    assert_eq!(outcome.ticks, 5);
    assert_eq!(outcome.survival_secs, 5);
    assert!(outcome.result.is_none());
  }

  #[test]
  fn lone_arena_player_finishes_immediately() {
    let mut session = SoloSession::new(config(GameMode::Arena, 0)).expect("session");
    play_out(&mut session);

    let outcome = session.outcome();
    assert!(outcome.finished);
    assert_eq!(outcome.ticks, 1);
    assert!(outcome.result.is_some());
  }

  #[test]
  fn seeded_sessions_replay_identically() {
    let mut first = SoloSession::new(config(GameMode::Arena, 3)).expect("first");
    let mut second = SoloSession::new(config(GameMode::Arena, 3)).expect("second");
    play_out(&mut first);
    play_out(&mut second);

    assert_eq!(first.outcome(), second.outcome());
    assert_eq!(first.engine().snapshot(), second.engine().snapshot());
  }

  #[test]
  fn survival_stops_counting_at_death() {
    let mut session = SoloSession::new(config(GameMode::Arena, 4)).expect("session");
    play_out(&mut session);

    let outcome = session.outcome();
    assert!(outcome.ticks <= session.engine().tick_count());
    if let Some(snake) = session.engine().snake(PLAYER_ID) {
      if snake.alive {
        assert_eq!(outcome.ticks, session.engine().tick_count());
      }
    }
  }

  #[tokio::test]
  async fn run_records_the_solo_score() {
    let leaderboard = Leaderboard::connect("sqlite::memory:")
      .await
      .expect("memory db");
    let outcome = run(
      SoloConfig {
        name: "Solo Ace".to_string(),
        tick: Duration::from_millis(1),
        max_ticks: 30,
        ..config(GameMode::Classic, 0)
      },
      Some(&leaderboard),
    )
    .await
    .expect("run");

    assert!(outcome.ticks <= 30);
    let scores = leaderboard.top_solo_scores(20).await.expect("scores");
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].name, "Solo Ace");
    assert_eq!(scores[0].mode, GameMode::Classic);
    assert_eq!(scores[0].score, i64::from(outcome.score));
  }
}
