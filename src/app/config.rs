use crate::bot::Difficulty;
use crate::game::constants::{DEFAULT_GRID_SIZE, MAX_GRID_SIZE, MIN_GRID_SIZE, TICK_MS};
use crate::game::types::GameMode;
use crate::room::RoomSettings;
use crate::shared::names::{sanitize_player_name, DEFAULT_PLAYER_NAME};
use crate::solo::{SoloConfig, MAX_SOLO_BOTS};
use anyhow::{bail, Context};
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/leaderboard.db";
const DEFAULT_START_DELAY_MS: u64 = 3500;
const DEFAULT_RECONNECT_GRACE_MS: u64 = 10_000;
const DEFAULT_SOLO_MAX_TICKS: u64 = 20_000;
const DEFAULT_SOLO_BOTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  Server,
  Solo,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub mode: AppMode,
  pub port: u16,
  pub database_url: String,
  pub tick: Duration,
  pub start_delay: Duration,
  pub reconnect_grace: Duration,
  pub grid_size: i32,
  pub solo: SoloConfig,
}

impl AppConfig {
  pub fn from_env() -> anyhow::Result<Self> {
    Self::from_lookup(|key| env::var(key).ok())
  }

  fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
    let value = |key: &str| {
      lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
    };

    let mode = match value("APP_MODE").as_deref() {
      None | Some("server") => AppMode::Server,
      Some("solo") => AppMode::Solo,
      Some(other) => bail!("APP_MODE must be `server` or `solo`, got `{other}`"),
    };
    let port = parse_or(value("PORT"), "PORT", DEFAULT_PORT)?;
    let database_url = value("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

    let tick_ms = parse_or(value("TICK_MS"), "TICK_MS", TICK_MS)?;
    if tick_ms == 0 {
      bail!("TICK_MS must be at least 1");
    }
    let start_delay_ms = parse_or(
      value("GAME_START_DELAY_MS"),
      "GAME_START_DELAY_MS",
      DEFAULT_START_DELAY_MS,
    )?;
    let reconnect_grace_ms = parse_or(
      value("RECONNECT_GRACE_MS"),
      "RECONNECT_GRACE_MS",
      DEFAULT_RECONNECT_GRACE_MS,
    )?;
    let grid_size = parse_or(value("GRID_SIZE"), "GRID_SIZE", DEFAULT_GRID_SIZE)?;
    if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&grid_size) {
      bail!("GRID_SIZE must be within {MIN_GRID_SIZE}..={MAX_GRID_SIZE}, got {grid_size}");
    }

    let solo_mode = match value("SOLO_MODE").as_deref() {
      None | Some("arena") => GameMode::Arena,
      Some("classic") => GameMode::Classic,
      Some(other) => bail!("SOLO_MODE must be `arena` or `classic`, got `{other}`"),
    };
    let bots = parse_or(value("SOLO_BOTS"), "SOLO_BOTS", DEFAULT_SOLO_BOTS)?;
    if bots > MAX_SOLO_BOTS {
      bail!("SOLO_BOTS must be at most {MAX_SOLO_BOTS}, got {bots}");
    }
    let difficulty = match value("SOLO_DIFFICULTY") {
      None => Difficulty::default(),
      Some(raw) => Difficulty::parse(&raw)
        .with_context(|| format!("SOLO_DIFFICULTY must be easy, medium or hard, got `{raw}`"))?,
    };
    let name = value("SOLO_NAME")
      .map(|raw| sanitize_player_name(&raw, DEFAULT_PLAYER_NAME))
      .unwrap_or_else(|| DEFAULT_PLAYER_NAME.to_string());
    let seed = value("SOLO_SEED")
      .map(|raw| raw.parse::<u64>().context("SOLO_SEED must be an unsigned integer"))
      .transpose()?;
    let max_ticks = parse_or(value("SOLO_MAX_TICKS"), "SOLO_MAX_TICKS", DEFAULT_SOLO_MAX_TICKS)?;

    let tick = Duration::from_millis(tick_ms);
    Ok(Self {
      mode,
      port,
      database_url,
      tick,
      start_delay: Duration::from_millis(start_delay_ms),
      reconnect_grace: Duration::from_millis(reconnect_grace_ms),
      grid_size,
      solo: SoloConfig {
        mode: solo_mode,
        bots,
        difficulty,
        name,
        seed,
        grid_size,
        tick,
        max_ticks,
      },
    })
  }

  pub fn room_settings(&self) -> RoomSettings {
    RoomSettings {
      tick: self.tick,
      start_delay: self.start_delay,
      reconnect_grace: self.reconnect_grace,
      grid_size: self.grid_size,
    }
  }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
  T: FromStr,
  T::Err: std::error::Error + Send + Sync + 'static,
{
  match raw {
    None => Ok(default),
    Some(raw) => raw
      .parse::<T>()
      .with_context(|| format!("{key} has invalid value `{raw}`")),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn config(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
    let vars: HashMap<String, String> = pairs
      .iter()
      .map(|(key, value)| (key.to_string(), value.to_string()))
      .collect();
    AppConfig::from_lookup(|key| vars.get(key).cloned())
  }

  #[test]
  fn defaults_apply_when_unset() {
    let config = config(&[]).expect("defaults");
    assert_eq!(config.mode, AppMode::Server);
    assert_eq!(config.port, 3000);
    assert_eq!(config.database_url, "sqlite://data/leaderboard.db");
    assert_eq!(config.tick, Duration::from_millis(150));
    assert_eq!(config.start_delay, Duration::from_millis(3500));
    assert_eq!(config.reconnect_grace, Duration::from_secs(10));
    assert_eq!(config.grid_size, 40);
    assert_eq!(config.solo.mode, GameMode::Arena);
    assert_eq!(config.solo.bots, 3);
    assert_eq!(config.solo.difficulty, Difficulty::Medium);
    assert_eq!(config.solo.name, "Player");
    assert_eq!(config.solo.seed, None);
  }

  #[test]
  fn reads_solo_overrides() {
    let config = config(&[
      ("APP_MODE", "solo"),
      ("SOLO_MODE", "classic"),
      ("SOLO_BOTS", "0"),
      ("SOLO_DIFFICULTY", "hard"),
      ("SOLO_NAME", "  <Zed> "),
      ("SOLO_SEED", "42"),
      ("TICK_MS", "20"),
    ])
    .expect("solo config");
    assert_eq!(config.mode, AppMode::Solo);
    assert_eq!(config.solo.mode, GameMode::Classic);
    assert_eq!(config.solo.bots, 0);
    assert_eq!(config.solo.difficulty, Difficulty::Hard);
    assert_eq!(config.solo.name, "Zed");
    assert_eq!(config.solo.seed, Some(42));
    assert_eq!(config.solo.tick, Duration::from_millis(20));
  }

  #[test]
  fn rejects_invalid_values() {
    assert!(config(&[("APP_MODE", "cluster")]).is_err());
    assert!(config(&[("PORT", "http")]).is_err());
    assert!(config(&[("TICK_MS", "0")]).is_err());
    assert!(config(&[("GRID_SIZE", "8")]).is_err());
    assert!(config(&[("SOLO_BOTS", "5")]).is_err());
    assert!(config(&[("SOLO_DIFFICULTY", "nightmare")]).is_err());
    assert!(config(&[("SOLO_MODE", "battle")]).is_err());
  }
}
