use super::geometry::{ArenaBounds, Cell, Direction};
use super::timers::Timer;
use super::types::{Food, RunState, Snake, Trap, Wormhole};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnakeSnapshot {
  pub id: String,
  pub name: String,
  pub body: Vec<Cell>,
  pub direction: Direction,
  pub color: String,
  pub score: u32,
  pub alive: bool,
  pub dash_active: bool,
  pub dash_cooldown: u32,
  pub trap_cooldown: u32,
  pub kills: u32,
}

impl From<&Snake> for SnakeSnapshot {
  fn from(snake: &Snake) -> Self {
    Self {
      id: snake.id.clone(),
      name: snake.name.clone(),
      body: snake.body.iter().copied().collect(),
      direction: snake.direction,
      color: snake.color.clone(),
      score: snake.score,
      alive: snake.alive,
      dash_active: snake.timers.is_active(Timer::DashActive),
      dash_cooldown: snake.timers.get(Timer::DashCooldown),
      trap_cooldown: snake.timers.get(Timer::TrapCooldown),
      kills: snake.kills,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrapSnapshot {
  pub x: i32,
  pub y: i32,
  pub owner_id: String,
}

impl From<&Trap> for TrapSnapshot {
  fn from(trap: &Trap) -> Self {
    Self {
      x: trap.cell.x,
      y: trap.cell.y,
      owner_id: trap.owner_id.clone(),
    }
  }
}

/// Read-only view of an engine, suitable for broadcasting and for bots.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
  pub snakes: BTreeMap<String, SnakeSnapshot>,
  pub foods: Vec<Food>,
  pub traps: Vec<TrapSnapshot>,
  pub wormholes: Vec<Wormhole>,
  pub arena_bounds: ArenaBounds,
  pub grid_size: i32,
  pub tick_count: u64,
  pub state: RunState,
}

impl Snapshot {
  pub fn living(&self) -> impl Iterator<Item = &SnakeSnapshot> {
    self.snakes.values().filter(|snake| snake.alive)
  }
}
