use super::geometry::{Cell, Direction};
use super::timers::Timers;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
  pub id: String,
  pub display_name: String,
}

impl RosterEntry {
  pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      display_name: display_name.into(),
    }
  }
}

/// Capability set of an engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
  /// Dash, traps, wormholes and the shrinking arena. Last snake standing wins.
  #[default]
  Arena,
  /// Plain snake: no abilities or hazards, runs until nobody is left.
  Classic,
}

impl GameMode {
  pub fn has_abilities(self) -> bool {
    matches!(self, GameMode::Arena)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      GameMode::Arena => "arena",
      GameMode::Classic => "classic",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
  Running,
  Finished,
}

#[derive(Debug, Clone)]
pub struct Snake {
  pub id: String,
  pub name: String,
  pub color: String,
  pub body: VecDeque<Cell>,
  pub direction: Direction,
  pub next_direction: Direction,
  pub alive: bool,
  pub score: u32,
  pub kills: u32,
  pub timers: Timers,
}

impl Snake {
  pub fn head(&self) -> Cell {
    self.body[0]
  }

  pub fn tail(&self) -> Option<Cell> {
    self.body.back().copied()
  }

  pub fn len(&self) -> usize {
    self.body.len()
  }

  pub fn occupies(&self, cell: Cell) -> bool {
    self.body.iter().any(|segment| *segment == cell)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Food {
  pub x: i32,
  pub y: i32,
  pub id: u32,
}

impl Food {
  pub fn cell(&self) -> Cell {
    Cell::new(self.x, self.y)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trap {
  pub cell: Cell,
  pub owner_id: String,
  pub created_tick: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wormhole {
  pub a: Cell,
  pub b: Cell,
  pub id: u32,
}

impl Wormhole {
  /// The opposite endpoint when `cell` is one of this pair's endpoints.
  pub fn partner_of(&self, cell: Cell) -> Option<Cell> {
    if cell == self.a {
      Some(self.b)
    } else if cell == self.b {
      Some(self.a)
    } else {
      None
    }
  }

  pub fn touches(&self, cell: Cell) -> bool {
    cell == self.a || cell == self.b
  }
}
