use super::geometry::{ArenaBounds, Cell};
use super::scoreboard::GameResult;
use super::snapshot::Snapshot;

/// Everything an engine reports to its host. Produced in resolution order.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
  FoodEaten {
    snake_id: String,
    cell: Cell,
    color: String,
  },
  SnakeDied {
    snake_id: String,
    body: Vec<Cell>,
    color: String,
  },
  DashActivated {
    snake_id: String,
    cell: Cell,
    color: String,
  },
  TrapPlaced {
    cell: Cell,
  },
  ArenaShrunk {
    bounds: ArenaBounds,
  },
  GameEnded(GameResult),
  StateUpdated(Box<Snapshot>),
}
