use super::types::Snake;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreboardEntry {
  pub id: String,
  pub name: String,
  pub score: u32,
  pub alive: bool,
  pub kills: u32,
  pub color: String,
}

impl From<&Snake> for ScoreboardEntry {
  fn from(snake: &Snake) -> Self {
    Self {
      id: snake.id.clone(),
      name: snake.name.clone(),
      score: snake.score,
      alive: snake.alive,
      kills: snake.kills,
      color: snake.color.clone(),
    }
  }
}

/// Ranking by score, highest first. Equal scores keep roster order.
pub fn build_scoreboard<'a>(snakes: impl IntoIterator<Item = &'a Snake>) -> Vec<ScoreboardEntry> {
  let mut entries: Vec<ScoreboardEntry> = snakes.into_iter().map(ScoreboardEntry::from).collect();
  entries.sort_by(|a, b| b.score.cmp(&a.score));
  entries
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Winner {
  pub id: String,
  pub name: String,
  pub score: u32,
  pub color: String,
}

impl From<&Snake> for Winner {
  fn from(snake: &Snake) -> Self {
    Self {
      id: snake.id.clone(),
      name: snake.name.clone(),
      score: snake.score,
      color: snake.color.clone(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameResult {
  pub winner: Option<Winner>,
  pub scoreboard: Vec<ScoreboardEntry>,
}
