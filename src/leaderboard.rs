use crate::app::time::now_millis;
use crate::game::scoreboard::GameResult;
use crate::game::types::GameMode;
use crate::shared::names::{sanitize_player_name, DEFAULT_PLAYER_NAME};
use anyhow::Context;
use serde::Serialize;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use std::path::PathBuf;
use std::time::Duration;

/// Solo rows beyond this many (newest first) are pruned on insert.
pub const SOLO_HISTORY_LIMIT: i64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerTotals {
  pub name: String,
  pub wins: i64,
  pub score: i64,
  #[serde(rename = "gamesPlayed")]
  pub games_played: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoloScore {
  pub name: String,
  pub score: i64,
  #[serde(rename = "survivalTime")]
  pub survival_time: i64,
  pub mode: GameMode,
  #[serde(rename = "createdAt")]
  pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoloSubmission {
  pub name: String,
  pub score: i64,
  pub survival_time: i64,
  pub mode: GameMode,
}

/// Historical rankings: multiplayer totals per display name and solo runs.
#[derive(Debug, Clone)]
pub struct Leaderboard {
  pool: SqlitePool,
}

impl Leaderboard {
  pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
    ensure_db_dir(database_url)?;
    let in_memory = is_memory_url(database_url);
    let options = if in_memory {
      // Every connection to `:memory:` is a separate database.
      SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
    } else {
      SqlitePoolOptions::new().max_connections(5)
    };
    let pool = options
      .connect(database_url)
      .await
      .with_context(|| format!("failed to open database {database_url}"))?;
    sqlx::migrate!("./migrations")
      .run(&pool)
      .await
      .context("failed to run migrations")?;
    Ok(Self { pool })
  }

  /// Adds one finished match: every entry gets its score and a game played,
  /// the winner also gets a win.
  pub async fn record_match(&self, result: &GameResult) -> anyhow::Result<()> {
    let winner_id = result.winner.as_ref().map(|winner| winner.id.as_str());
    let mut tx = self.pool.begin().await?;
    for entry in &result.scoreboard {
      let win = i64::from(winner_id == Some(entry.id.as_str()));
      sqlx::query(
        "INSERT INTO player_totals (name, wins, score, games_played) VALUES (?, ?, ?, 1) \
         ON CONFLICT(name) DO UPDATE SET \
           wins = player_totals.wins + excluded.wins, \
           score = player_totals.score + excluded.score, \
           games_played = player_totals.games_played + 1",
      )
      .bind(&entry.name)
      .bind(win)
      .bind(i64::from(entry.score))
      .execute(&mut *tx)
      .await
      .context("failed to update player totals")?;
    }
    tx.commit().await?;
    Ok(())
  }

  pub async fn top_players(&self, limit: i64) -> anyhow::Result<Vec<PlayerTotals>> {
    let rows = sqlx::query(
      "SELECT name, wins, score, games_played FROM player_totals \
       ORDER BY wins DESC, score DESC, name ASC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(&self.pool)
    .await?;

    rows
      .into_iter()
      .map(|row| -> anyhow::Result<PlayerTotals> {
        Ok(PlayerTotals {
          name: row.try_get("name")?,
          wins: row.try_get("wins")?,
          score: row.try_get("score")?,
          games_played: row.try_get("games_played")?,
        })
      })
      .collect()
  }

  pub async fn record_solo_score(&self, submission: &SoloSubmission) -> anyhow::Result<()> {
    let name = sanitize_player_name(&submission.name, DEFAULT_PLAYER_NAME);
    let mut tx = self.pool.begin().await?;
    sqlx::query(
      "INSERT INTO solo_scores (name, score, survival_time, mode, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(name)
    .bind(submission.score.max(0))
    .bind(submission.survival_time.max(0))
    .bind(submission.mode.as_str())
    .bind(now_millis())
    .execute(&mut *tx)
    .await
    .context("failed to insert solo score")?;
    sqlx::query(
      "DELETE FROM solo_scores WHERE id NOT IN \
       (SELECT id FROM solo_scores ORDER BY id DESC LIMIT ?)",
    )
    .bind(SOLO_HISTORY_LIMIT)
    .execute(&mut *tx)
    .await
    .context("failed to prune solo scores")?;
    tx.commit().await?;
    Ok(())
  }

  pub async fn top_solo_scores(&self, limit: i64) -> anyhow::Result<Vec<SoloScore>> {
    let rows = sqlx::query(
      "SELECT name, score, survival_time, mode, created_at FROM solo_scores \
       ORDER BY score DESC, id ASC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(&self.pool)
    .await?;

    rows
      .into_iter()
      .map(|row| -> anyhow::Result<SoloScore> {
        let mode: String = row.try_get("mode")?;
        Ok(SoloScore {
          name: row.try_get("name")?,
          score: row.try_get("score")?,
          survival_time: row.try_get("survival_time")?,
          mode: if mode == "classic" {
            GameMode::Classic
          } else {
            GameMode::Arena
          },
          created_at: row.try_get("created_at")?,
        })
      })
      .collect()
  }
}

fn is_memory_url(database_url: &str) -> bool {
  database_url.starts_with("sqlite::memory:") || database_url.ends_with(":memory:")
}

fn ensure_db_dir(database_url: &str) -> anyhow::Result<()> {
  if is_memory_url(database_url) {
    return Ok(());
  }
  let path = database_url
    .strip_prefix("sqlite://")
    .or_else(|| database_url.strip_prefix("sqlite:"));
  let Some(path) = path else { return Ok(()) };
  let path = path.split('?').next().unwrap_or_default();
  if path.is_empty() {
    return Ok(());
  }
  let db_path = PathBuf::from(path);
  if let Some(parent) = db_path.parent() {
    if !parent.as_os_str().is_empty() {
      std::fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;
    }
  }
  if !db_path.exists() {
    std::fs::File::create(&db_path)
      .with_context(|| format!("failed to create {}", db_path.display()))?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::game::scoreboard::{ScoreboardEntry, Winner};

  async fn memory() -> Leaderboard {
    Leaderboard::connect("sqlite::memory:").await.expect("memory db")
  }

  fn entry(id: &str, name: &str, score: u32) -> ScoreboardEntry {
    ScoreboardEntry {
      id: id.to_string(),
      name: name.to_string(),
      score,
      alive: false,
      kills: 0,
      color: "#ffffff".to_string(),
    }
  }

  fn result(winner: Option<(&str, &str)>, scoreboard: Vec<ScoreboardEntry>) -> GameResult {
    GameResult {
      winner: winner.map(|(id, name)| Winner {
        id: id.to_string(),
        name: name.to_string(),
        score: 0,
        color: "#ffffff".to_string(),
      }),
      scoreboard,
    }
  }

  #[tokio::test]
  async fn match_results_accumulate_per_name() {
    let board = memory().await;
    board
      .record_match(&result(
        Some(("1", "Ada")),
        vec![entry("1", "Ada", 60), entry("2", "Bo", 30)],
      ))
      .await
      .expect("first match");
    board
      .record_match(&result(
        Some(("2", "Bo")),
        vec![entry("2", "Bo", 45), entry("1", "Ada", 10)],
      ))
      .await
      .expect("second match");
    board
      .record_match(&result(None, vec![entry("3", "Cy", 500)]))
      .await
      .expect("draw");

    let top = board.top_players(20).await.expect("top");
    assert_eq!(
      top,
      vec![
        PlayerTotals {
          name: "Bo".to_string(),
          wins: 1,
          score: 75,
          games_played: 2,
        },
        PlayerTotals {
          name: "Ada".to_string(),
          wins: 1,
          score: 70,
          games_played: 2,
        },
        PlayerTotals {
          name: "Cy".to_string(),
          wins: 0,
          score: 500,
          games_played: 1,
        },
      ]
    );
    assert_eq!(board.top_players(1).await.expect("limit").len(), 1);
  }

  #[tokio::test]
  async fn solo_scores_are_sanitized_and_ranked() {
    let board = memory().await;
    for (name, score) in [("Low", 10), ("<High>", 90), ("Mid", 40)] {
      board
        .record_solo_score(&SoloSubmission {
          name: name.to_string(),
          score,
          survival_time: -5,
          mode: GameMode::Classic,
        })
        .await
        .expect("insert");
    }

    let top = board.top_solo_scores(20).await.expect("top");
    let names: Vec<&str> = top.iter().map(|row| row.name.as_str()).collect();
    assert_eq!(names, vec!["High", "Mid", "Low"]);
    assert_eq!(top[0].survival_time, 0);
    assert_eq!(top[0].mode, GameMode::Classic);
  }

  #[tokio::test]
  async fn solo_history_is_pruned() {
    let board = memory().await;
    for index in 0..(SOLO_HISTORY_LIMIT + 5) {
      board
        .record_solo_score(&SoloSubmission {
          name: "Grinder".to_string(),
          score: index,
          survival_time: 1,
          mode: GameMode::Arena,
        })
        .await
        .expect("insert");
    }

    let all = board
      .top_solo_scores(SOLO_HISTORY_LIMIT * 2)
      .await
      .expect("all");
    assert_eq!(all.len() as i64, SOLO_HISTORY_LIMIT);
    assert_eq!(all.last().map(|row| row.score), Some(5));
  }

  #[test]
  fn memory_urls_skip_directory_creation() {
    assert!(ensure_db_dir("sqlite::memory:").is_ok());
    assert!(ensure_db_dir("postgres://elsewhere").is_ok());
  }
}
