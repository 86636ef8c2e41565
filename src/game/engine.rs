use super::constants::{
  DASH_COOLDOWN_TICKS, DASH_DURATION_TICKS, DASH_MIN_LENGTH, DASH_STEPS, DEFAULT_GRID_SIZE,
  FOOD_SCORE, KILL_SCORE, MAX_GRID_SIZE, MAX_ROSTER, MIN_ARENA_SPAN, MIN_GRID_SIZE,
  SHRINK_AMOUNT, SHRINK_INTERVAL_TICKS, TRAP_COOLDOWN_TICKS, TRAP_DURATION_TICKS, TRAP_MIN_LENGTH,
};
use super::error::EngineError;
use super::events::GameEvent;
use super::geometry::{ArenaBounds, Direction};
use super::hazards::{food_cap, Hazards};
use super::scoreboard::{build_scoreboard, GameResult, ScoreboardEntry, Winner};
use super::snake::{create_snake, remove_tail_segment, spawn_points};
use super::snapshot::{SnakeSnapshot, Snapshot, TrapSnapshot};
use super::timers::Timer;
use super::types::{GameMode, RosterEntry, RunState, Snake};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
  pub grid_size: i32,
  pub mode: GameMode,
  /// Seed for food and wormhole placement. `None` draws one from entropy.
  pub seed: Option<u64>,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      grid_size: DEFAULT_GRID_SIZE,
      mode: GameMode::Arena,
      seed: None,
    }
  }
}

/// Authoritative simulation of one match.
///
/// The engine is the only owner of snake records. Hosts mutate it through
/// [`Engine::set_direction`], [`Engine::activate_dash`], [`Engine::place_trap`]
/// and [`Engine::forfeit`] between ticks, advance it with [`Engine::tick`], and
/// read it through [`Engine::snapshot`].
#[derive(Debug)]
pub struct Engine {
  grid_size: i32,
  mode: GameMode,
  tick_count: u64,
  state: RunState,
  bounds: ArenaBounds,
  snakes: Vec<Snake>,
  index: HashMap<String, usize>,
  hazards: Hazards,
  rng: StdRng,
  pending: Vec<GameEvent>,
}

impl Engine {
  pub fn new(roster: &[RosterEntry], config: EngineConfig) -> Result<Self, EngineError> {
    if roster.is_empty() {
      return Err(EngineError::EmptyRoster);
    }
    if roster.len() > MAX_ROSTER {
      return Err(EngineError::RosterTooLarge {
        count: roster.len(),
        max: MAX_ROSTER,
      });
    }
    if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&config.grid_size) {
      return Err(EngineError::InvalidGridSize {
        size: config.grid_size,
        min: MIN_GRID_SIZE,
        max: MAX_GRID_SIZE,
      });
    }

    let mut index = HashMap::with_capacity(roster.len());
    let spawns = spawn_points(config.grid_size, roster.len());
    let mut snakes = Vec::with_capacity(roster.len());
    for (slot, (entry, spawn)) in roster.iter().zip(spawns).enumerate() {
      if index.insert(entry.id.clone(), slot).is_some() {
        return Err(EngineError::DuplicateId(entry.id.clone()));
      }
      snakes.push(create_snake(entry, slot, spawn));
    }

    let rng = match config.seed {
      Some(seed) => StdRng::seed_from_u64(seed),
      None => StdRng::from_entropy(),
    };

    let mut engine = Self {
      grid_size: config.grid_size,
      mode: config.mode,
      tick_count: 0,
      state: RunState::Running,
      bounds: ArenaBounds::for_grid(config.grid_size),
      snakes,
      index,
      hazards: Hazards::new(),
      rng,
      pending: Vec::new(),
    };

    if engine.mode.has_abilities() {
      engine
        .hazards
        .generate_wormholes(&engine.snakes, engine.grid_size, &mut engine.rng);
    }
    for _ in 0..food_cap(engine.snakes.len()) {
      engine
        .hazards
        .spawn_food(&engine.snakes, &engine.bounds, &mut engine.rng);
    }

    Ok(engine)
  }

  pub fn state(&self) -> RunState {
    self.state
  }

  pub fn is_finished(&self) -> bool {
    self.state == RunState::Finished
  }

  pub fn mode(&self) -> GameMode {
    self.mode
  }

  pub fn tick_count(&self) -> u64 {
    self.tick_count
  }

  pub fn snake(&self, id: &str) -> Option<&Snake> {
    self.index.get(id).map(|&slot| &self.snakes[slot])
  }

  /// Stages `direction` for the next tick. Reversing onto the committed
  /// direction is ignored; the latest accepted call before a tick wins.
  pub fn set_direction(&mut self, id: &str, direction: Direction) {
    let Some(snake) = self.living_mut(id) else { return };
    if direction == snake.direction.opposite() {
      return;
    }
    snake.next_direction = direction;
  }

  pub fn activate_dash(&mut self, id: &str) {
    if !self.mode.has_abilities() {
      return;
    }
    let Some(snake) = self.living_mut(id) else { return };
    if !snake.timers.is_ready(Timer::DashCooldown) || snake.len() < DASH_MIN_LENGTH {
      return;
    }
    snake.timers.set(Timer::DashActive, DASH_DURATION_TICKS);
    snake.timers.set(Timer::DashCooldown, DASH_COOLDOWN_TICKS);
    remove_tail_segment(snake, DASH_MIN_LENGTH - 1);
    let event = GameEvent::DashActivated {
      snake_id: snake.id.clone(),
      cell: snake.head(),
      color: snake.color.clone(),
    };
    self.pending.push(event);
  }

  pub fn place_trap(&mut self, id: &str) {
    if !self.mode.has_abilities() {
      return;
    }
    let tick = self.tick_count;
    let Some(snake) = self.living_mut(id) else { return };
    if !snake.timers.is_ready(Timer::TrapCooldown) || snake.len() < TRAP_MIN_LENGTH {
      return;
    }
    let Some(cell) = snake.tail() else { return };
    snake.timers.set(Timer::TrapCooldown, TRAP_COOLDOWN_TICKS);
    let owner_id = snake.id.clone();
    self.hazards.place_trap(cell, &owner_id, tick);
    self.pending.push(GameEvent::TrapPlaced { cell });
  }

  /// Removes a departed player from play. The end-of-game check runs on the
  /// next tick.
  pub fn forfeit(&mut self, id: &str) {
    let Some(&slot) = self.index.get(id) else { return };
    if self.is_finished() || !self.snakes[slot].alive {
      return;
    }
    let mut events = std::mem::take(&mut self.pending);
    self.kill(slot, &mut events);
    self.pending = events;
  }

  /// Drains events produced by mutators since the last tick.
  pub fn take_events(&mut self) -> Vec<GameEvent> {
    std::mem::take(&mut self.pending)
  }

  /// Advances the world by one step. Returns buffered mutator events followed
  /// by this tick's events, ending with the state snapshot. Does nothing once
  /// the game is finished.
  pub fn tick(&mut self) -> Vec<GameEvent> {
    if self.is_finished() {
      return Vec::new();
    }
    let mut events = std::mem::take(&mut self.pending);
    self.tick_count += 1;

    let dashing = self.decay_counters();
    self.move_snakes(&dashing, &mut events);
    self.resolve_collisions(&mut events);

    if self.mode.has_abilities() {
      self.hazards.expire_traps(self.tick_count, TRAP_DURATION_TICKS);
      self.shrink_arena(&mut events);
    }

    if let Some(result) = self.check_game_end() {
      events.push(GameEvent::GameEnded(result));
    }
    events.push(GameEvent::StateUpdated(Box::new(self.snapshot())));
    events
  }

  pub fn snapshot(&self) -> Snapshot {
    Snapshot {
      snakes: self
        .snakes
        .iter()
        .map(|snake| (snake.id.clone(), SnakeSnapshot::from(snake)))
        .collect(),
      foods: self.hazards.foods.clone(),
      traps: self.hazards.traps.iter().map(TrapSnapshot::from).collect(),
      wormholes: self.hazards.wormholes.clone(),
      arena_bounds: self.bounds,
      grid_size: self.grid_size,
      tick_count: self.tick_count,
      state: self.state,
    }
  }

  pub fn scoreboard(&self) -> Vec<ScoreboardEntry> {
    build_scoreboard(&self.snakes)
  }

  fn living_mut(&mut self, id: &str) -> Option<&mut Snake> {
    if self.is_finished() {
      return None;
    }
    let slot = *self.index.get(id)?;
    let snake = &mut self.snakes[slot];
    snake.alive.then_some(snake)
  }

  /// Decays every living snake's timers. Returns, per roster slot, whether the
  /// snake was dashing when the tick began.
  fn decay_counters(&mut self) -> Vec<bool> {
    self
      .snakes
      .iter_mut()
      .map(|snake| {
        if !snake.alive {
          return false;
        }
        let dashing = snake.timers.is_active(Timer::DashActive);
        snake.timers.decay();
        dashing
      })
      .collect()
  }

  fn move_snakes(&mut self, dashing: &[bool], events: &mut Vec<GameEvent>) {
    for slot in 0..self.snakes.len() {
      if !self.snakes[slot].alive {
        continue;
      }
      let direction = {
        let snake = &mut self.snakes[slot];
        snake.direction = snake.next_direction;
        snake.direction
      };
      let steps = if dashing[slot] { DASH_STEPS } else { 1 };

      for _ in 0..steps {
        let mut next = self.snakes[slot].head().step(direction);
        if let Some(exit) = self.hazards.wormhole_exit(next, direction) {
          next = exit;
        }
        self.snakes[slot].body.push_front(next);

        let Some(food) = self.hazards.take_food_at(next) else {
          self.snakes[slot].body.pop_back();
          continue;
        };
        let snake = &mut self.snakes[slot];
        snake.score += FOOD_SCORE;
        events.push(GameEvent::FoodEaten {
          snake_id: snake.id.clone(),
          cell: food.cell(),
          color: snake.color.clone(),
        });
        self
          .hazards
          .spawn_food(&self.snakes, &self.bounds, &mut self.rng);
      }
    }
  }

  /// Runs after every snake has moved, so heads are compared against the
  /// post-move bodies. Deaths apply immediately in roster order: a snake
  /// killed earlier in this pass no longer counts as an obstacle or a killer.
  fn resolve_collisions(&mut self, events: &mut Vec<GameEvent>) {
    for slot in 0..self.snakes.len() {
      let snake = &self.snakes[slot];
      if !snake.alive {
        continue;
      }
      let head = snake.head();

      if !self.bounds.contains(head) {
        self.kill(slot, events);
        continue;
      }

      if snake.body.iter().skip(1).any(|segment| *segment == head) {
        self.kill(slot, events);
        continue;
      }

      let killer = self
        .snakes
        .iter()
        .enumerate()
        .position(|(other, body)| other != slot && body.alive && body.occupies(head));
      if let Some(killer) = killer {
        self.credit_kill(killer);
        self.kill(slot, events);
        continue;
      }

      let victim_id = snake.id.clone();
      if let Some(trap) = self.hazards.take_trap_hit(head, &victim_id) {
        if let Some(&owner) = self.index.get(&trap.owner_id) {
          self.credit_kill(owner);
        }
        self.kill(slot, events);
      }
    }
  }

  fn credit_kill(&mut self, slot: usize) {
    let snake = &mut self.snakes[slot];
    snake.kills += 1;
    snake.score += KILL_SCORE;
  }

  fn kill(&mut self, slot: usize, events: &mut Vec<GameEvent>) {
    let snake = &mut self.snakes[slot];
    if !snake.alive {
      return;
    }
    snake.alive = false;
    tracing::debug!(snake_id = %snake.id, tick = self.tick_count, "snake died");
    events.push(GameEvent::SnakeDied {
      snake_id: snake.id.clone(),
      body: snake.body.iter().copied().collect(),
      color: snake.color.clone(),
    });
  }

  fn shrink_arena(&mut self, events: &mut Vec<GameEvent>) {
    if self.tick_count % SHRINK_INTERVAL_TICKS != 0 {
      return;
    }
    if self.bounds.shrink(SHRINK_AMOUNT, MIN_ARENA_SPAN) {
      tracing::debug!(tick = self.tick_count, span = self.bounds.span(), "arena shrunk");
      events.push(GameEvent::ArenaShrunk {
        bounds: self.bounds,
      });
    }
  }

  fn check_game_end(&mut self) -> Option<GameResult> {
    let alive: Vec<&Snake> = self.snakes.iter().filter(|snake| snake.alive).collect();
    let over = match self.mode {
      GameMode::Arena => alive.len() <= 1,
      GameMode::Classic => alive.is_empty(),
    };
    if !over {
      return None;
    }
    let winner = match (self.mode, alive.as_slice()) {
      (GameMode::Arena, [survivor]) => Some(Winner::from(*survivor)),
      _ => None,
    };
    self.state = RunState::Finished;
    tracing::debug!(
      tick = self.tick_count,
      winner = winner.as_ref().map(|w| w.id.as_str()),
      "game finished"
    );
    Some(GameResult {
      winner,
      scoreboard: self.scoreboard(),
    })
  }
}
