use super::constants::{
  FOOD_PER_SNAKE, MAX_SPAWN_ATTEMPTS, MIN_FOODS, WORMHOLE_ATTEMPTS, WORMHOLE_MIN_DISTANCE,
  WORMHOLE_PADDING, WORMHOLE_PAIRS,
};
use super::geometry::{ArenaBounds, Cell, Direction};
use super::types::{Food, Snake, Trap, Wormhole};
use rand::Rng;

/// Number of foods kept on the board for `snake_count` snakes.
pub fn food_cap(snake_count: usize) -> usize {
  MIN_FOODS.max((snake_count as f64 * FOOD_PER_SNAKE).ceil() as usize)
}

/// Foods, traps and wormholes currently on the board.
#[derive(Debug, Clone, Default)]
pub struct Hazards {
  pub foods: Vec<Food>,
  pub traps: Vec<Trap>,
  pub wormholes: Vec<Wormhole>,
  next_food_id: u32,
}

impl Hazards {
  pub fn new() -> Self {
    Self::default()
  }

  /// Living bodies, foods, traps and wormhole endpoints all block placement.
  pub fn is_occupied(&self, snakes: &[Snake], cell: Cell) -> bool {
    snakes
      .iter()
      .filter(|snake| snake.alive)
      .any(|snake| snake.occupies(cell))
      || self.foods.iter().any(|food| food.cell() == cell)
      || self.traps.iter().any(|trap| trap.cell == cell)
      || self.wormholes.iter().any(|wormhole| wormhole.touches(cell))
  }

  /// Drops one food on a random free cell inside `bounds`. Gives up silently
  /// once the attempt budget is spent on occupied cells.
  pub fn spawn_food<R: Rng>(
    &mut self,
    snakes: &[Snake],
    bounds: &ArenaBounds,
    rng: &mut R,
  ) -> Option<Food> {
    for _ in 0..MAX_SPAWN_ATTEMPTS {
      let cell = Cell::new(
        rng.gen_range(bounds.min_x..=bounds.max_x),
        rng.gen_range(bounds.min_y..=bounds.max_y),
      );
      if self.is_occupied(snakes, cell) {
        continue;
      }
      let food = Food {
        x: cell.x,
        y: cell.y,
        id: self.next_food_id,
      };
      self.next_food_id = self.next_food_id.wrapping_add(1);
      self.foods.push(food);
      return Some(food);
    }
    None
  }

  pub fn take_food_at(&mut self, cell: Cell) -> Option<Food> {
    let index = self.foods.iter().rposition(|food| food.cell() == cell)?;
    Some(self.foods.remove(index))
  }

  pub fn generate_wormholes<R: Rng>(&mut self, snakes: &[Snake], grid_size: i32, rng: &mut R) {
    self.wormholes.clear();
    let range = (grid_size - WORMHOLE_PADDING * 2).max(1);
    for id in 0..WORMHOLE_PAIRS {
      let mut chosen = None;
      let mut fallback = None;
      for _ in 0..WORMHOLE_ATTEMPTS {
        let a = Cell::new(
          WORMHOLE_PADDING + rng.gen_range(0..range),
          WORMHOLE_PADDING + rng.gen_range(0..range),
        );
        let b = Cell::new(
          WORMHOLE_PADDING + rng.gen_range(0..range),
          WORMHOLE_PADDING + rng.gen_range(0..range),
        );
        if a == b || self.is_occupied(snakes, a) || self.is_occupied(snakes, b) {
          continue;
        }
        if a.manhattan(b) >= WORMHOLE_MIN_DISTANCE {
          chosen = Some((a, b));
          break;
        }
        fallback = Some((a, b));
      }
      if let Some((a, b)) = chosen.or(fallback) {
        self.wormholes.push(Wormhole { a, b, id: id as u32 });
      }
    }
  }

  /// Where a head that just landed on `cell` ends up: one step past the paired
  /// endpoint, or `None` when `cell` is not an endpoint.
  pub fn wormhole_exit(&self, cell: Cell, direction: Direction) -> Option<Cell> {
    self
      .wormholes
      .iter()
      .find_map(|wormhole| wormhole.partner_of(cell))
      .map(|partner| partner.step(direction))
  }

  pub fn place_trap(&mut self, cell: Cell, owner_id: &str, tick: u64) {
    self.traps.push(Trap {
      cell,
      owner_id: owner_id.to_string(),
      created_tick: tick,
    });
  }

  /// Removes and returns the newest trap on `cell` that does not belong to
  /// `victim_id`.
  pub fn take_trap_hit(&mut self, cell: Cell, victim_id: &str) -> Option<Trap> {
    let index = self
      .traps
      .iter()
      .rposition(|trap| trap.cell == cell && trap.owner_id != victim_id)?;
    Some(self.traps.remove(index))
  }

  pub fn expire_traps(&mut self, tick: u64, duration: u64) -> usize {
    let before = self.traps.len();
    self
      .traps
      .retain(|trap| tick.saturating_sub(trap.created_tick) < duration);
    before - self.traps.len()
  }
}
