use crate::game::geometry::{ArenaBounds, Cell, Direction};
use crate::game::input::Intent;
use crate::game::snapshot::Snapshot;
use crate::game::types::{Food, Wormhole};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashSet, VecDeque};

const FOOD_BONUS: f64 = 5.0;
const NEAREST_FOODS: usize = 3;
const FOOD_DISTANCE_WEIGHT: f64 = 0.5;
const KEEP_HEADING_RATIO: f64 = 0.6;
const DASH_REACH: i32 = 3;
const TRAP_REACH: i32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn profile(self) -> BotProfile {
        match self {
            Difficulty::Easy => BotProfile {
                food_seek_chance: 0.35,
                random_turn_chance: 0.18,
                dash_chance: 0.01,
                trap_chance: 0.005,
                mistake_chance: 0.12,
                flood_fill_depth: 12,
            },
            Difficulty::Medium => BotProfile {
                food_seek_chance: 0.65,
                random_turn_chance: 0.04,
                dash_chance: 0.03,
                trap_chance: 0.012,
                mistake_chance: 0.04,
                flood_fill_depth: 30,
            },
            Difficulty::Hard => BotProfile {
                food_seek_chance: 0.92,
                random_turn_chance: 0.01,
                dash_chance: 0.06,
                trap_chance: 0.025,
                mistake_chance: 0.0,
                flood_fill_depth: 60,
            },
        }
    }
}

/// Per-decision probabilities and how far the bot looks for open space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BotProfile {
    pub food_seek_chance: f64,
    pub random_turn_chance: f64,
    pub dash_chance: f64,
    pub trap_chance: f64,
    pub mistake_chance: f64,
    pub flood_fill_depth: usize,
}

/// Drives one snake from snapshots alone. The returned intents go through the
/// same mutators a remote player uses.
#[derive(Debug)]
pub struct BotController {
    profile: BotProfile,
    rng: StdRng,
}

#[derive(Debug, Clone, Copy)]
struct Move {
    direction: Direction,
    score: f64,
}

impl BotController {
    pub fn new(difficulty: Difficulty, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            profile: difficulty.profile(),
            rng,
        }
    }

    pub fn decide(&mut self, snapshot: &Snapshot, id: &str) -> Vec<Intent> {
        let Some(me) = snapshot.snakes.get(id).filter(|snake| snake.alive) else {
            return Vec::new();
        };
        let Some(&head) = me.body.first() else {
            return Vec::new();
        };
        let heading = me.direction;
        let candidates: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|direction| *direction != heading.opposite())
            .collect();

        if self.roll(self.profile.mistake_chance) {
            let pick = candidates[self.rng.gen_range(0..candidates.len())];
            return vec![Intent::Direction(pick)];
        }

        let board = Board::new(snapshot, id);
        let options: Vec<Move> = candidates
            .iter()
            .filter_map(|&direction| {
                let landing = board.landing(head, direction);
                if board.is_fatal(landing) {
                    return None;
                }
                let score = board.open_space(landing, self.profile.flood_fill_depth)
                    * board.edge_factor(landing);
                Some(Move { direction, score })
            })
            .collect();
        if options.is_empty() {
            return Vec::new();
        }

        let mut choice = None;
        if !snapshot.foods.is_empty() && self.roll(self.profile.food_seek_chance) {
            choice = seek_food(head, &snapshot.foods, &options);
        }
        if choice.is_none() && self.roll(self.profile.random_turn_chance) {
            choice = Some(options[self.rng.gen_range(0..options.len())].direction);
        }
        let choice = choice.unwrap_or_else(|| steady_choice(heading, &options));

        let mut intents = vec![Intent::Direction(choice)];
        if self.roll(self.profile.dash_chance) && food_ahead(head, choice, &snapshot.foods) {
            intents.push(Intent::Dash);
        } else if self.roll(self.profile.trap_chance) {
            if let Some(&tail) = me.body.last() {
                if enemy_near(snapshot, id, tail) {
                    intents.push(Intent::Trap);
                }
            }
        }
        intents
    }

    fn roll(&mut self, chance: f64) -> bool {
        chance > 0.0 && self.rng.gen_bool(chance.min(1.0))
    }
}

/// Obstacles as a bot sees them in one snapshot.
struct Board<'a> {
    bounds: ArenaBounds,
    blocked: HashSet<Cell>,
    foods: HashSet<Cell>,
    wormholes: &'a [Wormhole],
}

impl<'a> Board<'a> {
    fn new(snapshot: &'a Snapshot, id: &str) -> Self {
        let mut blocked = HashSet::new();
        for snake in snapshot.living() {
            // Tails move away this tick.
            let keep = snake.body.len().saturating_sub(1);
            blocked.extend(snake.body.iter().take(keep).copied());
        }
        blocked.extend(
            snapshot
                .traps
                .iter()
                .filter(|trap| trap.owner_id != id)
                .map(|trap| Cell::new(trap.x, trap.y)),
        );
        Self {
            bounds: snapshot.arena_bounds,
            blocked,
            foods: snapshot.foods.iter().map(Food::cell).collect(),
            wormholes: &snapshot.wormholes,
        }
    }

    fn landing(&self, head: Cell, direction: Direction) -> Cell {
        let next = head.step(direction);
        self.wormholes
            .iter()
            .find_map(|wormhole| wormhole.partner_of(next))
            .map(|partner| partner.step(direction))
            .unwrap_or(next)
    }

    fn is_fatal(&self, cell: Cell) -> bool {
        !self.bounds.contains(cell) || self.blocked.contains(&cell)
    }

    /// Reachable free cells from `start`, capped at `limit`, plus a bonus for
    /// every food among them.
    fn open_space(&self, start: Cell, limit: usize) -> f64 {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start]);
        let mut count = 0usize;
        let mut bonus = 0.0;
        while let Some(cell) = queue.pop_front() {
            if count >= limit {
                break;
            }
            if self.is_fatal(cell) || !visited.insert(cell) {
                continue;
            }
            count += 1;
            if self.foods.contains(&cell) {
                bonus += FOOD_BONUS;
            }
            queue.extend(Direction::ALL.into_iter().map(|direction| cell.step(direction)));
        }
        count as f64 + bonus
    }

    fn edge_factor(&self, cell: Cell) -> f64 {
        let distance = (cell.x - self.bounds.min_x)
            .min(self.bounds.max_x - cell.x)
            .min(cell.y - self.bounds.min_y)
            .min(self.bounds.max_y - cell.y);
        match distance {
            d if d < 3 => 0.5,
            d if d < 5 => 0.8,
            _ => 1.0,
        }
    }
}

fn seek_food(head: Cell, foods: &[Food], options: &[Move]) -> Option<Direction> {
    let mut nearest: Vec<(i32, Cell)> = foods
        .iter()
        .map(|food| (head.manhattan(food.cell()), food.cell()))
        .collect();
    nearest.sort_by_key(|(distance, _)| *distance);

    nearest
        .into_iter()
        .take(NEAREST_FOODS)
        .filter_map(|(distance, target)| {
            let option = toward(head, target, options)?;
            Some((option.direction, option.score - distance as f64 * FOOD_DISTANCE_WEIGHT))
        })
        .fold(None, |best: Option<(Direction, f64)>, candidate| match best {
            Some(current) if current.1 >= candidate.1 => Some(current),
            _ => Some(candidate),
        })
        .map(|(direction, _)| direction)
}

/// Safe option that closes distance to `target`, favouring the longer axis.
fn toward(head: Cell, target: Cell, options: &[Move]) -> Option<Move> {
    let dx = target.x - head.x;
    let dy = target.y - head.y;
    let mut preferred: Vec<Move> = options
        .iter()
        .copied()
        .filter(|option| match option.direction {
            Direction::Right => dx > 0,
            Direction::Left => dx < 0,
            Direction::Down => dy > 0,
            Direction::Up => dy < 0,
        })
        .collect();
    preferred.sort_by(|a, b| b.score.total_cmp(&a.score));

    let horizontal = dx.abs() > dy.abs();
    preferred
        .iter()
        .copied()
        .find(|option| matches!(option.direction, Direction::Left | Direction::Right) == horizontal)
        .or_else(|| preferred.first().copied())
}

/// Keeps the current heading while it has enough room, otherwise takes the
/// roomiest option.
fn steady_choice(heading: Direction, options: &[Move]) -> Direction {
    let best = options
        .iter()
        .copied()
        .fold(options[0], |best, option| if option.score > best.score { option } else { best });
    match options.iter().find(|option| option.direction == heading) {
        Some(current) if current.score > 0.0 && current.score >= best.score * KEEP_HEADING_RATIO => {
            heading
        }
        _ => best.direction,
    }
}

fn food_ahead(head: Cell, direction: Direction, foods: &[Food]) -> bool {
    let (vx, vy) = direction.vector();
    foods.iter().any(|food| {
        let ahead = (food.x - head.x) * vx + (food.y - head.y) * vy;
        let lateral = ((food.x - head.x) * vy).abs() + ((food.y - head.y) * vx).abs();
        ahead > 0 && ahead <= DASH_REACH && lateral == 0
    })
}

fn enemy_near(snapshot: &Snapshot, id: &str, tail: Cell) -> bool {
    snapshot
        .living()
        .filter(|snake| snake.id != id)
        .filter_map(|snake| snake.body.first())
        .any(|head| head.manhattan(tail) < TRAP_REACH)
}
