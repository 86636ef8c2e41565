pub const DEFAULT_GRID_SIZE: i32 = 40;
pub const MIN_GRID_SIZE: i32 = 20;
pub const MAX_GRID_SIZE: i32 = 200;
pub const MAX_ROSTER: usize = 5;
pub const TICK_MS: u64 = 150;

pub const SPAWN_MARGIN: i32 = 5;
pub const STARTING_LENGTH: usize = 3;

pub const FOOD_SCORE: u32 = 10;
pub const KILL_SCORE: u32 = 25;
pub const MIN_FOODS: usize = 3;
pub const FOOD_PER_SNAKE: f64 = 1.5;
pub const MAX_SPAWN_ATTEMPTS: usize = 100;

pub const DASH_DURATION_TICKS: u32 = 3;
pub const DASH_COOLDOWN_TICKS: u32 = 35;
pub const DASH_MIN_LENGTH: usize = 4;
pub const DASH_STEPS: usize = 2;

pub const TRAP_COOLDOWN_TICKS: u32 = 50;
pub const TRAP_MIN_LENGTH: usize = 3;
pub const TRAP_DURATION_TICKS: u64 = 70;

pub const WORMHOLE_PAIRS: usize = 2;
pub const WORMHOLE_PADDING: i32 = 8;
pub const WORMHOLE_MIN_DISTANCE: i32 = 10;
pub const WORMHOLE_ATTEMPTS: usize = 50;

pub const SHRINK_INTERVAL_TICKS: u64 = 200;
pub const SHRINK_AMOUNT: i32 = 1;
pub const MIN_ARENA_SPAN: i32 = 12;

pub const COLOR_POOL: [&str; 5] = ["#00ff87", "#ff6b6b", "#4ecdc4", "#ffd93d", "#a855f7"];
