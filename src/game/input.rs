use super::engine::Engine;
use super::geometry::Direction;

/// Accepts only the four exact cardinal names sent by clients.
pub fn parse_direction(value: &str) -> Option<Direction> {
    match value {
        "UP" => Some(Direction::Up),
        "DOWN" => Some(Direction::Down),
        "LEFT" => Some(Direction::Left),
        "RIGHT" => Some(Direction::Right),
        _ => None,
    }
}

/// One controller action, from a remote client, a bot, or the local player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Direction(Direction),
    Dash,
    Trap,
}

impl Intent {
    pub fn apply(self, engine: &mut Engine, id: &str) {
        match self {
            Intent::Direction(direction) => engine.set_direction(id, direction),
            Intent::Dash => engine.activate_dash(id),
            Intent::Trap => engine.place_trap(id),
        }
    }
}
