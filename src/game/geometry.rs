use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn vector(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, direction: Direction) -> Cell {
        let (dx, dy) = direction.vector();
        Cell {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn manhattan(self, other: Cell) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// Inclusive playable rectangle. Always square; only ever shrinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArenaBounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl ArenaBounds {
    pub fn for_grid(grid_size: i32) -> Self {
        Self {
            min_x: 0,
            min_y: 0,
            max_x: grid_size - 1,
            max_y: grid_size - 1,
        }
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= self.min_x && cell.x <= self.max_x && cell.y >= self.min_y && cell.y <= self.max_y
    }

    /// Number of cells along one side.
    pub fn span(&self) -> i32 {
        self.max_x - self.min_x + 1
    }

    /// Contracts every edge by `amount` unless that would leave fewer than
    /// `min_span` cells per side. Returns whether anything changed.
    pub fn shrink(&mut self, amount: i32, min_span: i32) -> bool {
        if self.span() - amount * 2 < min_span {
            return false;
        }
        self.min_x += amount;
        self.min_y += amount;
        self.max_x -= amount;
        self.max_y -= amount;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        for direction in Direction::ALL {
            assert_ne!(direction, direction.opposite());
            assert_eq!(direction, direction.opposite().opposite());
        }
    }

    #[test]
    fn step_follows_screen_coordinates() {
        let origin = Cell::new(5, 5);
        assert_eq!(origin.step(Direction::Up), Cell::new(5, 4));
        assert_eq!(origin.step(Direction::Down), Cell::new(5, 6));
        assert_eq!(origin.step(Direction::Left), Cell::new(4, 5));
        assert_eq!(origin.step(Direction::Right), Cell::new(6, 5));
    }

    #[test]
    fn shrink_stops_at_minimum_span() {
        let mut bounds = ArenaBounds::for_grid(16);
        assert!(bounds.shrink(1, 12));
        assert_eq!(bounds.span(), 14);
        assert!(bounds.shrink(1, 12));
        assert_eq!(bounds.span(), 12);
        assert!(!bounds.shrink(1, 12));
        assert_eq!(
            bounds,
            ArenaBounds {
                min_x: 2,
                min_y: 2,
                max_x: 13,
                max_y: 13,
            }
        );
    }

    #[test]
    fn bounds_are_inclusive() {
        let bounds = ArenaBounds::for_grid(40);
        assert!(bounds.contains(Cell::new(0, 39)));
        assert!(!bounds.contains(Cell::new(-1, 0)));
        assert!(!bounds.contains(Cell::new(40, 0)));
    }
}
