use super::constants::{COLOR_POOL, SPAWN_MARGIN, STARTING_LENGTH};
use super::geometry::{Cell, Direction};
use super::timers::Timers;
use super::types::{RosterEntry, Snake};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnPoint {
    pub head: Cell,
    pub direction: Direction,
}

/// Fixed corner/edge spawn table, one slot per roster index.
pub fn spawn_points(grid_size: i32, count: usize) -> Vec<SpawnPoint> {
    let m = SPAWN_MARGIN;
    let far = grid_size - m - 1;
    let table = [
        SpawnPoint {
            head: Cell::new(m, m),
            direction: Direction::Right,
        },
        SpawnPoint {
            head: Cell::new(far, far),
            direction: Direction::Left,
        },
        SpawnPoint {
            head: Cell::new(far, m),
            direction: Direction::Down,
        },
        SpawnPoint {
            head: Cell::new(m, far),
            direction: Direction::Up,
        },
        SpawnPoint {
            head: Cell::new(grid_size / 2, m),
            direction: Direction::Down,
        },
    ];
    table.into_iter().take(count).collect()
}

/// A straight body with the head first, trailing away from `direction`.
pub fn straight_body(head: Cell, direction: Direction, length: usize) -> VecDeque<Cell> {
    let behind = direction.opposite();
    let mut body = VecDeque::with_capacity(length);
    let mut cell = head;
    for _ in 0..length {
        body.push_back(cell);
        cell = cell.step(behind);
    }
    body
}

pub fn color_for_index(index: usize) -> &'static str {
    COLOR_POOL[index % COLOR_POOL.len()]
}

pub fn create_snake(entry: &RosterEntry, index: usize, spawn: SpawnPoint) -> Snake {
    Snake {
        id: entry.id.clone(),
        name: entry.display_name.clone(),
        color: color_for_index(index).to_string(),
        body: straight_body(spawn.head, spawn.direction, STARTING_LENGTH),
        direction: spawn.direction,
        next_direction: spawn.direction,
        alive: true,
        score: 0,
        kills: 0,
        timers: Timers::default(),
    }
}

pub fn remove_tail_segment(snake: &mut Snake, min_length: usize) -> bool {
    if snake.body.len() <= min_length {
        return false;
    }
    snake.body.pop_back();
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_table_uses_margin_from_every_border() {
        let points = spawn_points(40, 5);
        assert_eq!(points.len(), 5);
        assert_eq!(points[0].head, Cell::new(5, 5));
        assert_eq!(points[0].direction, Direction::Right);
        assert_eq!(points[1].head, Cell::new(34, 34));
        assert_eq!(points[1].direction, Direction::Left);
        assert_eq!(points[2].head, Cell::new(34, 5));
        assert_eq!(points[3].head, Cell::new(5, 34));
        assert_eq!(points[4].head, Cell::new(20, 5));
        assert_eq!(points[4].direction, Direction::Down);
    }

    #[test]
    fn spawn_table_is_sized_to_roster() {
        assert_eq!(spawn_points(40, 2).len(), 2);
    }

    #[test]
    fn body_trails_opposite_to_facing() {
        let body = straight_body(Cell::new(5, 5), Direction::Right, 3);
        assert_eq!(
            body.into_iter().collect::<Vec<_>>(),
            vec![Cell::new(5, 5), Cell::new(4, 5), Cell::new(3, 5)]
        );
    }

    #[test]
    fn colors_cycle_through_palette() {
        assert_eq!(color_for_index(0), color_for_index(5));
        assert_ne!(color_for_index(0), color_for_index(1));
    }

    #[test]
    fn tail_removal_respects_minimum() {
        let entry = RosterEntry::new("a", "A");
        let spawn = spawn_points(40, 1)[0];
        let mut snake = create_snake(&entry, 0, spawn);
        assert!(!remove_tail_segment(&mut snake, 3));
        snake.body.push_back(Cell::new(2, 5));
        assert!(remove_tail_segment(&mut snake, 3));
        assert_eq!(snake.len(), 3);
    }
}
