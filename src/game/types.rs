use serde::{Deserialize, Serialize};

pub type PlayerId = u32;
pub type RoomId = u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: u8,
    pub y: u8,
}

impl Cell {
    pub fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Neighbour one step along `direction`, or `None` when it would leave a
    /// `grid_size` x `grid_size` board.
    pub fn step(self, direction: Direction, grid_size: u8) -> Option<Cell> {
        let (dx, dy) = direction.delta();
        let x = i16::from(self.x) + dx;
        let y = i16::from(self.y) + dy;
        let bound = i16::from(grid_size);
        if x < 0 || y < 0 || x >= bound || y >= bound {
            return None;
        }
        Some(Cell::new(x as u8, y as u8))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Row 0 is the top of the board, so `Up` decreases y.
    pub fn delta(self) -> (i16, i16) {
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

    pub fn is_opposite(self, other: Direction) -> bool {
        self.opposite() == other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellState {
    #[default]
    Empty,
    Snake,
    Food,
}
