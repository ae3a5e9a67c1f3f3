use super::constants::MAX_SPAWN_ATTEMPTS;
use super::types::{Cell, CellState};
use rand::Rng;

/// Square occupancy board. Owned by a room and only touched while the room
/// state lock is held, so it carries no synchronisation of its own.
#[derive(Debug, Clone)]
pub struct Grid {
    size: u8,
    cells: Vec<CellState>,
}

impl Grid {
    pub fn new(size: u8) -> Self {
        let side = size as usize;
        Self {
            size,
            cells: vec![CellState::Empty; side * side],
        }
    }

    pub fn size(&self) -> u8 {
        self.size
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.x >= self.size || cell.y >= self.size {
            return None;
        }
        Some(cell.y as usize * self.size as usize + cell.x as usize)
    }

    pub fn state(&self, cell: Cell) -> Option<CellState> {
        self.index(cell).map(|index| self.cells[index])
    }

    pub fn is_free(&self, cell: Cell) -> bool {
        self.state(cell) == Some(CellState::Empty)
    }

    pub fn mark(&mut self, cell: Cell, state: CellState) {
        if let Some(index) = self.index(cell) {
            self.cells[index] = state;
        }
    }

    #[cfg(test)]
    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|value| **value == state).count()
    }

    /// Uniformly drawn empty cell. Rejection sampling covers the common sparse
    /// board; after `MAX_SPAWN_ATTEMPTS` misses the free cells are enumerated so
    /// a nearly full board still terminates. `None` only when nothing is free.
    pub fn random_free<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Cell> {
        for _ in 0..MAX_SPAWN_ATTEMPTS {
            let cell = Cell::new(rng.gen_range(0..self.size), rng.gen_range(0..self.size));
            if self.is_free(cell) {
                return Some(cell);
            }
        }

        let free: Vec<Cell> = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, state)| **state == CellState::Empty)
            .map(|(index, _)| {
                let side = self.size as usize;
                Cell::new((index % side) as u8, (index / side) as u8)
            })
            .collect();
        if free.is_empty() {
            return None;
        }
        Some(free[rng.gen_range(0..free.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn new_grid_is_empty() {
        let grid = Grid::new(30);
        assert_eq!(grid.count(CellState::Empty), 900);
        assert!(grid.is_free(Cell::new(0, 0)));
        assert!(grid.is_free(Cell::new(29, 29)));
    }

    #[test]
    fn out_of_bounds_cells_are_never_free() {
        let mut grid = Grid::new(10);
        assert!(!grid.is_free(Cell::new(10, 0)));
        assert_eq!(grid.state(Cell::new(0, 10)), None);
        grid.mark(Cell::new(10, 10), CellState::Snake);
        assert_eq!(grid.count(CellState::Snake), 0);
    }

    #[test]
    fn mark_updates_state() {
        let mut grid = Grid::new(10);
        let cell = Cell::new(3, 4);
        grid.mark(cell, CellState::Food);
        assert_eq!(grid.state(cell), Some(CellState::Food));
        assert!(!grid.is_free(cell));
        grid.mark(cell, CellState::Empty);
        assert!(grid.is_free(cell));
    }

    #[test]
    fn random_free_finds_last_free_cell() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut grid = Grid::new(6);
        for y in 0..6 {
            for x in 0..6 {
                grid.mark(Cell::new(x, y), CellState::Snake);
            }
        }
        grid.mark(Cell::new(4, 1), CellState::Empty);
        assert_eq!(grid.random_free(&mut rng), Some(Cell::new(4, 1)));
    }

    #[test]
    fn random_free_on_full_grid_is_none() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut grid = Grid::new(5);
        for y in 0..5 {
            for x in 0..5 {
                grid.mark(Cell::new(x, y), CellState::Food);
            }
        }
        assert_eq!(grid.random_free(&mut rng), None);
    }

    #[test]
    fn random_free_never_returns_occupied_cell() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut grid = Grid::new(8);
        for x in 0..8 {
            grid.mark(Cell::new(x, 2), CellState::Snake);
        }
        for _ in 0..200 {
            let cell = grid.random_free(&mut rng).expect("free cell");
            assert!(grid.is_free(cell));
        }
    }
}
