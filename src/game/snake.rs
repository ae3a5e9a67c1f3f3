use super::constants::{STARTING_HEADING, STARTING_SCORE};
use super::types::{Cell, Direction, PlayerId};
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct Snake {
    pub player_id: PlayerId,
    pub name: String,
    pub glyph: char,
    pub heading: Direction,
    pub score: u32,
    body: VecDeque<Cell>,
}

impl Snake {
    pub fn new(player_id: PlayerId, name: String, glyph: char, start: Cell) -> Self {
        Self {
            player_id,
            name,
            glyph,
            heading: STARTING_HEADING,
            score: STARTING_SCORE,
            body: VecDeque::from([start]),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_cells(player_id: PlayerId, heading: Direction, cells: &[Cell]) -> Self {
        Self {
            player_id,
            name: format!("p{player_id}"),
            glyph: '#',
            heading,
            score: cells.len() as u32,
            body: cells.iter().copied().collect(),
        }
    }

    pub fn head(&self) -> Cell {
        // body is never empty: it is created with one cell and restart replaces it with one.
        self.body[0]
    }

    pub fn body(&self) -> &VecDeque<Cell> {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Takes `candidate` as the new heading unless it points straight back
    /// into the neck. Returns whether the heading changed.
    pub fn steer(&mut self, candidate: Direction) -> bool {
        if candidate.is_opposite(self.heading) || candidate == self.heading {
            return false;
        }
        self.heading = candidate;
        true
    }

    /// Pushes `head` and, unless growing, drops the tail. Returns the cell the
    /// tail vacated.
    pub fn advance(&mut self, head: Cell, grow: bool) -> Option<Cell> {
        self.body.push_front(head);
        if grow {
            self.score += 1;
            return None;
        }
        self.body.pop_back()
    }

    /// Collapses the snake to a single cell at `start`.
    pub fn restart(&mut self, start: Cell) {
        self.body.clear();
        self.body.push_back(start);
        self.score = STARTING_SCORE;
    }

    pub fn cells(&self) -> Vec<Cell> {
        self.body.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_snake() -> Snake {
        Snake::new(1, "ann".to_string(), '#', Cell::new(5, 5))
    }

    #[test]
    fn new_snake_has_one_cell_and_score_one() {
        let snake = make_snake();
        assert_eq!(snake.len(), 1);
        assert_eq!(snake.score, 1);
        assert_eq!(snake.head(), Cell::new(5, 5));
        assert_eq!(snake.heading, Direction::Right);
    }

    #[test]
    fn steer_rejects_reversal() {
        let mut snake = make_snake();
        assert!(!snake.steer(Direction::Left));
        assert_eq!(snake.heading, Direction::Right);
        assert!(snake.steer(Direction::Up));
        assert_eq!(snake.heading, Direction::Up);
        assert!(!snake.steer(Direction::Down));
        assert_eq!(snake.heading, Direction::Up);
    }

    #[test]
    fn advance_without_growth_keeps_length() {
        let mut snake = make_snake();
        let vacated = snake.advance(Cell::new(6, 5), false);
        assert_eq!(vacated, Some(Cell::new(5, 5)));
        assert_eq!(snake.cells(), vec![Cell::new(6, 5)]);
        assert_eq!(snake.score as usize, snake.len());
    }

    #[test]
    fn advance_with_growth_keeps_tail() {
        let mut snake = make_snake();
        assert_eq!(snake.advance(Cell::new(6, 5), true), None);
        assert_eq!(snake.cells(), vec![Cell::new(6, 5), Cell::new(5, 5)]);
        assert_eq!(snake.score, 2);
        assert_eq!(snake.score as usize, snake.len());
    }

    #[test]
    fn restart_collapses_to_one_cell() {
        let mut snake = make_snake();
        snake.advance(Cell::new(6, 5), true);
        snake.advance(Cell::new(7, 5), true);
        assert_eq!(snake.len(), 3);
        snake.restart(Cell::new(0, 0));
        assert_eq!(snake.cells(), vec![Cell::new(0, 0)]);
        assert_eq!(snake.score, 1);
    }
}
