use super::types::Direction;

/// Single-slot, last-writer-wins move box. A move submitted before the tick
/// consumes the previous one evicts it; nothing ever queues behind it.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveMailbox {
    pending: Option<Direction>,
}

impl MoveMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `direction`, returning the unconsumed move it replaced.
    pub fn submit(&mut self, direction: Direction) -> Option<Direction> {
        self.pending.replace(direction)
    }

    pub fn take(&mut self) -> Option<Direction> {
        self.pending.take()
    }

    #[cfg(test)]
    pub fn peek(&self) -> Option<Direction> {
        self.pending
    }
}

pub fn parse_direction(value: &str) -> Option<Direction> {
    match value.trim() {
        "up" | "Up" | "UP" | "^" => Some(Direction::Up),
        "down" | "Down" | "DOWN" | "v" => Some(Direction::Down),
        "left" | "Left" | "LEFT" | "<" => Some(Direction::Left),
        "right" | "Right" | "RIGHT" | ">" => Some(Direction::Right),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_submission_wins() {
        let mut mailbox = MoveMailbox::new();
        assert_eq!(mailbox.submit(Direction::Up), None);
        assert_eq!(mailbox.submit(Direction::Left), Some(Direction::Up));
        assert_eq!(mailbox.submit(Direction::Down), Some(Direction::Left));
        assert_eq!(mailbox.take(), Some(Direction::Down));
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn take_empties_the_slot() {
        let mut mailbox = MoveMailbox::new();
        mailbox.submit(Direction::Right);
        assert_eq!(mailbox.peek(), Some(Direction::Right));
        mailbox.take();
        assert_eq!(mailbox.peek(), None);
    }

    #[test]
    fn parse_direction_accepts_names_and_arrows() {
        assert_eq!(parse_direction("up"), Some(Direction::Up));
        assert_eq!(parse_direction(" >"), Some(Direction::Right));
        assert_eq!(parse_direction("v"), Some(Direction::Down));
        assert_eq!(parse_direction("LEFT"), Some(Direction::Left));
        assert_eq!(parse_direction("sideways"), None);
    }
}
