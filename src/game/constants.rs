pub const GRID_SIZE: u8 = 30;
pub const ROOM_CAPACITY: usize = 5;
pub const TICK_MS: u64 = 750;
pub const MAX_SPAWN_ATTEMPTS: usize = 64;
pub const STARTING_SCORE: u32 = 1;
pub const STARTING_HEADING: super::types::Direction = super::types::Direction::Right;

pub const MIN_GRID_SIZE: u8 = 5;
pub const MIN_TICK_MS: u64 = 10;
pub const MAX_ROOM_CAPACITY: usize = 16;
