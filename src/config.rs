use crate::game::constants::{
    GRID_SIZE, MAX_ROOM_CAPACITY, MIN_GRID_SIZE, MIN_TICK_MS, ROOM_CAPACITY, TICK_MS,
};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub grid_size: u8,
    pub room_capacity: usize,
    pub tick_period: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            room_capacity: ROOM_CAPACITY,
            tick_period: Duration::from_millis(TICK_MS),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let grid_size = lookup("GRID_SIZE")
            .and_then(|value| value.trim().parse::<u8>().ok())
            .unwrap_or(GRID_SIZE)
            .max(MIN_GRID_SIZE);
        let room_capacity = lookup("ROOM_CAPACITY")
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(ROOM_CAPACITY)
            .clamp(1, MAX_ROOM_CAPACITY);
        let tick_ms = lookup("TICK_MS")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(TICK_MS)
            .max(MIN_TICK_MS);
        Self {
            grid_size,
            room_capacity,
            tick_period: Duration::from_millis(tick_ms),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(8787),
        }
    }
}
