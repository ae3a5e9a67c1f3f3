pub mod constants;
pub mod grid;
pub mod input;
pub mod registry;
pub mod room;
pub mod snake;
pub mod types;
