// Library exports for the dots-and-boxes engine
// This allows the binaries and integration tests to use the core engine logic

pub mod agent;
pub mod board;
pub mod bot;
pub mod chains;
pub mod config;
pub mod debug_logger;
pub mod eval;
pub mod game;
pub mod replay;
pub mod search;
pub mod types;
