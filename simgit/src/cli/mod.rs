pub mod app;
pub mod commands;
pub mod sink;

pub use app::{Cli, Commands};
