// Engine module - flock simulation plus the thin window/render glue around it

pub mod agent;
pub mod config;
pub mod error;
pub mod flock;
pub mod input;
pub mod overlay;
pub mod pacing;
pub mod systems;
pub mod view;

// Re-export commonly used items
pub use config::FlockConfig;
pub use error::{AppError, Result};
pub use flock::Flock;
