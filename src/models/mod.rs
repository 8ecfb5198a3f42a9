//! Core data models for the archive.

mod game;
mod ids;
mod stats;

pub use game::*;
pub use ids::*;
pub use stats::*;
