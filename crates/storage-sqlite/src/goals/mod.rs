//! SQLite storage implementation for goals.

mod model;
mod repository;

pub use model::{GoalDB, GoalProjectionDB};
pub use repository::GoalRepository;
