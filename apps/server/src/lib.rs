pub mod api;
pub mod config;
pub mod consumer;
pub mod error;
mod main_lib;

pub use main_lib::{build_state, goal_service_exchange, init_tracing, AppState};
