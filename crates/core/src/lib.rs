//! Fintrack Core - goal domain, balance client, and event plumbing.
//!
//! This crate contains the business logic of the goal service. It is
//! database-agnostic and defines traits that are implemented by the
//! `storage-sqlite` crate.

pub mod balance;
pub mod constants;
pub mod errors;
pub mod events;
pub mod goals;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
