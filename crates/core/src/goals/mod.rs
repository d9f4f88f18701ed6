//! Goals module - domain models, enrichment, services, and traits.

mod goals_enrichment;
mod goals_model;
mod goals_service;
mod goals_traits;
mod goals_validation;

pub use goals_enrichment::{apply, derive_status, enrich, needs_persist, Enrichment};
pub use goals_model::{CachedAmount, Goal, GoalStatus, GoalUpdate, NewGoal, ReconcileOutcome};
pub use goals_service::GoalService;
pub use goals_traits::{GoalRepositoryTrait, GoalServiceTrait};
