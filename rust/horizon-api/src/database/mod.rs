//! Embedded SQLite storage.
//!
//! All tables are scoped to a user id; every query filters on the
//! authenticated user, which is what enforces ownership now that the
//! service owns the database instead of delegating to row-level
//! policies.

pub mod schema;
pub mod store;

pub use store::{
    CheckinOutcome, CheckinSummary, ClaimOutcome, ClaimSummary, CompleteOutcome,
    InstanceWithMission, SeedSummary, SqliteStore,
};
