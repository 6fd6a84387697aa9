pub mod connection;
pub mod employees;
pub mod fixtures;
pub mod migrations;
pub mod staging;

pub use connection::{connect, connect_with_settings, DbPool};
pub use employees::{PersistenceError, SqlEmployeeStore};
pub use fixtures::{RosterFixtures, SeedOutcome, SeededEmployee, VerificationResult};
pub use staging::JsonFileStagingStore;
