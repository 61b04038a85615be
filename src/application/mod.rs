//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain logic and manages the runtime
//! behavior:
//! - Policy table (scope to rule resolution, validated at startup)
//! - Quota ledger (admission decisions over stored counters)
//! - Idle sweeper (counter reclamation)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod ledger;
pub mod metrics;
pub mod ports;
pub mod sweeper;
pub mod table;
