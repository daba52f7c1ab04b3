//! Campaign lifecycle — which statuses may follow which, who may drive
//! each transition, and when an approved campaign is actually served.

pub mod state_machine;

pub use state_machine::{can_transition, eligible, transition, validate};
