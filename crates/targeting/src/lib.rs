//! Targeting matcher — decides whether a campaign's audience rule admits
//! a viewing user. Pure functions only; no I/O, no mutable state.

pub mod matcher;

pub use matcher::matches;
