//! Reward-yield engine that ranks credit cards by net annual savings for a spend profile.

pub mod advisory;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod format;
pub mod ranking;
pub mod recommendation;
pub mod telemetry;
pub mod usage;
