//! Data and transaction layer of the Octopus Network appchain dashboard.
//!
//! Reads appchain, validator and reward state from the dashboard REST API,
//! the NEAR explorer index and anchor contracts; aggregates it per account;
//! and assembles the wallet payloads for staking, delegation and reward calls.

pub mod config;
pub mod contract_calls;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod views;

pub use error::{DashboardError, ErrorKind, FetchFailure};
pub use utils::TokenAmount;
