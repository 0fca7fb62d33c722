//! Loan application intake for purchasing a phone on credit.
//!
//! The `intake` module holds the domain rules (ID validation, age, affordability, loan math)
//! and the HTTP surface; `config`, `telemetry`, and `error` carry the service plumbing.

pub mod config;
pub mod error;
pub mod intake;
pub mod telemetry;
