//! Application command handlers.

pub mod payment;
