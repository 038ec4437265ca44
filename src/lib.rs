//! LearnCart - Commerce and Learning Platform Backend
//!
//! This crate implements the payment-confirmation and entitlement-
//! reconciliation workflow: verifying gateway references, granting course
//! enrollments and product purchases exactly once, and recording auditable
//! orders.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
