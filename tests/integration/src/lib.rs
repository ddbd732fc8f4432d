//! Integration test utilities for the reaction store
//!
//! This crate provides harnesses for running scenario tests against the
//! in-memory engine, a fault-injecting engine wrapper, and helpers for the
//! PostgreSQL-backed tests.


pub use fixtures::*;
pub use helpers::*;
