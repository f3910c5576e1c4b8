//! Domain models for resman.
//!
//! These are the core types shared across all crates. Identifiers are
//! store-assigned 64-bit integers; ascending id equals creation order.

pub mod participant;
pub mod project;
pub mod resource;
pub mod section;
pub mod team;
pub mod user;
