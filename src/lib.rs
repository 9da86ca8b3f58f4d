//! Reactive-power compensator sizing and recommendation engine.

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod error;
pub mod extraction;
/// CSV invoice batches and result export.
pub mod io;
pub mod penalty;
pub mod recommend;
/// Required rating, margin bands and catalog rounding.
pub mod sizing;
pub mod types;

#[cfg(feature = "api")]
pub mod api;
