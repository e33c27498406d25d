//! Matching logic.

pub mod crossing;

pub use crossing::crosses;
