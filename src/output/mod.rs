//! Output module for reporting on stored listings
//!
//! This module handles:
//! - Loading price aggregates and pipeline progress from storage
//! - Printing them to the terminal

pub mod stats;

pub use stats::{load_statistics, print_statistics, ListingStatistics};
