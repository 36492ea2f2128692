//! Heuristics module for delivery routes.
//!
//! This module exports the construction and improvement heuristics.

pub mod construction;
pub mod local_search;

pub use construction::*;
pub use local_search::*;
