//! Utility functions and helpers for the fitfunc-rs library.

pub mod finite_difference;
pub mod parallel;
