//! Work out which earlier jobs a new array job has to wait for
//!
//! Holds can be requested for every job in the history (`--hold`), for explicit job ids
//! (`--hold_jids`) or for jobs whose run directory matches a regular expression (`--hold_names`).

/// Regular expressions matched against historical job names
pub mod pattern;
/// Combine hold strategies into a dependency list
pub mod resolve;
