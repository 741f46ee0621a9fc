//! Shared steps and graph fixtures for the integration tests.
//!
//! Not every test binary uses every helper.
#![allow(dead_code)]

pub mod fixtures;
pub mod steps;

#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use steps::*;
