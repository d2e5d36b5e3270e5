//! Integration test utilities for the file vault
//!
//! This crate provides a scripted messaging platform, configuration
//! presets, and a test server for end-to-end tests.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
