//! Shared test utilities for evidence-queue integration tests.
//!
//! This module provides:
//! - `QueueHarness` wiring a store, diagnostic log and scheduler together
//! - `ScriptedAnalyzer`, an analyzer whose behavior is fixed per call
//! - Builders for uploaded files, tasks and scheduler settings

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{QueueHarness, ScriptedAnalyzer};
