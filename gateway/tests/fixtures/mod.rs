//! Test Fixtures Module
//!
//! This module provides test fixtures for gateway testing:
//! - Audio fixtures (programmatically generated)
//! - A deterministic mock engine
//! - A router wired to a temporary voice-config directory

// Allow dead code in test fixtures - not every test binary uses every helper
#![allow(dead_code)]

pub mod audio_fixtures;
pub mod mock_engine;
pub mod test_app;

pub use audio_fixtures::*;
pub use mock_engine::*;
pub use test_app::*;
