//! Test Fixtures Module
//!
//! - Audio fixtures (programmatically generated PCM)
//! - Voice, segment and duration-model fixtures

// Allow dead code in test fixtures - not every test binary uses every helper
#![allow(dead_code)]

pub mod audio_fixtures;
pub mod segment_fixtures;

pub use audio_fixtures::*;
pub use segment_fixtures::*;
