//! Cross-layer integration tests for keel
//!
//! Tests that drive the registry the way a game loop does.

mod context;
