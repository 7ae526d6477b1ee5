//! Service layer for likeflow.
//!
//! This module contains the toggle protocol separated from any UI concerns.
//! Services can be driven by the CLI, a web view, or tests.

pub mod like_toggle;
pub mod registry;

pub use like_toggle::LikeToggleController;
pub use registry::LikeRegistry;
