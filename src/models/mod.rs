//! Data types shared across the crate.

mod like_state;

pub use like_state::{ContentId, LikeEvent, LikeState, TogglePhase};
