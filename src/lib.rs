//! likeflow: optimistic like toggling for portfolio sites.
//!
//! A [`LikeToggleController`] applies a predicted like/unlike immediately,
//! confirms it with one `POST /toggle_like/{id}`, and then adopts the
//! server's values or rolls back exactly.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod transport;

pub use error::{RegistryError, ToggleError};
pub use models::{ContentId, LikeEvent, LikeState, TogglePhase};
pub use services::{LikeRegistry, LikeToggleController};
pub use transport::{HttpLikeTransport, LikeTransport, ToggleOutcome};
