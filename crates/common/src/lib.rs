//! Shared types and the pick-buffer byte protocol.
//!
//! # Invariants
//! - The codec is the only place that knows the pick-buffer byte layout.
//! - Encoders and decoders here are exact inverses over their documented domains.

pub mod codec;
pub mod types;

pub use codec::{Face, PickHit, PickSample};
pub use types::{Colour, GridPos, HexColourError};
