//! Editor session: the glue between input, camera, picking and the world.
//!
//! # Invariants
//! - Every world mutation is followed by an instance upload before the next pick.
//! - Camera momentum advances only in whole fixed-rate ticks.
//! - Clicks read the pick surface with flipped Y and decode here, never in the surface.

mod clock;
mod config;
mod session;

pub use clock::SimClock;
pub use config::{ConfigError, SessionConfig};
pub use session::EditorSession;
