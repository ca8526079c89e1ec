//! Rewind Sim - A deterministic 2D rigid-body core
//!
//! Core modules:
//! - `sim`: Continuous collision detection, snapshots and the rewindable timeline
//! - `settings`: Data-driven simulation tuning
//! - `error`: Error taxonomy for the public API

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{Result, SimError};
pub use settings::SimConfig;

use glam::DVec2;

/// Elapsed time between two instants, in seconds
pub type Duration = f64;
/// Seconds since the simulation origin
pub type Timestamp = f64;
/// Caller-assigned body identity, unique within a run
pub type BodyId = u32;

/// Simulation configuration constants
pub mod consts {
    /// Default cap on snapshots materialized by a single advance
    pub const MAX_TRANSITIONS_PER_ADVANCE: usize = 100_000;
    /// Default tie tolerance (exact equality)
    pub const TIE_TOLERANCE: f64 = 0.0;
    /// Bisection iteration cap for polynomial root isolation
    pub const MAX_BISECTION_STEPS: u32 = 256;
}

/// Perpendicular of a vector (rotated +90 degrees)
#[inline]
pub fn perp(v: DVec2) -> DVec2 {
    DVec2::new(-v.y, v.x)
}
