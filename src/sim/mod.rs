//! Deterministic simulation module
//!
//! Everything here is pure and deterministic:
//! - Event-driven, no fixed timestep: time jumps from one transition to the next
//! - Seeded RNG only, in scenario builders
//! - Stable iteration order (by body ID)
//! - No rendering or platform dependencies

pub mod action;
pub mod body;
pub mod collision;
pub mod math;
pub mod payload;
pub mod poly;
pub mod scenario;
pub mod snapshot;
pub mod system;

pub use action::{Action, Transition};
pub use body::{Body, Mass, Shape};
pub use collision::earliest;
pub use math::LineSeg;
pub use payload::{PayloadArena, PayloadHandle};
pub use snapshot::Snapshot;
pub use system::System;
