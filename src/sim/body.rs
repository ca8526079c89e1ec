//! Kinematic bodies
//!
//! A body moves along a straight line under kinetic friction: its acceleration
//! always opposes its velocity, so it decelerates to rest and stays there.
//! Circles are the only mobile shape; lines are static infinite-mass walls.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::math::LineSeg;
use super::payload::PayloadHandle;
use crate::error::{Result, SimError};
use crate::{BodyId, Duration, perp};

/// How a body takes part in collision response
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Mass {
    /// Ordinary body with a positive mass
    Finite(f64),
    /// Never moved by collisions (walls)
    Immovable,
    /// Detected but never pushed or pushing (triggers)
    Intangible,
}

impl Mass {
    /// Map the raw convention (`NaN` intangible, `+inf` immovable)
    pub fn from_raw(mass: f64) -> Option<Self> {
        if mass.is_nan() {
            Some(Mass::Intangible)
        } else if mass == f64::INFINITY {
            Some(Mass::Immovable)
        } else if mass > 0.0 && mass.is_finite() {
            Some(Mass::Finite(mass))
        } else {
            None
        }
    }

    /// Raw value, using `NaN` and `+inf` for the special kinds
    pub fn to_raw(self) -> f64 {
        match self {
            Mass::Finite(m) => m,
            Mass::Immovable => f64::INFINITY,
            Mass::Intangible => f64::NAN,
        }
    }
}

/// Concrete body geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Disc centred on the body position
    Circle { radius: f64 },
    /// Segment from the body position to `end`
    Line { end: DVec2 },
}

/// A simulated entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    /// Optional caller data, shared by every copy of this body
    pub payload: Option<PayloadHandle>,
    pub shape: Shape,
    pos: DVec2,
    vel: DVec2,
    /// Inverse friction: seconds of glide per unit of speed. Zero is frictionless.
    friction: f64,
    mass: Mass,
    stopped: bool,
}

impl Body {
    /// Create a circle at rest
    ///
    /// `friction` is inverse friction (`0` or `+inf` for frictionless), and
    /// `mass` follows the raw convention of [`Mass::from_raw`].
    pub fn circle(id: BodyId, pos: DVec2, radius: f64, friction: f64, mass: f64) -> Result<Self> {
        if !(radius >= 0.0 && radius.is_finite()) {
            return Err(SimError::invalid_body(id, format!("radius {radius} out of range")));
        }
        Self::build(id, pos, Shape::Circle { radius }, friction, mass)
    }

    /// Create a static wall segment
    pub fn line(id: BodyId, start: DVec2, end: DVec2) -> Result<Self> {
        if !end.is_finite() {
            return Err(SimError::invalid_body(id, "line end is not finite"));
        }
        Self::build(id, start, Shape::Line { end }, 0.0, f64::INFINITY)
    }

    fn build(id: BodyId, pos: DVec2, shape: Shape, friction: f64, mass: f64) -> Result<Self> {
        if !pos.is_finite() {
            return Err(SimError::invalid_body(id, "position is not finite"));
        }
        if friction.is_nan() || friction < 0.0 {
            return Err(SimError::invalid_body(id, format!("friction {friction} out of range")));
        }
        let mass = Mass::from_raw(mass)
            .ok_or_else(|| SimError::invalid_body(id, format!("mass {mass} out of range")))?;
        Ok(Self {
            id,
            payload: None,
            shape,
            pos,
            vel: DVec2::ZERO,
            friction: if friction.is_finite() { friction } else { 0.0 },
            mass,
            stopped: true,
        })
    }

    /// Attach a payload handle
    pub fn with_payload(mut self, payload: PayloadHandle) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Start the body moving (lines ignore this)
    pub fn with_velocity(mut self, vel: DVec2) -> Self {
        if self.is_circle() {
            self.set_velocity(vel);
        }
        self
    }

    /// Centre of a circle, or the start of a line
    #[inline]
    pub fn position(&self) -> DVec2 {
        self.pos
    }

    #[inline]
    pub fn velocity(&self) -> DVec2 {
        self.vel
    }

    #[inline]
    pub fn friction(&self) -> f64 {
        self.friction
    }

    #[inline]
    pub fn mass(&self) -> Mass {
        self.mass
    }

    pub fn set_mass(&mut self, mass: Mass) {
        self.mass = mass;
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_tangible(&self) -> bool {
        self.mass != Mass::Intangible
    }

    pub fn is_immovable(&self) -> bool {
        self.mass == Mass::Immovable
    }

    pub fn is_circle(&self) -> bool {
        matches!(self.shape, Shape::Circle { .. })
    }

    /// True when the body will change position over time
    pub fn is_moving(&self) -> bool {
        !self.stopped && self.vel != DVec2::ZERO
    }

    /// Radius for circles, zero for lines
    pub fn radius(&self) -> f64 {
        match self.shape {
            Shape::Circle { radius } => radius,
            Shape::Line { .. } => 0.0,
        }
    }

    /// Segment covered by a line body
    pub fn line_seg(&self) -> Option<LineSeg> {
        match self.shape {
            Shape::Line { end } => Some(LineSeg::new(self.pos, end)),
            Shape::Circle { .. } => None,
        }
    }

    /// Unit normal of a line, on the left of the start-to-end direction
    pub fn normal(&self) -> Option<DVec2> {
        self.line_seg().map(|l| perp(l.delta()).normalize_or_zero())
    }

    /// Magnitude of the friction deceleration
    pub fn deceleration(&self) -> f64 {
        if self.friction > 0.0 {
            1.0 / self.friction
        } else {
            0.0
        }
    }

    /// Current acceleration, always opposing the velocity
    pub fn acceleration(&self) -> DVec2 {
        -self.vel.normalize_or_zero() * self.deceleration()
    }

    /// Time until friction brings the body to rest
    pub fn time_until_stop(&self) -> Option<Duration> {
        let decel = self.deceleration();
        if !self.is_moving() || decel == 0.0 {
            return None;
        }
        Some(self.vel.length() / decel)
    }

    /// Projection horizon: friction never reverses the motion
    fn clamp_duration(&self, d: Duration) -> Duration {
        match self.time_until_stop() {
            Some(stop) => d.min(stop),
            None => d,
        }
    }

    pub fn position_after(&self, d: Duration) -> DVec2 {
        if !self.is_moving() {
            return self.pos;
        }
        let d = self.clamp_duration(d);
        self.pos + self.vel * d + self.acceleration() * (d * d / 2.0)
    }

    pub fn velocity_after(&self, d: Duration) -> DVec2 {
        if !self.is_moving() {
            return self.vel;
        }
        match self.time_until_stop() {
            Some(stop) if d >= stop => DVec2::ZERO,
            _ => self.vel + self.acceleration() * d,
        }
    }

    /// Copy of this body projected forward by `d`
    pub fn copy_after(&self, d: Duration) -> Self {
        let mut copy = self.clone();
        if self.is_circle() {
            copy.pos = self.position_after(d);
            copy.vel = self.velocity_after(d);
        }
        copy
    }

    /// Accumulate a velocity change; the body is no longer stopped
    pub fn add_velocity(&mut self, delta: DVec2) {
        self.vel += delta;
        self.stopped = false;
    }

    pub fn set_velocity(&mut self, vel: DVec2) {
        self.vel = vel;
        self.stopped = vel == DVec2::ZERO;
    }

    pub fn stop(&mut self) {
        self.vel = DVec2::ZERO;
        self.stopped = true;
    }

    /// Whether the body overlaps `p` after `d`, assuming no new impulses
    pub fn is_touching_point_at(&self, d: Duration, p: DVec2) -> bool {
        match self.shape {
            Shape::Circle { radius } => (p - self.position_after(d)).length_squared() < radius * radius,
            Shape::Line { .. } => false,
        }
    }

    /// Linear momentum, zero unless the mass is finite
    pub fn momentum(&self) -> DVec2 {
        match self.mass {
            Mass::Finite(m) => self.vel * m,
            _ => DVec2::ZERO,
        }
    }

    /// Kinetic energy, zero unless the mass is finite
    pub fn kinetic_energy(&self) -> f64 {
        match self.mass {
            Mass::Finite(m) => 0.5 * m * self.vel.length_squared(),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moving(vel: DVec2, friction: f64) -> Body {
        Body::circle(1, DVec2::ZERO, 1.0, friction, 1.0)
            .unwrap()
            .with_velocity(vel)
    }

    #[test]
    fn test_new_body_is_stopped() {
        let b = Body::circle(1, DVec2::new(3.0, 4.0), 1.0, 0.0, 1.0).unwrap();
        assert!(b.is_stopped());
        assert_eq!(b.velocity(), DVec2::ZERO);
        assert_eq!(b.acceleration(), DVec2::ZERO);
        assert_eq!(b.position_after(10.0), DVec2::new(3.0, 4.0));
    }

    #[test]
    fn test_mass_conventions() {
        assert_eq!(Mass::from_raw(f64::NAN), Some(Mass::Intangible));
        assert_eq!(Mass::from_raw(f64::INFINITY), Some(Mass::Immovable));
        assert_eq!(Mass::from_raw(2.0), Some(Mass::Finite(2.0)));
        assert_eq!(Mass::from_raw(0.0), None);
        assert_eq!(Mass::from_raw(f64::NEG_INFINITY), None);

        let trigger = Body::circle(2, DVec2::ZERO, 1.0, 0.0, f64::NAN).unwrap();
        assert!(!trigger.is_tangible());
        assert!(trigger.mass().to_raw().is_nan());
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(Body::circle(1, DVec2::ZERO, -1.0, 0.0, 1.0).is_err());
        assert!(Body::circle(1, DVec2::ZERO, 1.0, -0.5, 1.0).is_err());
        assert!(Body::circle(1, DVec2::ZERO, 1.0, f64::NAN, 1.0).is_err());
        assert!(Body::circle(1, DVec2::new(f64::NAN, 0.0), 1.0, 0.0, 1.0).is_err());
        assert!(Body::circle(1, DVec2::ZERO, 1.0, 0.0, -3.0).is_err());
    }

    #[test]
    fn test_frictionless_motion_is_linear() {
        let b = moving(DVec2::new(2.0, -1.0), 0.0);
        assert_eq!(b.time_until_stop(), None);
        assert_eq!(b.position_after(3.0), DVec2::new(6.0, -3.0));
        assert_eq!(b.velocity_after(3.0), DVec2::new(2.0, -1.0));

        // Infinite inverse friction is frictionless too
        let b = moving(DVec2::new(1.0, 0.0), f64::INFINITY);
        assert_eq!(b.deceleration(), 0.0);
    }

    #[test]
    fn test_friction_stop_time() {
        // Speed 5, inverse friction 0.4: decelerates at 2.5, stops after 2.0
        let b = moving(DVec2::new(3.0, 4.0), 0.4);
        let stop = b.time_until_stop().unwrap();
        assert!((stop - 5.0 * 0.4).abs() < 1e-12);
        assert!((b.acceleration().length() - 2.5).abs() < 1e-12);
        assert!(b.acceleration().dot(b.velocity()) < 0.0);
    }

    #[test]
    fn test_projection_clamps_at_rest() {
        // Speed 2, decel 1: stops after 2 having travelled 2
        let b = moving(DVec2::new(2.0, 0.0), 1.0);
        let at_rest = b.position_after(2.0);
        assert!((at_rest - DVec2::new(2.0, 0.0)).length() < 1e-12);
        assert_eq!(b.position_after(50.0), at_rest);
        assert_eq!(b.velocity_after(2.0), DVec2::ZERO);
        assert!((b.velocity_after(1.0) - DVec2::new(1.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_stop_and_add_velocity_flags() {
        let mut b = moving(DVec2::new(1.0, 0.0), 0.0);
        assert!(!b.is_stopped());
        b.stop();
        assert!(b.is_stopped());
        assert_eq!(b.velocity(), DVec2::ZERO);
        b.add_velocity(DVec2::new(0.0, 2.0));
        assert!(!b.is_stopped());
        assert_eq!(b.velocity(), DVec2::new(0.0, 2.0));
    }

    #[test]
    fn test_line_is_static() {
        let l = Body::line(9, DVec2::new(0.0, -5.0), DVec2::new(0.0, 5.0))
            .unwrap()
            .with_velocity(DVec2::new(1.0, 0.0));
        assert!(l.is_stopped());
        assert!(l.is_immovable());
        assert_eq!(l.copy_after(4.0), l);
        // Left of "up" is -x
        assert_eq!(l.normal(), Some(DVec2::new(-1.0, 0.0)));
        assert!(!l.is_touching_point_at(0.0, DVec2::ZERO));
    }

    #[test]
    fn test_copy_after_keeps_identity() {
        let mut arena = super::super::payload::PayloadArena::new();
        let b = moving(DVec2::new(1.0, 1.0), 0.0).with_payload(arena.insert("tag"));
        let c = b.copy_after(2.0);
        assert_eq!(c.id, b.id);
        assert_eq!(c.payload, b.payload);
        assert_eq!(c.position(), DVec2::new(2.0, 2.0));
        assert!(c.is_touching_point_at(0.0, DVec2::new(2.5, 2.0)));
    }
}
