//! Continuous collision detection and elastic response
//!
//! Contact times are solved exactly: positions are quadratic in `t`, so the
//! squared distance between two bodies is a quartic whose earliest valid root
//! is the moment of contact. Detection is always initiated by a circle; a line
//! never looks for collisions on its own.

use glam::DVec2;

use super::body::{Body, Mass, Shape};
use super::math::{LineSeg, line_segs_distance_squared, point_line_seg_distance_squared};
use super::poly::{solve_quadratic, solve_quartic};
use crate::Duration;

/// Keep a contact time only if it falls inside the search horizon
#[inline]
fn within(t: Duration, maxtime: Option<Duration>) -> Option<Duration> {
    match maxtime {
        Some(max) if t > max => None,
        _ => Some(t),
    }
}

/// Earliest of two optional event times
#[inline]
pub fn earliest(a: Option<Duration>, b: Option<Duration>) -> Option<Duration> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Time at which a point moving as `rel_pos + rel_vel t + rel_acc t^2 / 2`
/// first reaches distance `reach` from the origin.
///
/// Expanding the squared distance gives the quartic
/// `|a|^2/4 t^4 + (v.a) t^3 + (|v|^2 + p.a) t^2 + 2 (p.v) t + |p|^2 - reach^2`.
fn relative_contact_time(
    rel_pos: DVec2,
    rel_vel: DVec2,
    rel_acc: DVec2,
    reach: f64,
    only_inward: bool,
) -> Option<Duration> {
    let a = rel_acc.length_squared() / 4.0;
    let b = rel_vel.dot(rel_acc);
    let c = rel_vel.length_squared() + rel_pos.dot(rel_acc);
    let d = 2.0 * rel_pos.dot(rel_vel);
    let e = rel_pos.length_squared() - reach * reach;
    solve_quartic(a, b, c, d, e, only_inward)
}

/// Swept path of a body over a finite horizon
fn swept_path(body: &Body, maxtime: Option<Duration>) -> Option<LineSeg> {
    maxtime
        .filter(|t| t.is_finite())
        .map(|t| LineSeg::new(body.position(), body.position_after(t)))
}

impl Body {
    /// Time until this body touches `other`, if it does so within `maxtime`
    ///
    /// Assumes neither body receives another impulse. Only circles detect
    /// collisions; a line initiator always returns `None`.
    pub fn time_until_collide(&self, other: &Body, maxtime: Option<Duration>) -> Option<Duration> {
        self.contact_time(other, maxtime, true)
    }

    /// As [`Body::time_until_collide`], optionally skipping the sweep rejection test
    pub fn contact_time(
        &self,
        other: &Body,
        maxtime: Option<Duration>,
        sweep_rejection: bool,
    ) -> Option<Duration> {
        match (self.shape, other.shape) {
            (Shape::Circle { .. }, Shape::Circle { .. }) => {
                self.circle_contact(other, maxtime, sweep_rejection)
            }
            (Shape::Circle { .. }, Shape::Line { end }) => {
                let seg = LineSeg::new(other.position(), end);
                self.line_contact(other, seg, maxtime, sweep_rejection)
            }
            (Shape::Line { .. }, _) => None,
        }
    }

    fn circle_contact(
        &self,
        other: &Body,
        maxtime: Option<Duration>,
        sweep_rejection: bool,
    ) -> Option<Duration> {
        let reach = self.radius() + other.radius();
        if sweep_rejection {
            if let (Some(mine), Some(theirs)) = (swept_path(self, maxtime), swept_path(other, maxtime)) {
                if line_segs_distance_squared(&mine, &theirs) > reach * reach {
                    return None;
                }
            }
        }

        let t = relative_contact_time(
            other.position() - self.position(),
            other.velocity() - self.velocity(),
            other.acceleration() - self.acceleration(),
            reach,
            other.is_tangible(),
        )?;
        within(t, maxtime)
    }

    fn line_contact(
        &self,
        line: &Body,
        seg: LineSeg,
        maxtime: Option<Duration>,
        sweep_rejection: bool,
    ) -> Option<Duration> {
        let radius = self.radius();
        if sweep_rejection {
            if let Some(path) = swept_path(self, maxtime) {
                if line_segs_distance_squared(&path, &seg) > radius * radius {
                    return None;
                }
            }
        }
        if seg.is_degenerate() {
            return self.point_contact(seg.a, line.is_tangible(), maxtime, sweep_rejection);
        }

        let normal = line.normal().unwrap_or(DVec2::ZERO);
        let normal_dist = (self.position() - seg.a).dot(normal);
        if normal_dist.abs() > radius {
            // Distance from the infinite line, measured on our side, minus the radius
            let side = normal_dist.signum();
            let normal_vel = self.velocity().dot(normal) * side;
            let normal_acc = self.acceleration().dot(normal) * side;
            let face = solve_quadratic(
                normal_acc / 2.0,
                normal_vel,
                normal_dist.abs() - radius,
                line.is_tangible(),
            )
            .and_then(|t| within(t, maxtime));

            if let Some(t) = face {
                if projects_inside(self.position_after(t), &seg) {
                    return Some(t);
                }
            }
        }

        // Touching the infinite line outside the segment: only the tips can be hit
        earliest(
            self.point_contact(seg.a, line.is_tangible(), maxtime, sweep_rejection),
            self.point_contact(seg.b, line.is_tangible(), maxtime, sweep_rejection),
        )
    }

    /// Time until this circle's rim reaches a fixed point
    pub fn time_until_touch_point(&self, point: DVec2, maxtime: Option<Duration>) -> Option<Duration> {
        self.point_contact(point, true, maxtime, true)
    }

    fn point_contact(
        &self,
        point: DVec2,
        only_inward: bool,
        maxtime: Option<Duration>,
        sweep_rejection: bool,
    ) -> Option<Duration> {
        let radius = self.radius();
        if sweep_rejection {
            if let Some(path) = swept_path(self, maxtime) {
                if point_line_seg_distance_squared(point, &path) > radius * radius {
                    return None;
                }
            }
        }
        let t = relative_contact_time(
            point - self.position(),
            -self.velocity(),
            -self.acceleration(),
            radius,
            only_inward,
        )?;
        within(t, maxtime)
    }

    /// Unit axis along which a collision with `other` is resolved
    ///
    /// Circle against circle: from this centre to the other centre. Circle
    /// against line: the line normal when the centre projects onto the segment,
    /// otherwise towards the nearest tip.
    pub fn collision_dir(&self, other: &Body) -> Option<DVec2> {
        match (self.shape, other.shape) {
            (Shape::Circle { .. }, Shape::Circle { .. }) => {
                Some((other.position() - self.position()).normalize_or_zero())
            }
            (Shape::Circle { .. }, Shape::Line { end }) => {
                let seg = LineSeg::new(other.position(), end);
                if !seg.is_degenerate() && projects_inside(self.position(), &seg) {
                    other.normal()
                } else {
                    let tip = if (self.position() - seg.a).dot(seg.delta()) < 0.0 { seg.a } else { seg.b };
                    Some((tip - self.position()).normalize_or_zero())
                }
            }
            (Shape::Line { .. }, _) => None,
        }
    }

    /// Resolve an instantaneous elastic collision with `other`
    ///
    /// Only the velocity components along the collision axis change. Contacts
    /// involving an intangible body are detected but leave both bodies alone.
    pub fn apply_collision(&mut self, other: &mut Body) {
        let Some(dir) = self.collision_dir(other) else {
            return;
        };
        let avi = self.velocity().dot(dir);
        let bvi = other.velocity().dot(dir);

        match (self.mass(), other.mass()) {
            (Mass::Intangible, _) | (_, Mass::Intangible) => {
                log::debug!("body {} touched intangible body {}", self.id, other.id);
            }
            (_, Mass::Immovable) => {
                // Reflect off the other body's frame; a static wall gives v -= 2 avi dir
                self.add_velocity(dir * (2.0 * (bvi - avi)));
            }
            (Mass::Immovable, Mass::Finite(_)) => {
                other.add_velocity(dir * (2.0 * (avi - bvi)));
            }
            (Mass::Finite(ma), Mass::Finite(mb)) => {
                let diff = ma - mb;
                let total = ma + mb;
                let avo = (avi * diff + 2.0 * mb * bvi) / total;
                let bvo = (-bvi * diff + 2.0 * ma * avi) / total;
                self.add_velocity(dir * (avo - avi));
                other.add_velocity(dir * (bvo - bvi));
            }
        }
    }

    /// Resolve a collision against a fixture, which is never moved itself
    pub fn apply_fixture_collision(&mut self, fixture: &Body) {
        let mut scratch = fixture.clone();
        if scratch.is_tangible() {
            scratch.set_mass(Mass::Immovable);
        }
        self.apply_collision(&mut scratch);
    }
}

/// Sign-change test: does `p` project between the segment's endpoints?
fn projects_inside(p: DVec2, seg: &LineSeg) -> bool {
    let dir = seg.delta();
    let d1 = (p - seg.a).dot(dir);
    let d2 = (p - seg.b).dot(dir);
    d1.is_sign_negative() != d2.is_sign_negative()
}
