//! Seeded scenario builders
//!
//! Every builder is a pure function of its arguments: the same seed always
//! yields the same bodies, ids and velocities.

use std::f64::consts::TAU;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::body::Body;
use super::snapshot::Snapshot;
use crate::error::{Result, SimError};
use crate::BodyId;

/// Fixture ids start here so they never clash with body ids
pub const FIXTURE_ID_BASE: BodyId = 1000;

/// Radius of every scattered ball
pub const BALL_RADIUS: f64 = 0.5;

/// Centre-to-centre spacing of the placement grid
const GRID_SPACING: f64 = 3.0;

/// Largest random offset from a grid cell centre, per axis
const GRID_JITTER: f64 = 0.5;

/// Inverse friction of scattered balls
const BALL_FRICTION: f64 = 0.5;

/// Two unit circles approaching head on; they touch at t=4
pub fn head_on() -> Result<(Snapshot, Snapshot)> {
    let a = Body::circle(1, DVec2::new(0.0, 0.0), 1.0, 0.0, 1.0)?.with_velocity(DVec2::new(1.0, 0.0));
    let b = Body::circle(2, DVec2::new(10.0, 0.0), 1.0, 0.0, 1.0)?.with_velocity(DVec2::new(-1.0, 0.0));
    Ok((Snapshot::from_bodies([a, b])?, Snapshot::new()))
}

/// Four walls enclosing a `width` x `height` box centred on the origin
///
/// Walls overrun the corners by one ball diameter so a ball in a corner
/// always meets a wall face, never a wall tip.
pub fn box_walls(width: f64, height: f64) -> Result<Snapshot> {
    if !(width > 0.0 && height > 0.0) {
        return Err(SimError::config(format!("box {}x{} has no interior", width, height)));
    }
    let (hw, hh) = (width / 2.0, height / 2.0);
    let over = 4.0 * BALL_RADIUS;
    let corners = [
        (DVec2::new(-hw - over, -hh), DVec2::new(hw + over, -hh)),
        (DVec2::new(hw, -hh - over), DVec2::new(hw, hh + over)),
        (DVec2::new(hw + over, hh), DVec2::new(-hw - over, hh)),
        (DVec2::new(-hw, hh + over), DVec2::new(-hw, -hh - over)),
    ];
    let walls = corners
        .into_iter()
        .zip(FIXTURE_ID_BASE..)
        .map(|((a, b), id)| Body::line(id, a, b))
        .collect::<Result<Vec<_>>>()?;
    Snapshot::from_bodies(walls)
}

/// Grid positions for `count` balls around `centre`, jittered so no two touch
fn scatter(rng: &mut Pcg32, count: usize, centre: DVec2) -> Vec<DVec2> {
    let cols = (count as f64).sqrt().ceil().max(1.0) as usize;
    let offset = (cols - 1) as f64 * GRID_SPACING / 2.0;
    (0..count)
        .map(|i| {
            let cell = DVec2::new((i % cols) as f64, (i / cols) as f64) * GRID_SPACING - offset;
            let jitter = DVec2::new(
                rng.random_range(-GRID_JITTER..GRID_JITTER),
                rng.random_range(-GRID_JITTER..GRID_JITTER),
            );
            centre + cell + jitter
        })
        .collect()
}

/// Half the side of the square a scattered grid of `count` balls occupies
fn scatter_extent(count: usize) -> f64 {
    let cols = (count as f64).sqrt().ceil().max(1.0);
    (cols - 1.0) * GRID_SPACING / 2.0 + GRID_JITTER + BALL_RADIUS
}

/// `count` balls moving in random directions inside a walled box
pub fn walled_box(seed: u64, count: usize, width: f64, height: f64) -> Result<(Snapshot, Snapshot)> {
    let extent = scatter_extent(count);
    if 2.0 * extent >= width.min(height) {
        return Err(SimError::config(format!(
            "{} balls do not fit in a {}x{} box",
            count, width, height
        )));
    }
    let walls = box_walls(width, height)?;

    let mut rng = Pcg32::seed_from_u64(seed);
    let positions = scatter(&mut rng, count, DVec2::ZERO);
    let mut bodies = Vec::with_capacity(count);
    for (id, pos) in (1..).zip(positions) {
        let heading = DVec2::from_angle(rng.random_range(0.0..TAU));
        let speed = rng.random_range(1.0..4.0);
        bodies.push(Body::circle(id, pos, BALL_RADIUS, BALL_FRICTION, 1.0)?.with_velocity(heading * speed));
    }
    log::debug!("walled_box seed={} count={}", seed, count);
    Ok((Snapshot::from_bodies(bodies)?, walls))
}

/// A cue ball shot into a resting rack of `count` balls in a `size` square box
///
/// The cue ball has id 0; rack balls are numbered from 1.
pub fn random_break(seed: u64, count: usize, size: f64) -> Result<(Snapshot, Snapshot)> {
    let rack_centre = DVec2::new(size / 4.0, 0.0);
    if rack_centre.x + scatter_extent(count) >= size / 2.0 {
        return Err(SimError::config(format!(
            "a rack of {} balls does not fit in a {}x{} box",
            count, size, size
        )));
    }
    let walls = box_walls(size, size)?;

    let mut rng = Pcg32::seed_from_u64(seed);
    let mut bodies = Vec::with_capacity(count + 1);
    for (id, pos) in (1..).zip(scatter(&mut rng, count, rack_centre)) {
        bodies.push(Body::circle(id, pos, BALL_RADIUS, BALL_FRICTION, 1.0)?);
    }

    let cue_pos = DVec2::new(-size / 3.0, rng.random_range(-GRID_JITTER..GRID_JITTER));
    let aim = rack_centre + DVec2::new(0.0, rng.random_range(-GRID_SPACING..GRID_SPACING));
    let speed = rng.random_range(15.0..25.0);
    let cue = Body::circle(0, cue_pos, BALL_RADIUS, BALL_FRICTION, 1.0)?
        .with_velocity((aim - cue_pos).normalize_or_zero() * speed);
    bodies.push(cue);

    log::debug!("random_break seed={} count={} speed={:.3}", seed, count, speed);
    Ok((Snapshot::from_bodies(bodies)?, walls))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn min_gap(snapshot: &Snapshot) -> f64 {
        let bodies: Vec<_> = snapshot.iter().collect();
        let mut gap = f64::INFINITY;
        for (i, a) in bodies.iter().enumerate() {
            for b in &bodies[i + 1..] {
                gap = gap.min(a.position().distance(b.position()) - a.radius() - b.radius());
            }
        }
        gap
    }

    #[test]
    fn test_head_on() {
        let (bodies, fixtures) = head_on().unwrap();
        assert_eq!(bodies.len(), 2);
        assert!(fixtures.is_empty());
        let a = bodies.get(1).unwrap();
        let b = bodies.get(2).unwrap();
        assert_eq!(a.time_until_collide(b, None), Some(4.0));
    }

    #[test]
    fn test_box_walls_enclose_origin() {
        let walls = box_walls(10.0, 6.0).unwrap();
        assert_eq!(walls.len(), 4);
        assert!(walls.iter().all(|w| w.id >= FIXTURE_ID_BASE && !w.is_circle()));

        let ball = Body::circle(1, DVec2::ZERO, 1.0, 0.0, 1.0)
            .unwrap()
            .with_velocity(DVec2::new(0.0, -1.0));
        let hits: Vec<_> = walls.iter().filter_map(|w| ball.time_until_collide(w, None)).collect();
        assert_eq!(hits, vec![2.0]);
        assert!(box_walls(0.0, 5.0).is_err());
    }

    #[test]
    fn test_walled_box_is_seeded() {
        let (a, walls) = walled_box(42, 9, 20.0, 20.0).unwrap();
        let (b, _) = walled_box(42, 9, 20.0, 20.0).unwrap();
        let (c, _) = walled_box(43, 9, 20.0, 20.0).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 9);
        assert_eq!(walls.len(), 4);
        assert!(min_gap(&a) > 0.0);
        assert!(a.iter().all(|b| b.is_moving()));
    }

    #[test]
    fn test_random_break_layout() {
        let (bodies, walls) = random_break(7, 12, 30.0).unwrap();
        assert_eq!(bodies.len(), 13);
        assert_eq!(walls.len(), 4);
        assert!(min_gap(&bodies) > 0.0);
        let moving: Vec<_> = bodies.iter().filter(|b| b.is_moving()).map(|b| b.id).collect();
        assert_eq!(moving, vec![0]);
        assert!(bodies.iter().all(|b| b.position().abs().max_element() < 15.0));
    }

    #[test]
    fn test_overfull_box_rejected() {
        assert!(walled_box(1, 100, 10.0, 10.0).is_err());
        assert!(random_break(1, 100, 20.0).is_err());
    }
}
