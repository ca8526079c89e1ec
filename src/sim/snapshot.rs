//! Point-in-time world state
//!
//! A snapshot maps body ids to independent body copies. Iteration is ordered
//! by id, which fixes the pairwise scan order of the scheduler.

use std::collections::BTreeMap;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::body::Body;
use crate::error::{Result, SimError};
use crate::{BodyId, Duration};

/// Complete state of every body at one instant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    bodies: BTreeMap<BodyId, Body>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot, rejecting duplicate ids
    pub fn from_bodies(bodies: impl IntoIterator<Item = Body>) -> Result<Self> {
        let mut snapshot = Self::new();
        for body in bodies {
            let id = body.id;
            if snapshot.insert(body).is_some() {
                return Err(SimError::invalid_body(id, "duplicate body id"));
            }
        }
        Ok(snapshot)
    }

    /// Insert or replace a body, returning the previous copy
    pub fn insert(&mut self, body: Body) -> Option<Body> {
        self.bodies.insert(body.id, body)
    }

    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(&id)
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Bodies in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &Body> {
        self.bodies.values()
    }

    pub fn for_each(&self, mut f: impl FnMut(&Body)) {
        self.bodies.values().for_each(|b| f(b));
    }

    /// Replace this snapshot's contents with `prev` projected forward by `d`
    pub fn fill_from_previous(&mut self, prev: &Snapshot, d: Duration) {
        self.bodies = prev
            .bodies
            .iter()
            .map(|(&id, body)| (id, body.copy_after(d)))
            .collect();
    }

    /// New snapshot with every body projected forward by `d`
    pub fn after(&self, d: Duration) -> Snapshot {
        let mut next = Snapshot::new();
        next.fill_from_previous(self, d);
        next
    }

    /// Total momentum of finite-mass bodies
    pub fn momentum(&self) -> DVec2 {
        self.iter().map(Body::momentum).sum()
    }

    /// Total kinetic energy of finite-mass bodies
    pub fn kinetic_energy(&self) -> f64 {
        self.iter().map(Body::kinetic_energy).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(id: BodyId, x: f64, vx: f64) -> Body {
        Body::circle(id, DVec2::new(x, 0.0), 0.5, 0.0, 2.0)
            .unwrap()
            .with_velocity(DVec2::new(vx, 0.0))
    }

    #[test]
    fn test_iterates_by_id() {
        let ss = Snapshot::from_bodies([ball(7, 0.0, 0.0), ball(2, 1.0, 0.0), ball(5, 2.0, 0.0)]).unwrap();
        let ids: Vec<_> = ss.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![2, 5, 7]);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        assert!(Snapshot::from_bodies([ball(1, 0.0, 0.0), ball(1, 3.0, 0.0)]).is_err());
    }

    #[test]
    fn test_after_projects_every_body_independently() {
        let ss = Snapshot::from_bodies([ball(1, 0.0, 1.0), ball(2, 10.0, -2.0)]).unwrap();
        let later = ss.after(2.0);
        assert_eq!(later.get(1).unwrap().position(), DVec2::new(2.0, 0.0));
        assert_eq!(later.get(2).unwrap().position(), DVec2::new(6.0, 0.0));
        // Source snapshot untouched
        assert_eq!(ss.get(1).unwrap().position(), DVec2::ZERO);
    }

    #[test]
    fn test_mutating_copy_leaves_source() {
        let ss = Snapshot::from_bodies([ball(1, 0.0, 1.0)]).unwrap();
        let mut later = ss.after(1.0);
        later.get_mut(1).unwrap().stop();
        assert!(later.get(1).unwrap().is_stopped());
        assert!(!ss.get(1).unwrap().is_stopped());
    }

    #[test]
    fn test_totals() {
        let ss = Snapshot::from_bodies([ball(1, 0.0, 1.0), ball(2, 10.0, -2.0)]).unwrap();
        assert_eq!(ss.momentum(), DVec2::new(-2.0, 0.0));
        assert_eq!(ss.kinetic_energy(), 1.0 + 4.0);
        let mut count = 0;
        ss.for_each(|_| count += 1);
        assert_eq!(count, 2);
    }
}
