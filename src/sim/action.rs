//! Scheduled world changes
//!
//! Transitions and input events are plain values interpreted by
//! [`Action::apply`], so the transition log can be inspected and serialized.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::snapshot::Snapshot;
use crate::{BodyId, Duration, Timestamp};

/// One change applied to a freshly materialized snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Impulse: add to the body's velocity
    AddVelocity { body: BodyId, delta: DVec2 },
    /// Overwrite the body's velocity
    SetVelocity { body: BodyId, velocity: DVec2 },
    /// Friction brought the body to rest
    Stop { body: BodyId },
    /// Elastic collision between two timeline bodies
    Collide { body: BodyId, other: BodyId },
    /// Collision between a timeline body and a fixture
    CollideFixture { body: BodyId, fixture: BodyId },
}

impl Action {
    /// The timeline body this action acts on
    pub fn body(&self) -> BodyId {
        match *self {
            Action::AddVelocity { body, .. }
            | Action::SetVelocity { body, .. }
            | Action::Stop { body }
            | Action::Collide { body, .. }
            | Action::CollideFixture { body, .. } => body,
        }
    }

    /// Apply to `snapshot`; fixtures are read but never modified
    pub fn apply(&self, snapshot: &mut Snapshot, fixtures: &Snapshot) {
        let id = self.body();
        if !snapshot.contains(id) {
            log::warn!("{:?}: body {} not in snapshot, skipped", self, id);
            return;
        }

        match *self {
            Action::AddVelocity { body, delta } => {
                if let Some(b) = snapshot.get_mut(body) {
                    b.add_velocity(delta);
                }
            }
            Action::SetVelocity { body, velocity } => {
                if let Some(b) = snapshot.get_mut(body) {
                    b.set_velocity(velocity);
                }
            }
            Action::Stop { body } => {
                if let Some(b) = snapshot.get_mut(body) {
                    b.stop();
                }
            }
            Action::Collide { body, other } => {
                if body == other {
                    log::warn!("body {} scheduled to collide with itself", body);
                    return;
                }
                let Some(mut partner) = snapshot.get(other).cloned() else {
                    log::warn!("collision partner {} not in snapshot, skipped", other);
                    return;
                };
                if let Some(b) = snapshot.get_mut(body) {
                    b.apply_collision(&mut partner);
                }
                snapshot.insert(partner);
            }
            Action::CollideFixture { body, fixture } => {
                let Some(wall) = fixtures.get(fixture) else {
                    log::warn!("fixture {} not found, skipped", fixture);
                    return;
                };
                if let Some(b) = snapshot.get_mut(body) {
                    b.apply_fixture_collision(wall);
                }
            }
        }
    }
}

/// The next world-changing event after the latest snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Time from the latest snapshot to the event; `None` when nothing is pending
    pub after: Option<Duration>,
    /// Exact queue time when an input batch is part of this transition
    #[serde(default)]
    pub input_time: Option<Timestamp>,
    /// Everything that happens at that moment, in scan order
    pub actions: Vec<Action>,
}

impl Transition {
    /// Absolute time of the transition given the latest snapshot time
    ///
    /// An input batch pins the transition to its queue time, which
    /// `latest + after` may miss by an ulp.
    pub fn at(&self, latest: Timestamp) -> Option<Timestamp> {
        self.after?;
        self.input_time.or_else(|| self.after.map(|d| latest + d))
    }

    /// Start a transition from the input batch queued at `at`
    pub fn from_inputs(at: Timestamp, latest: Timestamp, actions: Vec<Action>) -> Self {
        Self {
            after: Some(at - latest),
            input_time: Some(at),
            actions,
        }
    }

    /// Search horizon for further events, widened by the tie tolerance
    pub fn horizon(&self, tie_tolerance: f64) -> Option<Duration> {
        self.after.map(|d| d + tie_tolerance)
    }

    /// Offer an event at `t`
    ///
    /// Returns true when the event belongs to this transition, in which case
    /// the caller appends its action. A strictly earlier event discards the
    /// actions gathered so far; events within `tie_tolerance` are merged.
    pub fn offer(&mut self, t: Option<Duration>, tie_tolerance: f64) -> bool {
        let Some(t) = t else {
            return false;
        };
        if !(t > 0.0) {
            return false;
        }
        match self.after {
            Some(best) if t > best + tie_tolerance => false,
            Some(best) if t >= best - tie_tolerance => {
                self.after = Some(best.min(t));
                true
            }
            _ => {
                self.after = Some(t);
                self.input_time = None;
                self.actions.clear();
                true
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.after.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Body;

    fn world() -> (Snapshot, Snapshot) {
        let a = Body::circle(1, DVec2::new(0.0, 0.0), 1.0, 0.0, 1.0)
            .unwrap()
            .with_velocity(DVec2::new(1.0, 0.0));
        let b = Body::circle(2, DVec2::new(2.0, 0.0), 1.0, 0.0, 1.0).unwrap();
        let wall = Body::line(10, DVec2::new(-1.0, -5.0), DVec2::new(-1.0, 5.0)).unwrap();
        (
            Snapshot::from_bodies([a, b]).unwrap(),
            Snapshot::from_bodies([wall]).unwrap(),
        )
    }

    #[test]
    fn test_offer_replaces_later_and_merges_ties() {
        let mut tr = Transition::default();
        assert!(tr.offer(Some(5.0), 0.0));
        tr.actions.push(Action::Stop { body: 1 });
        assert!(!tr.offer(Some(6.0), 0.0));
        assert!(!tr.offer(None, 0.0));

        assert!(tr.offer(Some(5.0), 0.0));
        tr.actions.push(Action::Stop { body: 2 });
        assert_eq!(tr.actions.len(), 2);

        assert!(tr.offer(Some(3.0), 0.0));
        assert!(tr.actions.is_empty());
        assert_eq!(tr.after, Some(3.0));
    }

    #[test]
    fn test_offer_rejects_non_advancing_times() {
        let mut tr = Transition::default();
        assert!(!tr.offer(Some(0.0), 0.0));
        assert!(!tr.offer(Some(-1.0), 0.0));
        assert!(!tr.is_pending());
    }

    #[test]
    fn test_offer_tolerance_keeps_earliest() {
        let mut tr = Transition::default();
        tr.offer(Some(2.0), 0.01);
        assert!(tr.offer(Some(1.995), 0.01));
        assert_eq!(tr.after, Some(1.995));
        assert_eq!(tr.horizon(0.01), Some(1.995 + 0.01));
        assert_eq!(tr.at(10.0), Some(10.0 + 1.995));
    }

    #[test]
    fn test_input_batch_pins_absolute_time() {
        let mut tr = Transition::from_inputs(5.3, 1.1, vec![Action::Stop { body: 1 }]);
        assert_eq!(tr.at(1.1), Some(5.3));

        // A tie keeps the input batch and its time
        let after = tr.after;
        assert!(tr.offer(after, 0.0));
        assert_eq!(tr.at(1.1), Some(5.3));

        // A strictly earlier event drops the batch
        assert!(tr.offer(Some(1.0), 0.0));
        assert_eq!(tr.input_time, None);
        assert_eq!(tr.at(2.0), Some(3.0));
    }

    #[test]
    fn test_apply_collide_updates_both_bodies() {
        let (mut ss, fixtures) = world();
        Action::Collide { body: 1, other: 2 }.apply(&mut ss, &fixtures);
        assert_eq!(ss.get(1).unwrap().velocity(), DVec2::ZERO);
        assert_eq!(ss.get(2).unwrap().velocity(), DVec2::new(1.0, 0.0));
    }

    #[test]
    fn test_apply_fixture_leaves_fixture_alone() {
        let (mut ss, fixtures) = world();
        ss.get_mut(1).unwrap().set_velocity(DVec2::new(-3.0, 0.0));
        Action::CollideFixture { body: 1, fixture: 10 }.apply(&mut ss, &fixtures);
        assert_eq!(ss.get(1).unwrap().velocity(), DVec2::new(3.0, 0.0));
        assert_eq!(fixtures.get(10).unwrap().velocity(), DVec2::ZERO);
    }

    #[test]
    fn test_apply_velocity_actions() {
        let (mut ss, fixtures) = world();
        Action::AddVelocity { body: 2, delta: DVec2::new(0.0, 2.0) }.apply(&mut ss, &fixtures);
        assert!(!ss.get(2).unwrap().is_stopped());
        Action::SetVelocity { body: 2, velocity: DVec2::ZERO }.apply(&mut ss, &fixtures);
        assert!(ss.get(2).unwrap().is_stopped());
        Action::Stop { body: 1 }.apply(&mut ss, &fixtures);
        assert_eq!(ss.get(1).unwrap().velocity(), DVec2::ZERO);
    }

    #[test]
    fn test_missing_body_is_skipped() {
        let (mut ss, fixtures) = world();
        let before = ss.clone();
        Action::Stop { body: 99 }.apply(&mut ss, &fixtures);
        Action::Collide { body: 1, other: 99 }.apply(&mut ss, &fixtures);
        assert_eq!(ss, before);
    }

    #[test]
    fn test_action_log_serializes() {
        let tr = Transition {
            after: Some(1.5),
            input_time: Some(3.5),
            actions: vec![
                Action::Collide { body: 1, other: 2 },
                Action::AddVelocity { body: 3, delta: DVec2::new(0.5, -1.0) },
            ],
        };
        let json = serde_json::to_string(&tr).unwrap();
        let back: Transition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tr);
    }
}
