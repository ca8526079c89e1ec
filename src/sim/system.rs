//! Rewindable event timeline
//!
//! The system keeps every snapshot it has materialized, keyed by time, plus a
//! queue of external inputs. Between snapshots nothing changes except motion
//! under friction, so only the next transition (the earliest input, friction
//! stop or collision after the latest snapshot) needs to be known. Advancing
//! materializes transitions one at a time; rewinding drops snapshots and
//! recomputes the next transition from whatever is left.

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use glam::DVec2;

use super::action::{Action, Transition};
use super::body::Body;
use super::snapshot::Snapshot;
use crate::error::{Result, SimError, ensure_finite};
use crate::settings::SimConfig;
use crate::{BodyId, Duration, Timestamp};

/// Totally ordered finite timestamp, used as a map key
#[derive(Debug, Clone, Copy)]
struct TimeKey(Timestamp);

impl PartialEq for TimeKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for TimeKey {}

impl PartialOrd for TimeKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// A materialized snapshot and its time
#[derive(Debug, Clone)]
struct Frame {
    time: Timestamp,
    snapshot: Snapshot,
}

/// Simulation timeline with rewind and replay
#[derive(Debug, Clone)]
pub struct System {
    /// Initial state; never discarded
    origin: Frame,
    /// Later snapshots, strictly increasing in time
    frames: Vec<Frame>,
    /// Static bodies shared by every snapshot
    fixtures: Snapshot,
    input_queue: BTreeMap<TimeKey, Vec<Action>>,
    /// Always consistent with the latest frame
    next_transition: Transition,
    config: SimConfig,
}

impl System {
    /// Timeline starting at time zero with default configuration
    pub fn new(initial: Snapshot, fixtures: Snapshot) -> Self {
        let mut system = Self {
            origin: Frame {
                time: 0.0,
                snapshot: initial,
            },
            frames: Vec::new(),
            fixtures,
            input_queue: BTreeMap::new(),
            next_transition: Transition::default(),
            config: SimConfig::default(),
        };
        system.calculate();
        system
    }

    /// Timeline starting at `origin` with the given configuration
    pub fn starting_at(
        origin: Timestamp,
        initial: Snapshot,
        fixtures: Snapshot,
        config: SimConfig,
    ) -> Result<Self> {
        ensure_finite(origin)?;
        config.validate()?;
        if let Some(body) = initial.iter().find(|b| fixtures.contains(b.id)) {
            return Err(SimError::invalid_body(body.id, "id used by both a body and a fixture"));
        }
        let mut system = Self::new(initial, fixtures);
        system.origin.time = origin;
        system.config = config;
        system.calculate();
        log::info!(
            "System created at t={} with {} bodies and {} fixtures",
            origin,
            system.origin.snapshot.len(),
            system.fixtures.len()
        );
        Ok(system)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn fixtures(&self) -> &Snapshot {
        &self.fixtures
    }

    /// Time of the initial snapshot
    pub fn origin_time(&self) -> Timestamp {
        self.origin.time
    }

    fn latest_frame(&self) -> &Frame {
        self.frames.last().unwrap_or(&self.origin)
    }

    /// Time of the latest materialized snapshot
    pub fn latest_time(&self) -> Timestamp {
        self.latest_frame().time
    }

    pub fn latest(&self) -> &Snapshot {
        &self.latest_frame().snapshot
    }

    /// Number of materialized snapshots, including the initial one
    pub fn snapshot_count(&self) -> usize {
        self.frames.len() + 1
    }

    /// Every materialized snapshot in time order
    pub fn timeline(&self) -> impl Iterator<Item = (Timestamp, &Snapshot)> {
        std::iter::once(&self.origin)
            .chain(self.frames.iter())
            .map(|f| (f.time, &f.snapshot))
    }

    /// Number of queued input events, past and future
    pub fn pending_inputs(&self) -> usize {
        self.input_queue.values().map(Vec::len).sum()
    }

    pub fn next_transition(&self) -> &Transition {
        &self.next_transition
    }

    /// Absolute time of the next transition, if any
    pub fn next_transition_time(&self) -> Option<Timestamp> {
        self.next_transition.at(self.latest_time())
    }

    /// Recompute the next transition from the latest snapshot
    pub fn calculate(&mut self) {
        self.next_transition = self.find_next_transition();
    }

    fn find_next_transition(&self) -> Transition {
        let latest = self.latest_frame();
        let now = latest.time;
        let snapshot = &latest.snapshot;
        let tol = self.config.tie_tolerance;
        let sweep = self.config.sweep_rejection;

        // Earliest input batch strictly after the latest snapshot
        let mut next = match self.input_queue.range((Excluded(TimeKey(now)), Unbounded)).next() {
            Some((key, actions)) => Transition::from_inputs(key.0, now, actions.clone()),
            None => Transition::default(),
        };

        for body in snapshot.iter().filter(|b| b.is_moving()) {
            if next.offer(body.time_until_stop(), tol) {
                next.actions.push(Action::Stop { body: body.id });
            }
        }

        let bodies: Vec<&Body> = snapshot.iter().collect();
        for (i, body) in bodies.iter().enumerate() {
            if !body.is_moving() {
                continue;
            }
            // Earlier moving bodies already scanned against this one
            let earlier = bodies[..i].iter().filter(|o| !o.is_moving());
            for other in earlier.chain(bodies[i + 1..].iter()) {
                let t = body.contact_time(other, next.horizon(tol), sweep);
                if next.offer(t, tol) {
                    next.actions.push(Action::Collide {
                        body: body.id,
                        other: other.id,
                    });
                }
            }
            for fixture in self.fixtures.iter() {
                let t = body.contact_time(fixture, next.horizon(tol), sweep);
                if next.offer(t, tol) {
                    next.actions.push(Action::CollideFixture {
                        body: body.id,
                        fixture: fixture.id,
                    });
                }
            }
        }

        next
    }

    /// Materialize every transition up to and including time `t`
    ///
    /// Returns the number of transitions applied. Queries at `t` are then
    /// answered by projecting forward from the latest snapshot.
    ///
    /// A transition too close to the latest snapshot to advance the clock is
    /// folded into that snapshot. Only at the origin, which is never
    /// rewritten, does this fail with [`SimError::StalledTimeline`].
    pub fn calculate_to_time(&mut self, t: Timestamp) -> Result<usize> {
        let target = ensure_finite(t)?;
        let mut applied = 0;
        while let Some(at) = self.next_transition_time() {
            if at > target {
                break;
            }
            if applied >= self.config.max_transitions_per_advance {
                log::warn!("Transition limit reached at t={}", self.latest_time());
                return Err(SimError::TransitionLimit {
                    limit: self.config.max_transitions_per_advance,
                    target,
                });
            }
            self.materialize_next()?;
            applied += 1;
        }
        Ok(applied)
    }

    fn materialize_next(&mut self) -> Result<()> {
        let latest = self.latest_frame();
        let now = latest.time;
        let (Some(time), Some(after)) = (self.next_transition.at(now), self.next_transition.after) else {
            return Ok(());
        };
        // Inputs land exactly on their queue time
        let after = match self.next_transition.input_time {
            Some(key) => key - now,
            None => after,
        };

        let mut snapshot = latest.snapshot.after(after);
        for action in &self.next_transition.actions {
            action.apply(&mut snapshot, &self.fixtures);
        }

        if time > now {
            log::debug!("t={:.6}: {:?}", time, self.next_transition.actions);
            self.frames.push(Frame { time, snapshot });
        } else if let Some(frame) = self.frames.last_mut() {
            log::debug!(
                "t={:.6}: folding {:?} (after {:e}) into the latest snapshot",
                frame.time,
                self.next_transition.actions,
                after
            );
            frame.snapshot = snapshot;
        } else {
            return Err(SimError::StalledTimeline { at: now, after });
        }
        self.calculate();
        Ok(())
    }

    /// Drop every snapshot at or after `t` and recompute the next transition
    ///
    /// The initial snapshot always survives.
    pub fn rewind_to_time(&mut self, t: Timestamp) -> Result<()> {
        let t = ensure_finite(t)?;
        let keep = self.frames.partition_point(|f| f.time < t);
        let dropped = self.frames.len() - keep;
        self.frames.truncate(keep);
        self.calculate();
        if dropped > 0 {
            log::debug!("Rewound to t={}: dropped {} snapshots", t, dropped);
        }
        Ok(())
    }

    /// Queue an action at `t`, rewinding so replay picks it up
    pub fn add_input_event(&mut self, t: Timestamp, action: Action) -> Result<()> {
        let t = ensure_finite(t)?;
        if t <= self.origin.time {
            return Err(SimError::BeforeOrigin {
                timestamp: t,
                origin: self.origin.time,
            });
        }
        self.validate_action(&action)?;
        self.input_queue.entry(TimeKey(t)).or_default().push(action);
        self.rewind_to_time(t)
    }

    /// Queue an impulse: add `impulse` to body `id`'s velocity at `t`
    pub fn add_impulse_event(&mut self, t: Timestamp, id: BodyId, impulse: DVec2) -> Result<()> {
        self.add_input_event(t, Action::AddVelocity { body: id, delta: impulse })
    }

    fn validate_action(&self, action: &Action) -> Result<()> {
        let bodies = &self.origin.snapshot;
        let body = action.body();
        if !bodies.contains(body) {
            return Err(SimError::UnknownBody(body));
        }
        match *action {
            Action::Collide { other, .. } if !bodies.contains(other) => Err(SimError::UnknownBody(other)),
            Action::CollideFixture { fixture, .. } if !self.fixtures.contains(fixture) => {
                Err(SimError::UnknownBody(fixture))
            }
            _ => Ok(()),
        }
    }

    /// Latest snapshot at or before `t`, and the time elapsed since it
    pub fn at(&self, t: Timestamp) -> Result<(Duration, &Snapshot)> {
        let t = ensure_finite(t)?;
        if t < self.origin.time {
            return Err(SimError::BeforeOrigin {
                timestamp: t,
                origin: self.origin.time,
            });
        }
        let idx = self.frames.partition_point(|f| f.time <= t);
        let frame = match idx {
            0 => &self.origin,
            _ => &self.frames[idx - 1],
        };
        Ok((t - frame.time, &frame.snapshot))
    }

    /// Visit every body as of `t`, fixtures first when requested
    ///
    /// The visitor gets the time elapsed since the covering snapshot, so it can
    /// project positions with [`Body::position_after`].
    pub fn for_each_at(
        &self,
        t: Timestamp,
        mut visit: impl FnMut(Duration, &Body),
        include_fixtures: bool,
    ) -> Result<()> {
        let (d, snapshot) = self.at(t)?;
        if include_fixtures {
            self.fixtures.for_each(|b| visit(d, b));
        }
        snapshot.for_each(|b| visit(d, b));
        Ok(())
    }

    /// Owned world state at `t`, projected from the covering snapshot
    ///
    /// Exact only once [`System::calculate_to_time`] has reached `t`.
    pub fn snapshot_at(&self, t: Timestamp) -> Result<Snapshot> {
        let (d, snapshot) = self.at(t)?;
        Ok(snapshot.after(d))
    }
}
