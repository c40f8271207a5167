//! Contact listener handed to the kernel on every step.
//!
//! The kernel may call it from worker threads, so events are buffered behind a mutex and
//! drained by the owning thread after the step.

use std::sync::Mutex;

use rapier3d::prelude::{
    ColliderHandle, ColliderSet, CollisionEvent, ContactPair, EventHandler, Real, RigidBodySet,
};

/// Begin/end of a contact or sensor overlap between two colliders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawContactEvent {
    pub collider1: ColliderHandle,
    pub collider2: ColliderHandle,
    pub started: bool,
    pub sensor: bool,
}

#[derive(Default)]
pub struct ContactListener {
    events: Mutex<Vec<RawContactEvent>>,
}

impl ContactListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every event recorded since the last drain.
    pub fn drain(&self) -> Vec<RawContactEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl EventHandler for ContactListener {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        let raw = RawContactEvent {
            collider1: event.collider1(),
            collider2: event.collider2(),
            started: event.started(),
            sensor: event.sensor(),
        };
        match self.events.lock() {
            Ok(mut events) => events.push(raw),
            Err(poisoned) => poisoned.into_inner().push(raw),
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}
