//! Persistent contacts between fixture pairs.
//!
//! The manager keys constraints by their ordered fixture pair and carries
//! accumulated impulses across steps for points whose manifold id matches.

use std::collections::HashMap;

use arrayvec::ArrayVec;
use vek::Vec2;

use crate::collision::{Manifold, ManifoldPointId};

use super::{
    body::BodyKey,
    fixture::{mix_friction, mix_restitution, FixtureId},
};

/// Ordered fixture pair identifying a contact.
pub type ContactPair = (FixtureId, FixtureId);

/// Normalize two fixture ids into a contact pair.
pub fn contact_pair(a: FixtureId, b: FixtureId) -> ContactPair {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// One contact point with its accumulated impulses and solver scratch.
#[derive(Debug, Clone, Copy)]
pub struct ContactPoint {
    /// Contact point in world space.
    pub point: Vec2<f64>,
    /// Penetration depth at manifold time.
    pub depth: f64,
    /// Identity used for warm-start matching.
    pub id: ManifoldPointId,
    /// Accumulated impulse along the normal.
    pub normal_impulse: f64,
    /// Accumulated impulse along the tangent.
    pub tangent_impulse: f64,
    /// Anchor in the first body's local frame.
    pub(crate) local1: Vec2<f64>,
    /// Anchor in the second body's local frame.
    pub(crate) local2: Vec2<f64>,
    /// Arm from the first body's center to the point.
    pub(crate) r1: Vec2<f64>,
    /// Arm from the second body's center to the point.
    pub(crate) r2: Vec2<f64>,
    /// Effective mass along the normal.
    pub(crate) normal_mass: f64,
    /// Effective mass along the tangent.
    pub(crate) tangent_mass: f64,
    /// Restitution bias velocity.
    pub(crate) velocity_bias: f64,
}

impl ContactPoint {
    fn new(point: Vec2<f64>, depth: f64, id: ManifoldPointId) -> Self {
        Self {
            point,
            depth,
            id,
            normal_impulse: 0.0,
            tangent_impulse: 0.0,
            local1: Vec2::zero(),
            local2: Vec2::zero(),
            r1: Vec2::zero(),
            r2: Vec2::zero(),
            normal_mass: 0.0,
            tangent_mass: 0.0,
            velocity_bias: 0.0,
        }
    }
}

/// Contact constraint between two fixtures with a live manifold.
#[derive(Debug, Clone)]
pub struct Contact {
    /// The ordered fixture pair.
    pub pair: ContactPair,
    /// Body owning the first fixture.
    pub body1: BodyKey,
    /// Body owning the second fixture.
    pub body2: BodyKey,
    /// Unit normal pointing from the second body toward the first.
    pub normal: Vec2<f64>,
    /// The contact points.
    pub points: ArrayVec<ContactPoint, 2>,
    /// Mixed friction coefficient.
    pub friction: f64,
    /// Mixed restitution coefficient.
    pub restitution: f64,
    /// Sensor contacts are detected but never solved.
    pub sensor: bool,
    /// Both fixtures are sensors, only begin and end events fire.
    pub both_sensors: bool,
    /// Scratch flag of the island traversal.
    pub(crate) on_island: bool,
    /// Steps this contact has been alive.
    pub age: u64,
    /// Mark and sweep flag of the manager.
    refreshed: bool,
}

/// What happened to a pair during a manifold update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactChange {
    /// The pair started touching this step.
    Begun,
    /// The pair was already touching.
    Persisted,
}

/// Owns every live contact, keyed by fixture pair.
#[derive(Debug, Default)]
pub struct ContactManager {
    contacts: HashMap<ContactPair, Contact>,
}

impl ContactManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a step, clearing the refresh marks.
    pub fn begin_step(&mut self) {
        for contact in self.contacts.values_mut() {
            contact.refreshed = false;
        }
    }

    /// Feed a fresh manifold for a pair.
    ///
    /// Existing contacts inherit accumulated impulses for points whose id
    /// matches the previous step, new ones start cold.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        pair: ContactPair,
        body1: BodyKey,
        body2: BodyKey,
        manifold: &Manifold,
        friction: (f64, f64),
        restitution: (f64, f64),
        sensor: bool,
        both_sensors: bool,
    ) -> ContactChange {
        let mut points: ArrayVec<ContactPoint, 2> = manifold
            .points
            .iter()
            .map(|point| ContactPoint::new(point.point, point.depth, point.id))
            .collect();

        match self.contacts.get_mut(&pair) {
            Some(existing) => {
                // Carry impulses over by matching ids
                for point in &mut points {
                    if let Some(old) = existing.points.iter().find(|old| old.id == point.id) {
                        point.normal_impulse = old.normal_impulse;
                        point.tangent_impulse = old.tangent_impulse;
                    }
                }

                existing.normal = manifold.normal;
                existing.points = points;
                existing.age += 1;
                existing.refreshed = true;

                ContactChange::Persisted
            }
            None => {
                self.contacts.insert(
                    pair,
                    Contact {
                        pair,
                        body1,
                        body2,
                        normal: manifold.normal,
                        points,
                        friction: mix_friction(friction.0, friction.1),
                        restitution: mix_restitution(restitution.0, restitution.1),
                        sensor,
                        both_sensors,
                        on_island: false,
                        age: 0,
                        refreshed: true,
                    },
                );

                ContactChange::Begun
            }
        }
    }

    /// Keep a resting pair's contact alive without recomputing its manifold.
    ///
    /// Used for pairs where both bodies are asleep or static, so sleeping
    /// stacks keep their warm impulses for the moment they wake up.
    pub fn refresh(&mut self, pair: ContactPair) -> bool {
        match self.contacts.get_mut(&pair) {
            Some(contact) => {
                contact.refreshed = true;
                contact.age += 1;

                true
            }
            None => false,
        }
    }

    /// Drop every contact that did not get a manifold this step.
    ///
    /// The removed contacts are handed back so their end events can fire.
    pub fn sweep(&mut self, ended: &mut Vec<Contact>) {
        let stale = self
            .contacts
            .values()
            .filter(|contact| !contact.refreshed)
            .map(|contact| contact.pair)
            .collect::<Vec<_>>();

        for pair in stale {
            if let Some(contact) = self.contacts.remove(&pair) {
                ended.push(contact);
            }
        }
    }

    /// Remove every contact involving a body, for world removal.
    pub fn remove_body(&mut self, body: BodyKey, ended: &mut Vec<Contact>) {
        let stale = self
            .contacts
            .values()
            .filter(|contact| contact.body1 == body || contact.body2 == body)
            .map(|contact| contact.pair)
            .collect::<Vec<_>>();

        for pair in stale {
            if let Some(contact) = self.contacts.remove(&pair) {
                ended.push(contact);
            }
        }
    }

    /// A contact by pair.
    pub fn get(&self, pair: ContactPair) -> Option<&Contact> {
        self.contacts.get(&pair)
    }

    /// Mutable access by pair, used by the solver.
    pub(crate) fn get_mut(&mut self, pair: ContactPair) -> Option<&mut Contact> {
        self.contacts.get_mut(&pair)
    }

    /// Iterate over all live contacts.
    pub fn iter(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.values()
    }

    /// Iterate mutably over all live contacts.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Contact> {
        self.contacts.values_mut()
    }

    /// Whether two bodies share any live non-sensor contact.
    pub fn bodies_in_contact(&self, a: BodyKey, b: BodyKey) -> bool {
        self.contacts.values().any(|contact| {
            !contact.sensor
                && ((contact.body1 == a && contact.body2 == b)
                    || (contact.body1 == b && contact.body2 == a))
        })
    }

    /// Amount of live contacts.
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Whether no contact is live.
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use arrayvec::ArrayVec;
    use slotmap::SlotMap;
    use vek::Vec2;

    use crate::{
        collision::{Manifold, ManifoldPoint, ManifoldPointId},
        dynamics::{body::BodyKey, fixture::FixtureId},
    };

    use super::{contact_pair, ContactChange, ContactManager};

    fn manifold(id: ManifoldPointId) -> Manifold {
        let mut points = ArrayVec::new();
        points.push(ManifoldPoint {
            point: Vec2::zero(),
            depth: 0.01,
            id,
        });

        Manifold {
            points,
            normal: -Vec2::unit_y(),
        }
    }

    /// Warm-start impulses must survive across steps for matching ids.
    #[test]
    fn test_warm_start_carry_over() {
        let mut bodies: SlotMap<BodyKey, ()> = SlotMap::with_key();
        let body1 = bodies.insert(());
        let body2 = bodies.insert(());
        let pair = contact_pair(
            FixtureId {
                body: body1,
                index: 0,
            },
            FixtureId {
                body: body2,
                index: 0,
            },
        );

        let mut manager = ContactManager::new();
        let id = ManifoldPointId::Clip {
            reference_edge: 2,
            incident_edge: 0,
            index: 1,
            flipped: false,
        };

        manager.begin_step();
        let change = manager.update(
            pair,
            body1,
            body2,
            &manifold(id),
            (0.5, 0.5),
            (0.0, 0.0),
            false,
            false,
        );
        assert_eq!(change, ContactChange::Begun);

        // Pretend the solver accumulated an impulse
        manager.get_mut(pair).unwrap().points[0].normal_impulse = 1.5;

        manager.begin_step();
        let change = manager.update(
            pair,
            body1,
            body2,
            &manifold(id),
            (0.5, 0.5),
            (0.0, 0.0),
            false,
            false,
        );
        assert_eq!(change, ContactChange::Persisted);
        assert_eq!(manager.get(pair).unwrap().points[0].normal_impulse, 1.5);

        // A different id starts cold
        manager.begin_step();
        manager.update(
            pair,
            body1,
            body2,
            &manifold(ManifoldPointId::Distance),
            (0.5, 0.5),
            (0.0, 0.0),
            false,
            false,
        );
        assert_eq!(manager.get(pair).unwrap().points[0].normal_impulse, 0.0);
    }

    /// Contacts without a fresh manifold must be swept out.
    #[test]
    fn test_sweep_removes_stale() {
        let mut bodies: SlotMap<BodyKey, ()> = SlotMap::with_key();
        let body1 = bodies.insert(());
        let body2 = bodies.insert(());
        let pair = contact_pair(
            FixtureId {
                body: body1,
                index: 0,
            },
            FixtureId {
                body: body2,
                index: 0,
            },
        );

        let mut manager = ContactManager::new();
        manager.begin_step();
        manager.update(
            pair,
            body1,
            body2,
            &manifold(ManifoldPointId::Distance),
            (0.5, 0.5),
            (0.0, 0.0),
            false,
            false,
        );

        let mut ended = Vec::new();
        manager.begin_step();
        manager.sweep(&mut ended);

        assert_eq!(ended.len(), 1);
        assert!(manager.is_empty());
    }
}
