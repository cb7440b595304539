//! Partitions awake bodies into independently solvable islands.

use slotmap::{SecondaryMap, SlotMap};
use smallvec::SmallVec;

use super::{
    body::{Body, BodyKey},
    contact::{ContactManager, ContactPair},
    joint::{JointEntry, JointKey},
};

/// A connected component of the body graph.
#[derive(Debug, Default)]
pub(crate) struct Island {
    /// Member bodies, static ones included but never expanded through.
    pub bodies: Vec<BodyKey>,
    /// Contacts between members.
    pub contacts: Vec<ContactPair>,
    /// Joints between members.
    pub joints: Vec<JointKey>,
}

impl Island {
    fn clear(&mut self) {
        self.bodies.clear();
        self.contacts.clear();
        self.joints.clear();
    }
}

/// Edge of the adjacency graph, the constraint plus the body on the far end.
#[derive(Debug, Clone, Copy)]
enum Edge {
    Contact(ContactPair, BodyKey),
    Joint(JointKey, BodyKey),
}

/// Reusable island builder.
///
/// The per-step buffers stay allocated across steps so building islands
/// does not churn the allocator.
#[derive(Debug, Default)]
pub(crate) struct IslandBuilder {
    /// Built islands, valid until the next build.
    islands: Vec<Island>,
    /// Amount of islands in use this step.
    count: usize,
    /// Depth-first traversal stack.
    stack: Vec<BodyKey>,
    /// Body adjacency, rebuilt every step.
    adjacency: SecondaryMap<BodyKey, SmallVec<[Edge; 4]>>,
}

impl IslandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Partition the world into islands.
    ///
    /// Every active, awake, dynamic body seeds a depth-first traversal over
    /// contact and joint edges. Static bodies join islands but are not
    /// expanded through, so they can take part in several islands.
    pub fn build(
        &mut self,
        bodies: &mut SlotMap<BodyKey, Body>,
        contacts: &mut ContactManager,
        joints: &mut SlotMap<JointKey, JointEntry>,
    ) -> usize {
        puffin::profile_function!();

        for body in bodies.values_mut() {
            body.on_island = false;
        }

        // Rebuild the adjacency from the live constraints
        self.adjacency.clear();
        for key in bodies.keys() {
            self.adjacency.insert(key, SmallVec::new());
        }
        for contact in contacts.iter_mut() {
            contact.on_island = false;
            if contact.sensor {
                continue;
            }

            self.adjacency[contact.body1].push(Edge::Contact(contact.pair, contact.body2));
            self.adjacency[contact.body2].push(Edge::Contact(contact.pair, contact.body1));
        }
        for (key, entry) in joints.iter_mut() {
            entry.on_island = false;

            let body1 = entry.joint.body1();
            if let Some(body2) = entry.joint.body2() {
                self.adjacency[body1].push(Edge::Joint(key, body2));
                self.adjacency[body2].push(Edge::Joint(key, body1));
            } else {
                self.adjacency[body1].push(Edge::Joint(key, body1));
            }
        }

        self.count = 0;
        let seeds = bodies.keys().collect::<Vec<_>>();
        for seed in seeds {
            {
                let body = &bodies[seed];
                if body.on_island || !body.is_active() || body.is_asleep() || !body.is_dynamic() {
                    continue;
                }
            }

            // Grow a fresh island from this seed
            if self.count == self.islands.len() {
                self.islands.push(Island::default());
            }
            let island = &mut self.islands[self.count];
            island.clear();
            self.count += 1;

            self.stack.clear();
            self.stack.push(seed);
            bodies[seed].on_island = true;

            while let Some(current) = self.stack.pop() {
                island.bodies.push(current);

                // Static bodies join but don't bridge islands
                if !bodies[current].is_dynamic() {
                    continue;
                }

                for edge_index in 0..self.adjacency[current].len() {
                    let edge = self.adjacency[current][edge_index];

                    let neighbor = match edge {
                        Edge::Contact(pair, neighbor) => {
                            let contact = contacts
                                .get_mut(pair)
                                .expect("island contact disappeared");
                            if contact.on_island {
                                continue;
                            }
                            contact.on_island = true;
                            island.contacts.push(pair);

                            neighbor
                        }
                        Edge::Joint(key, neighbor) => {
                            let entry = &mut joints[key];
                            if entry.on_island {
                                continue;
                            }
                            entry.on_island = true;
                            island.joints.push(key);

                            neighbor
                        }
                    };

                    let other = &mut bodies[neighbor];
                    if neighbor == current || other.on_island || !other.is_active() {
                        continue;
                    }
                    other.on_island = true;
                    self.stack.push(neighbor);
                }
            }

            // Allow statics to appear in the next island as well
            for body in &island.bodies {
                if !bodies[*body].is_dynamic() {
                    bodies[*body].on_island = false;
                }
            }
        }

        self.count
    }

    /// An island built by the last `build` call.
    pub fn island(&self, index: usize) -> &Island {
        &self.islands[index]
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;
    use vek::Vec2;

    use crate::{
        dynamics::{
            body::{Body, BodyKey},
            contact::{contact_pair, ContactManager},
            fixture::{Fixture, FixtureId},
            joint::JointKey,
        },
        collision::{Manifold, ManifoldPoint, ManifoldPointId},
        geometry::{Mass, Polygon},
    };

    use super::IslandBuilder;

    fn dynamic_body() -> Body {
        let mut body = Body::new();
        body.add_fixture(Fixture::new(Polygon::rectangle(1.0, 1.0).unwrap()));
        body.set_mass_from_fixtures();

        body
    }

    fn manifold() -> Manifold {
        let mut points = arrayvec::ArrayVec::new();
        points.push(ManifoldPoint {
            point: Vec2::zero(),
            depth: 0.01,
            id: ManifoldPointId::Distance,
        });

        Manifold {
            points,
            normal: -Vec2::unit_y(),
        }
    }

    /// A static body must not bridge two otherwise separate islands.
    #[test]
    fn test_static_no_bridge() {
        let mut bodies: SlotMap<BodyKey, Body> = SlotMap::with_key();
        let mut joints = SlotMap::with_key();
        let mut contacts = ContactManager::new();

        let left = bodies.insert(dynamic_body());
        let right = bodies.insert(dynamic_body());
        let mut floor = Body::new();
        floor.add_fixture(Fixture::new(Polygon::rectangle(50.0, 1.0).unwrap()));
        floor.set_mass(Mass::infinite(Vec2::zero()));
        let floor = bodies.insert(floor);

        // Both dynamic bodies touch the floor but not each other
        contacts.begin_step();
        for body in [left, right] {
            let pair = contact_pair(
                FixtureId { body, index: 0 },
                FixtureId {
                    body: floor,
                    index: 0,
                },
            );
            contacts.update(
                pair,
                pair.0.body,
                pair.1.body,
                &manifold(),
                (0.2, 0.2),
                (0.0, 0.0),
                false,
                false,
            );
        }

        let mut builder = IslandBuilder::new();
        let count = builder.build(&mut bodies, &mut contacts, &mut joints);

        assert_eq!(count, 2);
        // The floor shows up in both islands
        for index in 0..count {
            let island = builder.island(index);
            assert!(island.bodies.contains(&floor));
            assert_eq!(island.contacts.len(), 1);
        }
    }

    /// Sensor contacts must not connect islands.
    #[test]
    fn test_sensor_not_traversed() {
        let mut bodies: SlotMap<BodyKey, Body> = SlotMap::with_key();
        let mut joints: SlotMap<JointKey, _> = SlotMap::with_key();
        let mut contacts = ContactManager::new();

        let a = bodies.insert(dynamic_body());
        let b = bodies.insert(dynamic_body());

        let pair = contact_pair(
            FixtureId { body: a, index: 0 },
            FixtureId { body: b, index: 0 },
        );
        contacts.begin_step();
        contacts.update(
            pair,
            pair.0.body,
            pair.1.body,
            &manifold(),
            (0.2, 0.2),
            (0.0, 0.0),
            true,
            false,
        );

        let mut builder = IslandBuilder::new();
        let count = builder.build(&mut bodies, &mut contacts, &mut joints);

        // Two singleton islands, the sensor contact links nothing
        assert_eq!(count, 2);
        assert!(builder.island(0).contacts.is_empty());
        assert!(builder.island(1).contacts.is_empty());
    }
}
