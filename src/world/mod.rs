//! The world owns every body, joint and contact and advances them in time.

pub mod bounds;
pub mod event;

use std::collections::{HashMap, HashSet};

use arrayvec::ArrayVec;
use slotmap::SlotMap;
use vek::{Aabr, Vec2};

use crate::{
    collision::{self, broad_phase::Proxy, manifold, BroadPhase, Filter, Ray, RayHit},
    dynamics::{
        body::{Body, BodyKey},
        ccd,
        contact::{contact_pair, ContactChange, ContactManager, ContactPair},
        fixture::FixtureId,
        island::{Island, IslandBuilder},
        joint::{Joint, JointEntry, JointKey},
        solver,
    },
    error::{check_finite, Error, Result},
    math::Iso,
    settings::Settings,
};

pub use self::{
    bounds::AxisAlignedBounds,
    event::{
        CollisionCandidate, CollisionPhase, ContactEvent, DestructionEvent, Handlers,
        NumericEvent, SolvedContactEvent, StepEvent,
    },
};

/// A ray intersection with a fixture in the world.
#[derive(Debug, Clone, Copy)]
pub struct RaycastHit {
    /// The fixture that was hit.
    pub fixture: FixtureId,
    /// Intersection details.
    pub hit: RayHit,
}

/// Debug view of a single body, everything a renderer needs.
#[derive(Debug, Clone)]
pub struct BodySnapshot {
    /// World transform.
    pub transform: Iso,
    /// Center of mass in world space.
    pub world_center: Vec2<f64>,
    /// Union of the fixture bounding boxes.
    pub aabr: Option<Aabr<f64>>,
    /// Whether the body takes part in the simulation.
    pub active: bool,
    /// Whether the body is asleep.
    pub asleep: bool,
    /// Whether the body gets a continuous collision sweep.
    pub bullet: bool,
}

/// Debug view of a single contact point.
#[derive(Debug, Clone, Copy)]
pub struct ContactSnapshot {
    /// The fixture pair.
    pub pair: ContactPair,
    /// World point.
    pub point: Vec2<f64>,
    /// Contact normal.
    pub normal: Vec2<f64>,
    /// Penetration depth.
    pub depth: f64,
    /// Stable point id.
    pub id: collision::ManifoldPointId,
}

/// Physics world, stepped at a fixed rate.
pub struct World {
    /// Tunables for every subsystem.
    settings: Settings,
    /// Gravity applied to every dynamic body, scaled per body.
    gravity: Vec2<f64>,
    /// Optional bounds deactivating escaped bodies.
    bounds: Option<AxisAlignedBounds>,
    /// All bodies.
    bodies: SlotMap<BodyKey, Body>,
    /// All joints.
    joints: SlotMap<JointKey, JointEntry>,
    /// Spatial index over fixture bounding boxes.
    broad_phase: BroadPhase,
    /// Persistent contacts.
    contacts: ContactManager,
    /// Registered event callbacks.
    pub handlers: Handlers,
    /// Reused island builder.
    islands: IslandBuilder,
    /// Steps taken so far.
    step_count: u64,
    /// Simulated seconds so far.
    sim_time: f64,
    /// Left-over time of the accumulator update.
    accumulator: f64,
    /// Pairs vetoed out of the solver for this step.
    disabled: HashSet<ContactPair>,
    /// Contacts that ended this step, reused scratch.
    ended: Vec<crate::dynamics::contact::Contact>,
    /// Last degenerate-pair warning per pair, in simulated seconds.
    warned: HashMap<ContactPair, f64>,
}

impl World {
    /// Create an empty world with earth-like gravity pointing down.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            gravity: Vec2::new(0.0, -9.81),
            bounds: None,
            bodies: SlotMap::with_key(),
            joints: SlotMap::with_key(),
            broad_phase: BroadPhase::new(),
            contacts: ContactManager::new(),
            handlers: Handlers::default(),
            islands: IslandBuilder::new(),
            step_count: 0,
            sim_time: 0.0,
            accumulator: 0.0,
            disabled: HashSet::new(),
            ended: Vec::new(),
            warned: HashMap::new(),
        }
    }

    /// Create an empty world with bounds that deactivate escaping bodies.
    pub fn with_bounds(settings: Settings, bounds: AxisAlignedBounds) -> Self {
        let mut world = Self::new(settings);
        world.bounds = Some(bounds);

        world
    }

    /// The current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Gravity applied to every dynamic body.
    pub fn gravity(&self) -> Vec2<f64> {
        self.gravity
    }

    /// Replace the gravity vector.
    pub fn set_gravity(&mut self, gravity: Vec2<f64>) -> Result<()> {
        check_finite("gravity.x", gravity.x)?;
        check_finite("gravity.y", gravity.y)?;
        self.gravity = gravity;

        Ok(())
    }

    /// Replace the world bounds, `None` disables the bounds check.
    pub fn set_bounds(&mut self, bounds: Option<AxisAlignedBounds>) {
        self.bounds = bounds;
    }

    /// Take ownership of a body, handing back its key.
    pub fn add_body(&mut self, body: Body) -> BodyKey {
        self.bodies.insert(body)
    }

    /// Remove a body, severing every contact and joint that references it.
    pub fn remove_body(&mut self, key: BodyKey) -> Option<Body> {
        let body = self.bodies.remove(key)?;

        // Sever joints
        let severed = self
            .joints
            .iter()
            .filter(|(_, entry)| {
                entry.joint.body1() == key || entry.joint.body2() == Some(key)
            })
            .map(|(joint_key, _)| joint_key)
            .collect::<Vec<_>>();
        for joint_key in severed {
            self.joints.remove(joint_key);
            event::emit(&mut self.handlers.destruction, &DestructionEvent::Joint(key));
        }

        // Sever contacts, waking the bodies left behind
        let mut ended = std::mem::take(&mut self.ended);
        ended.clear();
        self.contacts.remove_body(key, &mut ended);
        for contact in ended.drain(..) {
            let survivor = if contact.body1 == key {
                contact.body2
            } else {
                contact.body1
            };
            if let Some(body) = self.bodies.get_mut(survivor) {
                body.wake();
            }
            event::emit(
                &mut self.handlers.destruction,
                &DestructionEvent::Contact(contact.pair.0, contact.pair.1),
            );
        }
        self.ended = ended;

        self.broad_phase.remove_body(key);

        Some(body)
    }

    /// A body by key.
    pub fn body(&self, key: BodyKey) -> Option<&Body> {
        self.bodies.get(key)
    }

    /// Mutable access to a body.
    pub fn body_mut(&mut self, key: BodyKey) -> Option<&mut Body> {
        self.bodies.get_mut(key)
    }

    /// Iterate over all bodies.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyKey, &Body)> {
        self.bodies.iter()
    }

    /// Amount of bodies in the world.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Add a joint, waking the bodies it binds.
    pub fn add_joint(&mut self, joint: impl Joint + 'static) -> Result<JointKey> {
        if !self.bodies.contains_key(joint.body1()) {
            return Err(Error::JointBodyNotInWorld);
        }
        if let Some(body2) = joint.body2() {
            if !self.bodies.contains_key(body2) {
                return Err(Error::JointBodyNotInWorld);
            }
        }

        self.bodies[joint.body1()].wake();
        if let Some(body2) = joint.body2() {
            self.bodies[body2].wake();
        }

        Ok(self.joints.insert(JointEntry::new(Box::new(joint))))
    }

    /// Remove a joint, waking the bodies it bound.
    pub fn remove_joint(&mut self, key: JointKey) -> Option<JointEntry> {
        let entry = self.joints.remove(key)?;

        if let Some(body) = self.bodies.get_mut(entry.joint.body1()) {
            body.wake();
        }
        if let Some(body2) = entry.joint.body2() {
            if let Some(body) = self.bodies.get_mut(body2) {
                body.wake();
            }
        }

        Some(entry)
    }

    /// A joint by key.
    pub fn joint(&self, key: JointKey) -> Option<&JointEntry> {
        self.joints.get(key)
    }

    /// Mutable access to a joint.
    pub fn joint_mut(&mut self, key: JointKey) -> Option<&mut JointEntry> {
        self.joints.get_mut(key)
    }

    /// Iterate over all joints.
    pub fn joints(&self) -> impl Iterator<Item = (JointKey, &JointEntry)> {
        self.joints.iter()
    }

    /// Amount of joints in the world.
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Iterate over all live contacts.
    pub fn contacts(&self) -> impl Iterator<Item = &crate::dynamics::contact::Contact> {
        self.contacts.iter()
    }

    /// Steps taken since creation.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Simulated seconds since creation.
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// Advance with wall-clock time, stepping at the fixed frequency.
    ///
    /// Returns the amount of fixed steps taken, which is capped so a slow
    /// frame can't snowball into ever more work.
    pub fn update(&mut self, elapsed: f64) -> Result<u32> {
        check_finite("elapsed", elapsed)?;

        self.accumulator += elapsed.max(0.0);
        let dt = self.settings.step_dt();

        let mut steps = 0;
        while self.accumulator >= dt && steps < self.settings.max_steps_per_update {
            self.step(dt)?;
            self.accumulator -= dt;
            steps += 1;
        }

        Ok(steps)
    }

    /// Advance the world by a single fixed step.
    pub fn step(&mut self, dt: f64) -> Result<()> {
        puffin::profile_scope!("Physics step");

        check_finite("dt", dt)?;
        if dt <= 0.0 {
            return Err(Error::OutOfRange {
                name: "dt",
                min: f64::MIN_POSITIVE,
                max: f64::MAX,
                value: dt,
            });
        }
        // Refuse to step while any body lacks a mass
        if self.bodies.values().any(|body| body.mass().is_none()) {
            return Err(Error::MassNotComputed);
        }

        event::emit(
            &mut self.handlers.pre_step,
            &StepEvent {
                step: self.step_count,
                dt,
            },
        );

        {
            puffin::profile_scope!("Apply forces");

            // Snapshot the sweep origin and fold in the timed forces
            for body in self.bodies.values_mut() {
                body.transform0 = body.transform();
                if body.is_active() && !body.is_asleep() && body.is_dynamic() {
                    body.accumulate(dt);
                }
            }
        }

        {
            puffin::profile_scope!("Broad phase update");

            self.update_broad_phase();
        }

        let pairs = {
            puffin::profile_scope!("Broad phase detect");

            self.broad_phase.detect().to_vec()
        };

        {
            puffin::profile_scope!("Narrow phase and manifolds");

            self.contacts.begin_step();
            self.disabled.clear();
            for (id1, id2) in pairs {
                self.update_pair(id1, id2);
            }
        }

        {
            puffin::profile_scope!("End stale contacts");

            let mut ended = std::mem::take(&mut self.ended);
            ended.clear();
            self.contacts.sweep(&mut ended);
            for contact in ended.drain(..) {
                for key in [contact.body1, contact.body2] {
                    if let Some(body) = self.bodies.get_mut(key) {
                        body.wake();
                    }
                }

                let mut points = ArrayVec::new();
                for point in &contact.points {
                    points.push((point.point, point.depth));
                }
                event::emit(
                    &mut self.handlers.contact_end,
                    &ContactEvent {
                        fixture1: contact.pair.0,
                        fixture2: contact.pair.1,
                        normal: contact.normal,
                        points,
                        sensor: contact.sensor,
                    },
                );
            }
            self.ended = ended;
        }

        {
            puffin::profile_scope!("Solve islands");

            let mut builder = std::mem::take(&mut self.islands);
            let count = builder.build(&mut self.bodies, &mut self.contacts, &mut self.joints);
            for index in 0..count {
                self.solve_island(builder.island(index), dt);
            }
            self.islands = builder;
        }

        {
            puffin::profile_scope!("Continuous collision");

            ccd::sweep(&mut self.bodies, &self.settings);
        }

        self.check_bounds();
        self.check_poison();

        // Forces only act on the step they were applied before
        for body in self.bodies.values_mut() {
            body.clear_accumulators();
        }

        self.step_count += 1;
        self.sim_time += dt;

        event::emit(
            &mut self.handlers.post_step,
            &StepEvent {
                step: self.step_count,
                dt,
            },
        );

        Ok(())
    }

    /// Refresh every fixture's broad phase entry.
    fn update_broad_phase(&mut self) {
        for (key, body) in self.bodies.iter() {
            let transform = body.transform();
            let dynamic = body.is_dynamic();
            let active = body.is_active();

            for (index, fixture) in body.fixtures().iter().enumerate() {
                self.broad_phase.update(
                    FixtureId {
                        body: key,
                        index: index as u32,
                    },
                    Proxy {
                        aabr: fixture.aabr(transform),
                        filter: fixture.filter(),
                        dynamic,
                        active,
                    },
                );
            }
        }
    }

    /// Run one candidate pair through narrow phase and manifold generation.
    fn update_pair(&mut self, id1: FixtureId, id2: FixtureId) {
        let pair = contact_pair(id1, id2);

        if !event::emit_veto(
            &mut self.handlers.collision,
            &CollisionCandidate {
                phase: CollisionPhase::BroadPhase,
                fixture1: pair.0,
                fixture2: pair.1,
            },
        ) {
            return;
        }

        // Joined bodies only collide when every joint between them allows it
        let joined = self.joints.values().any(|entry| {
            let body1 = entry.joint.body1();
            let body2 = entry.joint.body2();

            !entry.joint.collision_allowed()
                && ((body1 == pair.0.body && body2 == Some(pair.1.body))
                    || (body1 == pair.1.body && body2 == Some(pair.0.body)))
        });
        if joined {
            return;
        }

        let outcome = {
            let (Some(body1), Some(body2)) =
                (self.bodies.get(pair.0.body), self.bodies.get(pair.1.body))
            else {
                return;
            };

            // Pairs fully at rest keep their warm contact untouched
            let resting1 = body1.is_asleep() || !body1.is_dynamic();
            let resting2 = body2.is_asleep() || !body2.is_dynamic();
            if resting1 && resting2 {
                self.contacts.refresh(pair);
                return;
            }

            let (Some(fixture1), Some(fixture2)) =
                (body1.fixture(pair.0.index), body2.fixture(pair.1.index))
            else {
                return;
            };

            let iso1 = body1.transform();
            let iso2 = body2.transform();
            let Some(penetration) =
                collision::detect(fixture1.shape(), iso1, fixture2.shape(), iso2)
            else {
                return;
            };

            if !event::emit_veto(
                &mut self.handlers.collision,
                &CollisionCandidate {
                    phase: CollisionPhase::NarrowPhase,
                    fixture1: pair.0,
                    fixture2: pair.1,
                },
            ) {
                return;
            }

            let Some(manifold) =
                manifold::solve(&penetration, fixture1.shape(), iso1, fixture2.shape(), iso2)
            else {
                // Clipping degenerated, skip the pair this step
                self.warn_pair(pair);
                return;
            };

            if !event::emit_veto(
                &mut self.handlers.collision,
                &CollisionCandidate {
                    phase: CollisionPhase::Manifold,
                    fixture1: pair.0,
                    fixture2: pair.1,
                },
            ) {
                return;
            }

            let sensor = fixture1.is_sensor() || fixture2.is_sensor();
            let both_sensors = fixture1.is_sensor() && fixture2.is_sensor();

            (
                manifold,
                (fixture1.friction(), fixture2.friction()),
                (fixture1.restitution(), fixture2.restitution()),
                sensor,
                both_sensors,
            )
        };
        let (manifold, friction, restitution, sensor, both_sensors) = outcome;

        let change = self.contacts.update(
            pair,
            pair.0.body,
            pair.1.body,
            &manifold,
            friction,
            restitution,
            sensor,
            both_sensors,
        );

        let mut points = ArrayVec::new();
        for point in &manifold.points {
            points.push((point.point, point.depth));
        }
        let contact_event = ContactEvent {
            fixture1: pair.0,
            fixture2: pair.1,
            normal: manifold.normal,
            points,
            sensor,
        };

        match change {
            ContactChange::Begun => {
                for key in [pair.0.body, pair.1.body] {
                    self.bodies[key].wake();
                }
                event::emit(&mut self.handlers.contact_begin, &contact_event);
            }
            ContactChange::Persisted => {
                // Pure sensor overlaps only report begin and end
                if !both_sensors {
                    event::emit(&mut self.handlers.contact_persist, &contact_event);
                }
            }
        }
    }

    /// Degenerate-pair warning, at most once per pair per simulated second.
    fn warn_pair(&mut self, pair: ContactPair) {
        let last = self.warned.get(&pair).copied();
        if last.map_or(true, |last| self.sim_time - last >= 1.0) {
            log::warn!("collision between {pair:?} failed to produce a manifold, skipping");
            self.warned.insert(pair, self.sim_time);

            event::emit(
                &mut self.handlers.numeric,
                &NumericEvent::PairDegenerate(pair.0, pair.1),
            );
        }
    }

    /// Solve one island's constraints and update its sleep state.
    fn solve_island(&mut self, island: &Island, dt: f64) {
        puffin::profile_scope!("Solve island");

        // Everything connected to an awake body wakes up
        for &key in &island.bodies {
            let body = &mut self.bodies[key];
            if body.is_asleep() {
                body.wake();
            }
        }

        // Integrate forces into velocities
        for &key in &island.bodies {
            let body = &mut self.bodies[key];
            if body.is_dynamic() && body.is_active() {
                body.integrate_velocity(dt, self.gravity);
            }
        }

        // Contact constraint setup with the pre-solve veto
        let mut active = Vec::with_capacity(island.contacts.len());
        for &pair in &island.contacts {
            if self.disabled.contains(&pair) {
                continue;
            }

            let contact = self
                .contacts
                .get(pair)
                .expect("island contact disappeared");
            let mut points = ArrayVec::new();
            for point in &contact.points {
                points.push((point.point, point.depth));
            }
            let contact_event = ContactEvent {
                fixture1: pair.0,
                fixture2: pair.1,
                normal: contact.normal,
                points,
                sensor: contact.sensor,
            };

            if !event::emit_veto(&mut self.handlers.pre_solve, &contact_event) {
                self.disabled.insert(pair);
                continue;
            }

            let contact = self
                .contacts
                .get_mut(pair)
                .expect("island contact disappeared");
            solver::initialize(contact, &mut self.bodies, &self.settings);
            active.push(pair);
        }

        for &key in &island.joints {
            let entry = self.joints.get_mut(key).expect("island joint disappeared");
            entry.joint.initialize(&mut self.bodies, &self.settings, dt);
        }

        // Velocity iterations
        for _ in 0..self.settings.velocity_iterations {
            for &pair in &active {
                let contact = self
                    .contacts
                    .get_mut(pair)
                    .expect("island contact disappeared");
                solver::solve_velocity(contact, &mut self.bodies);
            }
            for &key in &island.joints {
                let entry = self.joints.get_mut(key).expect("island joint disappeared");
                entry.joint.solve_velocity(&mut self.bodies, dt);
            }
        }

        // Integrate velocities into positions
        for &key in &island.bodies {
            let body = &mut self.bodies[key];
            if body.is_dynamic() && body.is_active() {
                body.integrate_position(dt, &self.settings);
            }
        }

        // Position iterations with an early out once everything is settled
        for _ in 0..self.settings.position_iterations {
            let mut worst: f64 = 0.0;
            let mut joints_solved = true;

            for &pair in &active {
                let contact = self
                    .contacts
                    .get_mut(pair)
                    .expect("island contact disappeared");
                worst = worst.max(solver::solve_position(contact, &mut self.bodies, &self.settings));
            }
            for &key in &island.joints {
                let entry = self.joints.get_mut(key).expect("island joint disappeared");
                joints_solved &= entry.joint.solve_position(&mut self.bodies, &self.settings);
            }

            if worst <= 3.0 * self.settings.linear_slop && joints_solved {
                break;
            }
        }

        self.update_island_sleep(island, dt);

        // Impulse report after the solve
        for &pair in &active {
            let contact = self.contacts.get(pair).expect("island contact disappeared");

            let mut points = ArrayVec::new();
            for point in &contact.points {
                points.push((point.point, point.normal_impulse, point.tangent_impulse));
            }
            event::emit(
                &mut self.handlers.post_solve,
                &SolvedContactEvent {
                    fixture1: pair.0,
                    fixture2: pair.1,
                    normal: contact.normal,
                    points,
                },
            );
        }
    }

    /// Track rest time per body and put the whole island to sleep together.
    fn update_island_sleep(&mut self, island: &Island, dt: f64) {
        let linear = self.settings.sleep_linear_velocity * self.settings.sleep_linear_velocity;
        let angular = self.settings.sleep_angular_velocity;

        let mut island_rest = f64::MAX;
        for &key in &island.bodies {
            let body = &mut self.bodies[key];
            if !body.is_dynamic() {
                continue;
            }

            let resting = body.auto_sleep()
                && body.velocity().magnitude_squared() < linear
                && body.angular_velocity().abs() < angular;
            if resting {
                body.sleep_time += dt;
            } else {
                body.sleep_time = 0.0;
            }
            island_rest = island_rest.min(body.sleep_time);
        }

        // The island sleeps as a whole or not at all
        if island_rest != f64::MAX && island_rest >= self.settings.sleep_time {
            for &key in &island.bodies {
                let body = &mut self.bodies[key];
                if body.is_dynamic() {
                    body.sleep();
                }
            }
        }
    }

    /// Deactivate bodies that left the bounds.
    fn check_bounds(&mut self) {
        let Some(bounds) = self.bounds else {
            return;
        };

        let keys = self.bodies.keys().collect::<Vec<_>>();
        for key in keys {
            let body = &mut self.bodies[key];
            if !body.is_active() {
                continue;
            }
            let Some(aabr) = body.aabr() else {
                continue;
            };

            if bounds.is_outside(aabr) {
                body.set_active(false);
                event::emit(&mut self.handlers.bounds, &key);
            }
        }
    }

    /// Contain NaN state before it can spread to other bodies.
    fn check_poison(&mut self) {
        let keys = self.bodies.keys().collect::<Vec<_>>();
        for key in keys {
            if self.bodies[key].poison_if_degenerate() {
                log::warn!("body {key:?} turned non-finite, deactivated");
                event::emit(&mut self.handlers.numeric, &NumericEvent::BodyPoisoned(key));
            }
        }
    }

    /// Translate the whole world, bodies, joints and bounds included.
    pub fn shift(&mut self, offset: Vec2<f64>) -> Result<()> {
        check_finite("offset.x", offset.x)?;
        check_finite("offset.y", offset.y)?;

        for body in self.bodies.values_mut() {
            body.transform.pos += offset;
            body.transform0.pos += offset;
        }
        for entry in self.joints.values_mut() {
            entry.joint.shift(offset);
        }
        if let Some(bounds) = &mut self.bounds {
            bounds.translate(offset);
        }

        Ok(())
    }

    /// All fixtures whose bounding box overlaps the queried one.
    pub fn detect(&self, aabr: Aabr<f64>) -> Vec<FixtureId> {
        self.broad_phase.query(aabr)
    }

    /// Cast a ray against every matching fixture, hits sorted near to far.
    pub fn raycast(&self, ray: &Ray, max_distance: f64, filter: Option<&Filter>) -> Vec<RaycastHit> {
        let mut hits = Vec::new();

        for (key, body) in self.bodies.iter() {
            if !body.is_active() {
                continue;
            }
            let transform = body.transform();

            for (index, fixture) in body.fixtures().iter().enumerate() {
                if let Some(filter) = filter {
                    if !filter.allows(&fixture.filter()) {
                        continue;
                    }
                }

                if let Some(hit) =
                    collision::raycast::raycast(fixture.shape(), transform, ray, max_distance)
                {
                    hits.push(RaycastHit {
                        fixture: FixtureId {
                            body: key,
                            index: index as u32,
                        },
                        hit,
                    });
                }
            }
        }

        hits.sort_unstable_by(|a, b| {
            a.hit
                .distance
                .partial_cmp(&b.hit.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        hits
    }

    /// The nearest ray hit, if any.
    pub fn raycast_closest(
        &self,
        ray: &Ray,
        max_distance: f64,
        filter: Option<&Filter>,
    ) -> Option<RaycastHit> {
        self.raycast(ray, max_distance, filter).into_iter().next()
    }

    /// Whether two bodies share a live non-sensor contact.
    pub fn in_contact(&self, a: BodyKey, b: BodyKey) -> bool {
        self.contacts.bodies_in_contact(a, b)
    }

    /// All bodies joined to the given one by any joint.
    pub fn joined_bodies(&self, key: BodyKey) -> Vec<BodyKey> {
        let mut joined = Vec::new();

        for entry in self.joints.values() {
            let body1 = entry.joint.body1();
            let body2 = entry.joint.body2();

            if body1 == key {
                if let Some(body2) = body2 {
                    joined.push(body2);
                }
            } else if body2 == Some(key) {
                joined.push(body1);
            }
        }

        joined
    }

    /// All bodies touching the given one through a contact.
    pub fn bodies_in_contact(&self, key: BodyKey, include_sensors: bool) -> Vec<BodyKey> {
        let mut touching = Vec::new();

        for contact in self.contacts.iter() {
            if contact.sensor && !include_sensors {
                continue;
            }

            if contact.body1 == key {
                touching.push(contact.body2);
            } else if contact.body2 == key {
                touching.push(contact.body1);
            }
        }

        touching
    }

    /// Debug view of a body.
    pub fn snapshot(&self, key: BodyKey) -> Option<BodySnapshot> {
        let body = self.bodies.get(key)?;

        Some(BodySnapshot {
            transform: body.transform(),
            world_center: body.world_center(),
            aabr: body.aabr(),
            active: body.is_active(),
            asleep: body.is_asleep(),
            bullet: body.is_bullet(),
        })
    }

    /// Debug view of every live contact point.
    pub fn contact_points(&self) -> Vec<ContactSnapshot> {
        let mut points = Vec::new();

        for contact in self.contacts.iter() {
            for point in &contact.points {
                points.push(ContactSnapshot {
                    pair: contact.pair,
                    point: point.point,
                    normal: contact.normal,
                    depth: point.depth,
                    id: point.id,
                });
            }
        }

        points
    }

    /// Amount of live contacts.
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("bodies", &self.bodies.len())
            .field("joints", &self.joints.len())
            .field("contacts", &self.contacts.len())
            .field("step_count", &self.step_count)
            .finish_non_exhaustive()
    }
}
