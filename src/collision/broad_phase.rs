//! Sweep-and-prune broad phase over fixture bounding boxes.

use std::collections::HashMap;

use itertools::Itertools;
use vek::Aabr;

use crate::dynamics::fixture::FixtureId;

use super::filter::Filter;

/// Long-lived broad phase entry for a single fixture.
#[derive(Debug, Clone, Copy)]
pub struct Proxy {
    /// Current world bounding box.
    pub aabr: Aabr<f64>,
    /// Collision filter of the fixture.
    pub filter: Filter,
    /// Whether the owning body responds to forces.
    pub dynamic: bool,
    /// Inactive bodies are skipped by pair detection.
    pub active: bool,
}

/// Spatial index producing candidate fixture pairs.
///
/// Entries persist across steps and must be removed explicitly when a
/// fixture leaves the world. Pair detection sorts entries along the x axis
/// once per query and sweeps.
#[derive(Debug, Default)]
pub struct BroadPhase {
    /// All tracked fixtures.
    proxies: HashMap<FixtureId, Proxy>,
    /// Cache of detected pairs.
    ///
    /// This is a performance optimization so the vector doesn't have to be
    /// allocated every step.
    pairs: Vec<(FixtureId, FixtureId)>,
    /// Sort scratch, kept for the same reason.
    scratch: Vec<FixtureId>,
}

impl BroadPhase {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh the entry for a fixture.
    pub fn update(&mut self, id: FixtureId, proxy: Proxy) {
        self.proxies.insert(id, proxy);
    }

    /// Remove the entry for a fixture.
    pub fn remove(&mut self, id: FixtureId) {
        self.proxies.remove(&id);
    }

    /// Remove every entry of a body.
    pub fn remove_body(&mut self, body: crate::dynamics::body::BodyKey) {
        self.proxies.retain(|id, _| id.body != body);
    }

    /// Amount of tracked fixtures.
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    /// Whether no fixture is tracked.
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// All fixtures whose bounding box overlaps the queried one.
    pub fn query(&self, aabr: Aabr<f64>) -> Vec<FixtureId> {
        self.proxies
            .iter()
            .filter(|(_, proxy)| proxy.aabr.collides_with_aabr(aabr))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Candidate pairs of overlapping fixtures, without duplicates.
    ///
    /// Pairs within one body, filtered-out pairs and pairs where neither
    /// side is dynamic are excluded. Each pair is ordered by fixture id.
    pub fn detect(&mut self) -> &[(FixtureId, FixtureId)] {
        puffin::profile_function!();

        self.pairs.clear();

        self.scratch.clear();
        self.scratch.extend(
            self.proxies
                .iter()
                .filter(|(_, proxy)| proxy.active)
                .map(|(id, _)| *id)
                .sorted_by(|a, b| {
                    let min_a = self.proxies[a].aabr.min.x;
                    let min_b = self.proxies[b].aabr.min.x;

                    min_a.partial_cmp(&min_b).unwrap_or(std::cmp::Ordering::Equal)
                }),
        );

        // Sweep along x, every candidate starts before the current ends
        for i in 0..self.scratch.len() {
            let id_a = self.scratch[i];
            let a = self.proxies[&id_a];

            for j in (i + 1)..self.scratch.len() {
                let id_b = self.scratch[j];
                let b = self.proxies[&id_b];

                if b.aabr.min.x > a.aabr.max.x {
                    break;
                }
                if id_a.body == id_b.body {
                    continue;
                }
                if !a.dynamic && !b.dynamic {
                    continue;
                }
                if !a.filter.allows(&b.filter) {
                    continue;
                }
                if a.aabr.min.y > b.aabr.max.y || b.aabr.min.y > a.aabr.max.y {
                    continue;
                }

                if id_a < id_b {
                    self.pairs.push((id_a, id_b));
                } else {
                    self.pairs.push((id_b, id_a));
                }
            }
        }

        &self.pairs
    }
}
