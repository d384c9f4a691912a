//! Mutable point-region quadtree.
//!
//! Each node is either a leaf holding entries keyed by a [`UnitKey`], or is
//! divided into four children that exactly partition its bounds. A leaf
//! subdivides when an insertion would take it past
//! [`Config::node_capacity`] entries, unless it already sits at
//! [`Config::max_depth`]. Nodes never merge back after a subdivision.
//!
//! All query strategies walk the tree depth first, children in NW, NE, SW,
//! SE order, and visit leaf entries in map order, so for a given tree state
//! they report the same matches in the same order.
//!
//! A [`QueryIter`] borrows the tree, so the tree cannot be changed while a
//! lazy query is suspended.

mod config;
mod dump;
mod extent;
mod key;
mod node;
mod query;

pub use config::Config;
pub use key::{NodeInfo, PositionKey, UnitKey};
pub use query::QueryIter;

pub(crate) use extent::Extent;

use crate::error::{QuadtreeError, QuadtreeResult};
use common::shapes::Aabb;
use common::Vec2;
use node::{Ctx, Detach, QuadNode};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The position lies outside the tree bounds. Nothing was stored.
    Rejected,
    /// A new entry was stored and the size grew by one.
    Added,
    /// The key already named an entry, which was overwritten in place.
    Existing,
}

impl AddOutcome {
    pub fn is_stored(self) -> bool {
        self != AddOutcome::Rejected
    }
}

pub struct QuadTree<T, K: UnitKey<T> = PositionKey> {
    bounds: Aabb,
    root: QuadNode<T, K::Key>,
    config: Config,
    keys: K,
}

impl<T> QuadTree<T, PositionKey> {
    pub fn new(bounds: Aabb) -> Self {
        Self::with_config(bounds, Config::default())
    }

    pub fn with_config(bounds: Aabb, config: Config) -> Self {
        Self::with_keys(bounds, config, PositionKey)
    }
}

impl<T, K: UnitKey<T>> QuadTree<T, K> {
    pub fn with_keys(bounds: Aabb, config: Config, keys: K) -> Self {
        QuadTree {
            bounds,
            root: QuadNode::new(Extent::from_aabb(&bounds), 0),
            config,
            keys,
        }
    }

    /// Like [`QuadTree::with_keys`], but rejects bounds with non-finite or
    /// negative extents and a zero `node_capacity`.
    pub fn try_with_keys(bounds: Aabb, config: Config, keys: K) -> QuadtreeResult<Self> {
        let valid_bounds = bounds.center.is_finite()
            && bounds.half.is_finite()
            && bounds.half.x >= 0.0
            && bounds.half.y >= 0.0;
        if !valid_bounds {
            return Err(QuadtreeError::InvalidBounds {
                half_width: bounds.half.x,
                half_height: bounds.half.y,
            });
        }
        if config.node_capacity == 0 {
            return Err(QuadtreeError::InvalidConfig {
                node_capacity: config.node_capacity,
            });
        }
        Ok(Self::with_keys(bounds, config, keys))
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    fn contains(&self, position: Vec2) -> bool {
        self.root.extent.contains(position)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn keys(&self) -> &K {
        &self.keys
    }

    /// Number of distinct keys stored in the tree.
    pub fn len(&self) -> usize {
        self.root.size
    }

    pub fn is_empty(&self) -> bool {
        self.root.size == 0
    }

    pub fn add(&mut self, position: Vec2, unit: T) -> AddOutcome {
        if !self.contains(position) {
            return AddOutcome::Rejected;
        }
        let ctx = Ctx {
            config: &self.config,
            keys: &self.keys,
        };
        self.root.add(position, unit, &ctx)
    }

    /// Moves the entry keyed by `(from, unit)` to `to`.
    ///
    /// Returns `false` when either position lies outside the tree or no such
    /// entry exists. The entry stays in its leaf when an insertion at `to`
    /// would land in that same leaf; otherwise it is removed and inserted
    /// again from the root. Landing on a key that is already taken replaces
    /// that entry, so the size drops by one.
    ///
    /// # Panics
    ///
    /// Panics if a removed entry cannot be inserted again, which means the
    /// children of some node no longer cover their parent.
    pub fn relocate(&mut self, from: Vec2, to: Vec2, unit: &T) -> bool {
        if !self.contains(from) || !self.contains(to) {
            return false;
        }
        let ctx = Ctx {
            config: &self.config,
            keys: &self.keys,
        };
        match self.root.detach(from, Some(to), unit, &ctx) {
            Detach::Missing => false,
            Detach::Settled => true,
            Detach::Evicted(stored) => {
                tracing::trace!(?from, ?to, "unit left its node, re-inserting from the root");
                if self.root.add(to, stored, &ctx) == AddOutcome::Rejected {
                    tracing::error!(?to, "relocated unit was rejected by the root");
                    panic!(
                        "quadtree partition broken: ({}, {}) is inside the root bounds but no node accepted it",
                        to.x, to.y
                    );
                }
                true
            }
        }
    }

    /// Removes the entry keyed by `(position, unit)`. Returns whether one
    /// was found.
    pub fn delete(&mut self, position: Vec2, unit: &T) -> bool {
        self.take(position, unit).is_some()
    }

    /// Removes the entry keyed by `(position, unit)` and returns the stored
    /// unit.
    pub fn take(&mut self, position: Vec2, unit: &T) -> Option<T> {
        if !self.contains(position) {
            return None;
        }
        let ctx = Ctx {
            config: &self.config,
            keys: &self.keys,
        };
        match self.root.detach(position, None, unit, &ctx) {
            Detach::Evicted(stored) => Some(stored),
            Detach::Missing | Detach::Settled => None,
        }
    }

    pub fn has(&self, position: Vec2, unit: &T) -> bool {
        self.get(position, unit).is_some()
    }

    /// The stored unit for the entry keyed by `(position, unit)`.
    pub fn get(&self, position: Vec2, unit: &T) -> Option<&T> {
        if !self.contains(position) {
            return None;
        }
        self.root.get(position, unit, &self.keys)
    }

    /// Drops every entry and every child node.
    pub fn clear(&mut self) {
        tracing::debug!(size = self.root.size, "clearing quadtree");
        self.root.clear();
    }

    /// Depth of the deepest node.
    pub fn depth(&self) -> u32 {
        let mut depth = 0;
        self.root.visit_nodes(&mut |node| depth = depth.max(node.depth));
        depth
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.root.visit_nodes(&mut |_| count += 1);
        count
    }

    pub fn all_node_bounding_boxes(&self, bounding_boxes: &mut Vec<Aabb>) {
        self.root
            .visit_nodes(&mut |node| bounding_boxes.push(node.bounds()));
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        self.root.check_invariants(&self.config);
    }
}

impl<T, K: UnitKey<T>> fmt::Debug for QuadTree<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuadTree")
            .field("bounds", &self.bounds)
            .field("size", &self.root.size)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::shapes::ShapeEnum;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn world() -> Aabb {
        Aabb::new(Vec2::new(500.0, 500.0), Vec2::new(500.0, 500.0))
    }

    #[test]
    fn size_tracks_every_node_through_random_edits() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut qt: QuadTree<u32> = QuadTree::new(world());
        let mut stored: Vec<Vec2> = Vec::new();

        for i in 0..2000u32 {
            match rng.gen_range(0..3) {
                0 | 1 => {
                    let point = world().random_point_inside(&mut rng);
                    if qt.add(point, i) == AddOutcome::Added {
                        stored.push(point);
                    }
                }
                _ if !stored.is_empty() => {
                    let index = rng.gen_range(0..stored.len());
                    let from = stored[index];
                    if rng.gen_bool(0.5) {
                        assert!(qt.delete(from, &0));
                        stored.swap_remove(index);
                    } else {
                        let to = world().random_point_inside(&mut rng);
                        if qt.has(to, &0) {
                            continue;
                        }
                        assert!(qt.relocate(from, to, &0));
                        stored[index] = to;
                    }
                }
                _ => {}
            }
            qt.check_invariants();
        }
        assert_eq!(qt.len(), stored.len());
    }

    #[test]
    fn leaves_stop_splitting_at_max_depth() {
        let config = Config {
            node_capacity: 1,
            max_depth: 3,
        };
        let mut qt: QuadTree<u32> = QuadTree::with_config(world(), config);
        for i in 0..50u32 {
            qt.add(Vec2::new(1.0 + i as f32 * 0.01, 1.0), i);
        }
        assert_eq!(qt.len(), 50);
        assert_eq!(qt.depth(), 3);
        qt.check_invariants();
    }

    #[test]
    fn subdivision_keeps_size() {
        let mut qt: QuadTree<u32> = QuadTree::new(world());
        for i in 0..8u32 {
            qt.add(Vec2::new(100.0 + i as f32, 100.0), i);
        }
        assert_eq!(qt.node_count(), 1);
        qt.add(Vec2::new(900.0, 900.0), 8);
        assert_eq!(qt.node_count(), 5);
        assert_eq!(qt.len(), 9);
        qt.check_invariants();
    }

    #[test]
    fn relocation_onto_an_occupied_key_replaces_it() {
        let mut qt: QuadTree<u32> = QuadTree::new(world());
        qt.add(Vec2::new(10.0, 10.0), 1);
        qt.add(Vec2::new(20.0, 20.0), 2);
        assert!(qt.relocate(Vec2::new(10.0, 10.0), Vec2::new(20.0, 20.0), &1));
        assert_eq!(qt.len(), 1);
        assert_eq!(qt.get(Vec2::new(20.0, 20.0), &0), Some(&1));
        qt.check_invariants();
    }

    fn skewed() -> Aabb {
        Aabb::new(Vec2::new(649.905, 948.489), Vec2::new(619.351, 537.121))
    }

    #[test]
    fn points_on_edges_and_split_lines_are_kept() {
        let config = Config {
            node_capacity: 1,
            max_depth: 8,
        };
        let mut rng = StdRng::seed_from_u64(41);
        for _ in 0..100 {
            let bounds = Aabb::new(
                Vec2::new(rng.gen_range(-1000.0..1000.0), rng.gen_range(-1000.0..1000.0)),
                Vec2::new(rng.gen_range(0.1..1000.0), rng.gen_range(0.1..1000.0)),
            );
            let mut qt: QuadTree<u32> = QuadTree::with_config(bounds, config);
            let mut next = 0;
            for _ in 0..3 {
                let mut boxes = vec![bounds];
                qt.all_node_bounding_boxes(&mut boxes);
                for aabb in boxes {
                    for x in [aabb.left(), aabb.center.x, aabb.right()] {
                        for y in [aabb.top(), aabb.center.y, aabb.bottom()] {
                            let point = Vec2::new(x, y);
                            if !bounds.contains_point(point) {
                                continue;
                            }
                            let outcome = qt.add(point, next);
                            assert_ne!(outcome, AddOutcome::Rejected, "{point:?} in {bounds:?}");
                            assert!(qt.has(point, &next));
                            next += 1;
                        }
                    }
                }
                qt.check_invariants();
            }
            assert_eq!(qt.len(), qt.query_count(None));
        }
    }

    #[test]
    fn relocation_onto_the_far_edges() {
        let config = Config {
            node_capacity: 1,
            max_depth: 8,
        };
        let bounds = skewed();
        let mut rng = StdRng::seed_from_u64(13);
        let mut qt: QuadTree<u32> = QuadTree::with_config(bounds, config);
        let mut stored = Vec::new();
        for i in 0..200u32 {
            let point = bounds.random_point_inside(&mut rng);
            if qt.add(point, i) == AddOutcome::Added {
                stored.push(point);
            }
        }

        for from in stored.iter_mut() {
            let to = if rng.gen_bool(0.5) {
                Vec2::new(bounds.right(), rng.gen_range(bounds.top()..=bounds.bottom()))
            } else {
                Vec2::new(rng.gen_range(bounds.left()..=bounds.right()), bounds.bottom())
            };
            if qt.has(to, &0) {
                continue;
            }
            assert!(qt.relocate(*from, to, &0));
            assert!(qt.has(to, &0));
            *from = to;
            qt.check_invariants();
        }
        assert_eq!(qt.len(), stored.len());
    }

    #[test]
    fn node_dependent_keys_keep_ancestor_sizes() {
        let config = Config {
            node_capacity: 2,
            max_depth: 8,
        };
        let shallow_only = |_: Vec2, unit: &u32, node: NodeInfo| {
            if node.depth <= 1 {
                *unit
            } else {
                0
            }
        };
        let mut qt = QuadTree::with_keys(world(), config, shallow_only);
        for (i, x) in [10.0, 20.0, 30.0, 40.0].into_iter().enumerate() {
            qt.add(Vec2::new(x, x), i as u32 + 1);
            qt.check_invariants();
        }
        assert_eq!(qt.len(), qt.query_count(None));
        assert_eq!(qt.len(), 1);
    }

    #[test]
    fn relocation_onto_a_shared_edge_keeps_keys_unique() {
        let config = Config {
            node_capacity: 1,
            max_depth: 8,
        };
        let mut qt: QuadTree<u32> = QuadTree::with_config(world(), config);
        qt.add(Vec2::new(100.0, 100.0), 0);
        qt.add(Vec2::new(700.0, 100.0), 1);

        // x = 500 is the root's split line and belongs to the west side.
        assert!(qt.relocate(Vec2::new(700.0, 100.0), Vec2::new(500.0, 100.0), &1));
        qt.check_invariants();
        assert_eq!(qt.add(Vec2::new(500.0, 100.0), 2), AddOutcome::Existing);
        assert_eq!(qt.len(), 2);
        let hits = qt.query_vec(Some(&ShapeEnum::circle(Vec2::new(500.0, 100.0), 0.5)));
        assert_eq!(hits, vec![(Vec2::new(500.0, 100.0), &2)]);
        qt.check_invariants();
    }

    #[test]
    fn clear_after_deep_split_resets() {
        let config = Config {
            node_capacity: 1,
            max_depth: 8,
        };
        let mut qt: QuadTree<u32> = QuadTree::with_config(world(), config);
        for i in 0..64u32 {
            qt.add(Vec2::new(3.0 + i as f32 * 0.001, 3.0), i);
        }
        assert_eq!(qt.depth(), 8);
        qt.clear();
        assert_eq!(qt.len(), 0);
        assert_eq!(qt.node_count(), 1);
        assert!(qt
            .query_vec(Some(&ShapeEnum::square(Vec2::new(500.0, 500.0), 500.0)))
            .is_empty());
        qt.check_invariants();
    }
}
