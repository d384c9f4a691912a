use super::{AddOutcome, Config, Extent, NodeInfo, UnitKey};
use common::shapes::{Aabb, ShapeEnum};
use common::Vec2;
use fxhash::FxHashMap;
use std::collections::hash_map;
use std::hash::Hash;

use crate::collision_detection;

#[derive(Debug, Clone)]
pub(crate) struct Entry<T> {
    pub(crate) position: Vec2,
    pub(crate) unit: T,
}

pub(crate) enum NodeKind<T, Q> {
    Leaf(FxHashMap<Q, Entry<T>>),
    // NW, NE, SW, SE.
    Divided(Box<[QuadNode<T, Q>; 4]>),
}

pub(crate) struct QuadNode<T, Q> {
    pub(crate) extent: Extent,
    pub(crate) depth: u32,
    pub(crate) size: usize,
    pub(crate) kind: NodeKind<T, Q>,
}

/// Everything a node needs from its tree. Passed down, never stored.
pub(crate) struct Ctx<'a, K> {
    pub(crate) config: &'a Config,
    pub(crate) keys: &'a K,
}

/// Result of looking up an entry for relocation or removal.
pub(crate) enum Detach<T> {
    Missing,
    // Updated inside the leaf that held it.
    Settled,
    // Removed from the tree; the caller decides where the unit goes next.
    Evicted(T),
}

fn total_size<T, Q>(children: &[QuadNode<T, Q>; 4]) -> usize {
    children.iter().map(|child| child.size).sum()
}

// Every method below expects positions that lie inside the node. The tree
// checks the root; below it, positions are routed with `Extent::quadrant_of`,
// which always picks a child that contains them.
impl<T, Q> QuadNode<T, Q>
where
    Q: Eq + Hash,
{
    pub(crate) fn new(extent: Extent, depth: u32) -> Self {
        QuadNode {
            extent,
            depth,
            size: 0,
            kind: NodeKind::Leaf(FxHashMap::default()),
        }
    }

    pub(crate) fn bounds(&self) -> Aabb {
        self.extent.to_aabb()
    }

    #[inline]
    pub(crate) fn info(&self) -> NodeInfo {
        NodeInfo {
            bounds: self.bounds(),
            depth: self.depth,
        }
    }

    // Sizes are always recomputed from below, so an ancestor stays correct
    // even when a key function folds entries together during a subdivision.
    fn recount(&mut self) {
        self.size = match &self.kind {
            NodeKind::Leaf(entries) => entries.len(),
            NodeKind::Divided(children) => total_size(children),
        };
    }

    fn has_room(&self, config: &Config) -> bool {
        match &self.kind {
            NodeKind::Leaf(entries) => {
                self.depth >= config.max_depth || entries.len() < config.node_capacity
            }
            NodeKind::Divided(_) => false,
        }
    }

    pub(crate) fn add<K>(&mut self, position: Vec2, unit: T, ctx: &Ctx<'_, K>) -> AddOutcome
    where
        K: UnitKey<T, Key = Q>,
    {
        if self.has_room(ctx.config) {
            return self.store(position, unit, ctx.keys);
        }
        self.divide(ctx);

        let index = self.extent.quadrant_of(position);
        let NodeKind::Divided(children) = &mut self.kind else {
            return AddOutcome::Rejected;
        };
        let outcome = children[index].add(position, unit, ctx);
        self.recount();
        outcome
    }

    fn store<K>(&mut self, position: Vec2, unit: T, keys: &K) -> AddOutcome
    where
        K: UnitKey<T, Key = Q>,
    {
        let info = self.info();
        let NodeKind::Leaf(entries) = &mut self.kind else {
            return AddOutcome::Rejected;
        };
        let outcome = match entries.entry(keys.key(position, &unit, info)) {
            hash_map::Entry::Occupied(mut occupied) => {
                *occupied.get_mut() = Entry { position, unit };
                AddOutcome::Existing
            }
            hash_map::Entry::Vacant(vacant) => {
                vacant.insert(Entry { position, unit });
                AddOutcome::Added
            }
        };
        self.recount();
        outcome
    }

    fn divide<K>(&mut self, ctx: &Ctx<'_, K>)
    where
        K: UnitKey<T, Key = Q>,
    {
        let NodeKind::Leaf(entries) = &mut self.kind else {
            return;
        };
        let entries = std::mem::take(entries);
        tracing::trace!(
            depth = self.depth,
            entries = entries.len(),
            "subdividing leaf"
        );

        let depth = self.depth + 1;
        let mut children = Box::new(
            self.extent
                .quadrants()
                .map(|extent| QuadNode::new(extent, depth)),
        );
        for (_, entry) in entries {
            let index = self.extent.quadrant_of(entry.position);
            children[index].add(entry.position, entry.unit, ctx);
        }

        self.kind = NodeKind::Divided(children);
        // Smaller than before when the key function folds entries together
        // one level down.
        self.recount();
    }

    /// Finds the entry keyed by `(from, unit)` and moves it to `to`, or
    /// removes it when `to` is `None`.
    ///
    /// `to` is only handed to a child while it routes to the same child as
    /// `from`, so a leaf that still sees it is the leaf an insertion at `to`
    /// would reach, and keeps the entry. Anywhere else the entry is removed
    /// and returned as [`Detach::Evicted`].
    pub(crate) fn detach<K>(
        &mut self,
        from: Vec2,
        to: Option<Vec2>,
        unit: &T,
        ctx: &Ctx<'_, K>,
    ) -> Detach<T>
    where
        K: UnitKey<T, Key = Q>,
    {
        let info = self.info();
        let outcome = match &mut self.kind {
            NodeKind::Leaf(entries) => {
                let old_key = ctx.keys.key(from, unit, info);
                match to {
                    Some(to) => {
                        let new_key = ctx.keys.key(to, unit, info);
                        if new_key == old_key {
                            match entries.get_mut(&old_key) {
                                Some(entry) => {
                                    entry.position = to;
                                    Detach::Settled
                                }
                                None => Detach::Missing,
                            }
                        } else {
                            match entries.remove(&old_key) {
                                Some(mut entry) => {
                                    entry.position = to;
                                    // Replaces whatever `new_key` named.
                                    entries.insert(new_key, entry);
                                    Detach::Settled
                                }
                                None => Detach::Missing,
                            }
                        }
                    }
                    None => match entries.remove(&old_key) {
                        Some(entry) => Detach::Evicted(entry.unit),
                        None => Detach::Missing,
                    },
                }
            }
            NodeKind::Divided(children) => {
                let index = self.extent.quadrant_of(from);
                let to = to.filter(|to| self.extent.quadrant_of(*to) == index);
                children[index].detach(from, to, unit, ctx)
            }
        };
        self.recount();
        outcome
    }

    // A key only counts as present while its entry still sits at `position`,
    // so a key overwritten or moved elsewhere stops matching its old spot.
    pub(crate) fn get<K>(&self, position: Vec2, unit: &T, keys: &K) -> Option<&T>
    where
        K: UnitKey<T, Key = Q>,
    {
        match &self.kind {
            NodeKind::Leaf(entries) => entries
                .get(&keys.key(position, unit, self.info()))
                .filter(|entry| entry.position == position)
                .map(|entry| &entry.unit),
            NodeKind::Divided(children) => {
                children[self.extent.quadrant_of(position)].get(position, unit, keys)
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.kind = NodeKind::Leaf(FxHashMap::default());
        self.size = 0;
    }

    /// Depth-first fold over matching entries: children in NW, NE, SW, SE
    /// order, leaf entries in map order. `index` runs across the whole walk.
    pub(crate) fn fold_matches<'a, A, F>(
        &'a self,
        shape: Option<&ShapeEnum>,
        index: &mut usize,
        mut acc: A,
        f: &mut F,
    ) -> A
    where
        F: FnMut(A, usize, Vec2, &'a T) -> A,
    {
        if !collision_detection::may_contain_matches(shape, &self.extent) {
            return acc;
        }
        match &self.kind {
            NodeKind::Leaf(entries) => {
                for entry in entries.values() {
                    if collision_detection::matches(shape, entry.position) {
                        acc = f(acc, *index, entry.position, &entry.unit);
                        *index += 1;
                    }
                }
            }
            NodeKind::Divided(children) => {
                for child in children.iter() {
                    acc = child.fold_matches(shape, index, acc, f);
                }
            }
        }
        acc
    }

    pub(crate) fn visit_nodes<F>(&self, f: &mut F)
    where
        F: FnMut(&QuadNode<T, Q>),
    {
        f(self);
        if let NodeKind::Divided(children) = &self.kind {
            for child in children.iter() {
                child.visit_nodes(f);
            }
        }
    }
}

#[cfg(test)]
impl<T, Q> QuadNode<T, Q>
where
    Q: Eq + Hash,
{
    fn visit_entries<F>(&self, f: &mut F)
    where
        F: FnMut(&Entry<T>),
    {
        match &self.kind {
            NodeKind::Leaf(entries) => {
                for entry in entries.values() {
                    f(entry);
                }
            }
            NodeKind::Divided(children) => {
                for child in children.iter() {
                    child.visit_entries(f);
                }
            }
        }
    }

    /// Walks the subtree asserting the structural invariants and returns the
    /// number of entries found.
    pub(crate) fn check_invariants(&self, config: &Config) -> usize {
        let count = match &self.kind {
            NodeKind::Leaf(entries) => {
                for entry in entries.values() {
                    assert!(
                        self.extent.contains(entry.position),
                        "entry at {:?} stored outside {:?}",
                        entry.position,
                        self.extent
                    );
                }
                if self.depth < config.max_depth {
                    assert!(entries.len() <= config.node_capacity);
                }
                entries.len()
            }
            NodeKind::Divided(children) => {
                assert!(self.depth < config.max_depth, "divided at max depth");
                let quadrants = self.extent.quadrants();
                let mut total = 0;
                for (index, (child, quadrant)) in children.iter().zip(quadrants).enumerate() {
                    assert_eq!(child.extent, quadrant);
                    assert_eq!(child.depth, self.depth + 1);
                    child.visit_entries(&mut |entry| {
                        assert_eq!(
                            self.extent.quadrant_of(entry.position),
                            index,
                            "entry at {:?} sits in the wrong child at depth {}",
                            entry.position,
                            self.depth
                        );
                    });
                    total += child.check_invariants(config);
                }
                total
            }
        };
        assert_eq!(self.size, count, "size out of sync at depth {}", self.depth);
        count
    }
}
