//! Set of units indexed by a position read from the units themselves.
//!
//! [`QuadTreeSet`] keeps no position of its own: every call reads the unit's
//! position through the getter given at construction. To move a unit, call
//! [`QuadTreeSet::relocate`] with the unit as it was stored, then update
//! whatever the getter reads, so later lookups see the new position.

use crate::error::{QuadtreeError, QuadtreeResult};
use crate::quadtree::{AddOutcome, Config, PositionKey, QuadTree, QueryIter, UnitKey};
use common::shapes::{Aabb, ShapeEnum};
use common::Vec2;
use std::fmt;

pub struct QuadTreeSet<T, P, K: UnitKey<T> = PositionKey> {
    tree: QuadTree<T, K>,
    position_of: P,
}

impl<T, P> QuadTreeSet<T, P, PositionKey>
where
    P: Fn(&T) -> Vec2,
{
    pub fn new(bounds: Aabb, position_of: P) -> Self {
        Self::with_config(bounds, Config::default(), position_of)
    }

    pub fn with_config(bounds: Aabb, config: Config, position_of: P) -> Self {
        Self::with_keys(bounds, config, PositionKey, position_of)
    }
}

impl<T, P, K> QuadTreeSet<T, P, K>
where
    P: Fn(&T) -> Vec2,
    K: UnitKey<T>,
{
    pub fn with_keys(bounds: Aabb, config: Config, keys: K, position_of: P) -> Self {
        QuadTreeSet {
            tree: QuadTree::with_keys(bounds, config, keys),
            position_of,
        }
    }

    pub fn tree(&self) -> &QuadTree<T, K> {
        &self.tree
    }

    pub fn bounds(&self) -> Aabb {
        self.tree.bounds()
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Stores `unit` at the position its getter reports.
    ///
    /// Unlike [`QuadTree::add`], a position outside the bounds is an error
    /// rather than an outcome.
    pub fn add(&mut self, unit: T) -> QuadtreeResult<AddOutcome> {
        let position = (self.position_of)(&unit);
        match self.tree.add(position, unit) {
            AddOutcome::Rejected => {
                tracing::debug!(?position, "unit lies outside the set bounds");
                Err(QuadtreeError::OutOfBounds {
                    x: position.x,
                    y: position.y,
                })
            }
            outcome => Ok(outcome),
        }
    }

    /// Moves `unit` from the position its getter currently reports to `to`.
    /// The stored unit itself is left untouched.
    pub fn relocate(&mut self, unit: &T, to: Vec2) -> bool {
        let from = (self.position_of)(unit);
        self.tree.relocate(from, to, unit)
    }

    pub fn delete(&mut self, unit: &T) -> bool {
        let position = (self.position_of)(unit);
        self.tree.delete(position, unit)
    }

    pub fn take(&mut self, unit: &T) -> Option<T> {
        let position = (self.position_of)(unit);
        self.tree.take(position, unit)
    }

    pub fn has(&self, unit: &T) -> bool {
        self.tree.has((self.position_of)(unit), unit)
    }

    pub fn get(&self, unit: &T) -> Option<&T> {
        self.tree.get((self.position_of)(unit), unit)
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    pub fn iter(&self) -> Units<'_, T, K::Key> {
        self.query_iter(None)
    }

    pub fn values(&self) -> Units<'_, T, K::Key> {
        self.iter()
    }

    /// Same as [`QuadTreeSet::values`]: a set's keys are its units.
    pub fn keys(&self) -> Units<'_, T, K::Key> {
        self.iter()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&T, &T)> + '_ {
        self.iter().map(|unit| (unit, unit))
    }

    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&T),
    {
        self.tree.query_fold(None, (), |(), _, _, unit| f(unit));
    }

    pub fn query_iter(&self, shape: Option<&ShapeEnum>) -> Units<'_, T, K::Key> {
        Units {
            inner: self.tree.query_iter(shape),
        }
    }

    pub fn query_fold<'a, A, F>(&'a self, shape: Option<&ShapeEnum>, init: A, mut f: F) -> A
    where
        F: FnMut(A, usize, &'a T) -> A,
    {
        self.tree
            .query_fold(shape, init, |acc, index, _, unit| f(acc, index, unit))
    }

    pub fn query_vec(&self, shape: Option<&ShapeEnum>) -> Vec<&T> {
        self.tree.query_map(shape, |_, _, unit| unit)
    }

    pub fn query_for_each<F>(&self, shape: Option<&ShapeEnum>, mut f: F)
    where
        F: FnMut(usize, &T),
    {
        self.tree
            .query_for_each(shape, |index, _, unit| f(index, unit));
    }

    pub fn query_map<'a, U, F>(&'a self, shape: Option<&ShapeEnum>, mut f: F) -> Vec<U>
    where
        F: FnMut(usize, &'a T) -> U,
    {
        self.tree.query_map(shape, |index, _, unit| f(index, unit))
    }

    pub fn query_count(&self, shape: Option<&ShapeEnum>) -> usize {
        self.tree.query_count(shape)
    }
}

impl<T, P, K: UnitKey<T>> fmt::Debug for QuadTreeSet<T, P, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuadTreeSet")
            .field("tree", &self.tree)
            .finish_non_exhaustive()
    }
}

/// Units of a [`QuadTreeSet`] in query order.
#[derive(Debug)]
pub struct Units<'a, T, Q> {
    inner: QueryIter<'a, T, Q>,
}

impl<'a, T, Q> Iterator for Units<'a, T, Q> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        self.inner.next().map(|(_, unit)| unit)
    }
}

impl<'a, T, P, K> IntoIterator for &'a QuadTreeSet<T, P, K>
where
    P: Fn(&T) -> Vec2,
    K: UnitKey<T>,
{
    type Item = &'a T;
    type IntoIter = Units<'a, T, K::Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
