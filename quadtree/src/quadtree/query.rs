use super::node::{Entry, NodeKind, QuadNode};
use super::{QuadTree, UnitKey};
use crate::collision_detection;
use crate::sequence::{Compose, Cursor, Predicate, Source};
use common::shapes::ShapeEnum;
use common::Vec2;
use smallvec::SmallVec;
use std::collections::hash_map;
use std::fmt;

type Entries<'a, T, Q> = hash_map::Values<'a, Q, Entry<T>>;
type Hit<'a, T> = (Vec2, &'a T);
type LeafScan<'a, T, Q> = Compose<
    Entries<'a, T, Q>,
    fn() -> Entries<'a, T, Q>,
    ShapeFilter,
    fn(usize, &'a Entry<T>) -> Hit<'a, T>,
>;

// Deep enough for max_depth 8 without spilling: at most three pending
// siblings per level plus the node being expanded.
type NodeStack<'a, T, Q> = SmallVec<[&'a QuadNode<T, Q>; 32]>;

#[derive(Debug, Clone, Copy)]
struct ShapeFilter(Option<ShapeEnum>);

impl<'a, T> Predicate<&'a Entry<T>> for ShapeFilter {
    fn test(&mut self, entry: &&'a Entry<T>) -> bool {
        collision_detection::matches(self.0.as_ref(), entry.position)
    }
}

fn hit<T>(_index: usize, entry: &Entry<T>) -> Hit<'_, T> {
    (entry.position, &entry.unit)
}

/// Lazy query over a tree. Each call to `next` resumes the depth-first walk
/// exactly where the previous one stopped, at the next matching entry.
///
/// Yields `(position, unit)` in the same order as the eager queries.
pub struct QueryIter<'a, T, Q> {
    shape: Option<ShapeEnum>,
    stack: NodeStack<'a, T, Q>,
    leaf: Option<LeafScan<'a, T, Q>>,
    cursor: Cursor,
}

impl<'a, T, Q> QueryIter<'a, T, Q> {
    pub(crate) fn new(root: &'a QuadNode<T, Q>, shape: Option<&ShapeEnum>) -> Self {
        let mut stack = NodeStack::new();
        stack.push(root);
        QueryIter {
            shape: shape.copied(),
            stack,
            leaf: None,
            cursor: Cursor::new(),
        }
    }

    /// Number of matches yielded so far.
    pub fn matched(&self) -> usize {
        self.cursor.get()
    }
}

impl<'a, T, Q> Iterator for QueryIter<'a, T, Q> {
    type Item = (Vec2, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(leaf) = &mut self.leaf {
                if let Some(found) = leaf.next() {
                    return Some(found);
                }
                self.leaf = None;
            }

            let node = self.stack.pop()?;
            if !collision_detection::may_contain_matches(self.shape.as_ref(), &node.extent) {
                continue;
            }
            match &node.kind {
                NodeKind::Leaf(entries) => {
                    let scan: LeafScan<'a, T, Q> =
                        Compose::new([Source::Ready(entries.values())])
                            .filtered(ShapeFilter(self.shape))
                            .mapped(hit as fn(usize, &'a Entry<T>) -> Hit<'a, T>)
                            .with_cursor(self.cursor.clone());
                    self.leaf = Some(scan);
                }
                NodeKind::Divided(children) => {
                    // Reversed so NW is popped first.
                    self.stack.extend(children.iter().rev());
                }
            }
        }
    }
}

impl<'a, T, Q> fmt::Debug for QueryIter<'a, T, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryIter")
            .field("shape", &self.shape)
            .field("pending_nodes", &self.stack.len())
            .field("matched", &self.cursor.get())
            .finish()
    }
}

impl<T, K: UnitKey<T>> QuadTree<T, K> {
    /// Lazily walks the entries whose position lies inside `shape`, or all
    /// entries when `shape` is `None`.
    pub fn query_iter(&self, shape: Option<&ShapeEnum>) -> QueryIter<'_, T, K::Key> {
        QueryIter::new(&self.root, shape)
    }

    /// Every entry, in query order.
    pub fn iter(&self) -> QueryIter<'_, T, K::Key> {
        self.query_iter(None)
    }

    /// Folds `f` over the matches. The index passed to `f` starts at 0 and
    /// counts matches across the whole walk.
    pub fn query_fold<'a, A, F>(&'a self, shape: Option<&ShapeEnum>, init: A, mut f: F) -> A
    where
        F: FnMut(A, usize, Vec2, &'a T) -> A,
    {
        let mut index = 0;
        self.root.fold_matches(shape, &mut index, init, &mut f)
    }

    pub fn query_vec(&self, shape: Option<&ShapeEnum>) -> Vec<(Vec2, &T)> {
        self.query_fold(shape, Vec::new(), |mut out, _, position, unit| {
            out.push((position, unit));
            out
        })
    }

    pub fn query_for_each<F>(&self, shape: Option<&ShapeEnum>, mut f: F)
    where
        F: FnMut(usize, Vec2, &T),
    {
        self.query_fold(shape, (), |(), index, position, unit| f(index, position, unit));
    }

    pub fn query_map<'a, U, F>(&'a self, shape: Option<&ShapeEnum>, mut f: F) -> Vec<U>
    where
        F: FnMut(usize, Vec2, &'a T) -> U,
    {
        self.query_fold(shape, Vec::new(), |mut out, index, position, unit| {
            out.push(f(index, position, unit));
            out
        })
    }

    pub fn query_count(&self, shape: Option<&ShapeEnum>) -> usize {
        self.query_fold(shape, 0, |count, _, _, _| count + 1)
    }
}

impl<'a, T, K: UnitKey<T>> IntoIterator for &'a QuadTree<T, K> {
    type Item = (Vec2, &'a T);
    type IntoIter = QueryIter<'a, T, K::Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
