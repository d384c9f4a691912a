use common::shapes::Aabb;
use common::Vec2;
use std::hash::Hash;

/// What a key function sees of the node that will hold the entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeInfo {
    pub bounds: Aabb,
    pub depth: u32,
}

/// Maps an entry to the key that decides its identity inside a leaf.
///
/// Two insertions whose keys are equal under the same node are the same
/// entry: the later one overwrites the earlier one instead of adding a second
/// entry. Any `Fn(Vec2, &T, NodeInfo) -> K` works as a key function.
pub trait UnitKey<T> {
    type Key: Eq + Hash;

    fn key(&self, position: Vec2, unit: &T, node: NodeInfo) -> Self::Key;
}

/// Keys entries by their exact coordinates and ignores the unit, so every
/// distinct coordinate is one slot. `-0.0` and `0.0` share a slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionKey;

impl<T> UnitKey<T> for PositionKey {
    type Key = (u32, u32);

    #[inline]
    fn key(&self, position: Vec2, _unit: &T, _node: NodeInfo) -> (u32, u32) {
        ((position.x + 0.0).to_bits(), (position.y + 0.0).to_bits())
    }
}

impl<T, K, F> UnitKey<T> for F
where
    F: Fn(Vec2, &T, NodeInfo) -> K,
    K: Eq + Hash,
{
    type Key = K;

    #[inline]
    fn key(&self, position: Vec2, unit: &T, node: NodeInfo) -> K {
        self(position, unit, node)
    }
}
