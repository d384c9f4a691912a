//! Shape tests shared by every query strategy, so the lazy and the eager
//! traversals prune and match exactly the same way.

use crate::quadtree::Extent;
use common::shapes::{Shape, ShapeEnum};
use common::Vec2;

// A node whose extent fails this test holds no matches anywhere in its subtree.
#[inline]
pub(crate) fn may_contain_matches(shape: Option<&ShapeEnum>, extent: &Extent) -> bool {
    shape.map_or(true, |shape| extent.overlaps(&shape.bounding_box()))
}

#[inline]
pub(crate) fn matches(shape: Option<&ShapeEnum>, point: Vec2) -> bool {
    shape.map_or(true, |shape| shape.contains_point(point))
}
