use common::shapes::Aabb;
use common::Vec2;

/// Closed box kept as its edges rather than as a center and half-size.
///
/// Children reuse their parent's edges and split lines bit for bit, so the
/// four quadrants cover the parent exactly and every point of the parent
/// routes to exactly one of them. A point on a split line goes to the first
/// quadrant in NW, NE, SW, SE order that touches it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Extent {
    pub(crate) min: Vec2,
    pub(crate) max: Vec2,
}

impl Extent {
    pub(crate) fn from_aabb(aabb: &Aabb) -> Self {
        Extent {
            min: aabb.min(),
            max: aabb.max(),
        }
    }

    pub(crate) fn to_aabb(self) -> Aabb {
        Aabb::from_min_max(self.min, self.max)
    }

    /// Same comparisons as [`Aabb::contains_point`] on the box it was built
    /// from.
    #[inline]
    pub(crate) fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    #[inline]
    pub(crate) fn split(&self) -> Vec2 {
        (self.min + (self.max - self.min) * 0.5).clamp(self.min, self.max)
    }

    /// Index into [`Extent::quadrants`] of the child that owns `point`.
    #[inline]
    pub(crate) fn quadrant_of(&self, point: Vec2) -> usize {
        let split = self.split();
        let east = point.x > split.x;
        let south = point.y > split.y;
        (south as usize) * 2 + east as usize
    }

    pub(crate) fn quadrants(&self) -> [Extent; 4] {
        let Extent { min, max } = *self;
        let mid = self.split();
        [
            Extent { min, max: mid },
            Extent {
                min: Vec2::new(mid.x, min.y),
                max: Vec2::new(max.x, mid.y),
            },
            Extent {
                min: Vec2::new(min.x, mid.y),
                max: Vec2::new(mid.x, max.y),
            },
            Extent { min: mid, max },
        ]
    }

    /// Closed overlap with `aabb`, using the box's own edge arithmetic so a
    /// point the box contains never lies in an extent this rejects.
    #[inline]
    pub(crate) fn overlaps(&self, aabb: &Aabb) -> bool {
        aabb.left() <= self.max.x
            && aabb.right() >= self.min.x
            && aabb.top() <= self.max.y
            && aabb.bottom() >= self.min.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadrants_share_edges_exactly() {
        let extent = Extent::from_aabb(&Aabb::new(
            Vec2::new(649.905, 948.489),
            Vec2::new(619.351, 537.121),
        ));
        let [nw, ne, sw, se] = extent.quadrants();
        assert_eq!(nw.min, extent.min);
        assert_eq!(se.max, extent.max);
        assert_eq!(ne.max.x, extent.max.x);
        assert_eq!(sw.max.y, extent.max.y);
        assert_eq!(nw.max.x, ne.min.x);
        assert_eq!(nw.max.y, sw.min.y);
    }

    #[test]
    fn every_point_routes_into_its_quadrant() {
        let extent = Extent::from_aabb(&Aabb::new(
            Vec2::new(649.905, 948.489),
            Vec2::new(619.351, 537.121),
        ));
        let split = extent.split();
        let quadrants = extent.quadrants();
        for x in [extent.min.x, split.x, extent.max.x] {
            for y in [extent.min.y, split.y, extent.max.y] {
                let point = Vec2::new(x, y);
                assert!(extent.contains(point));
                assert!(quadrants[extent.quadrant_of(point)].contains(point));
            }
        }
        // Split lines go north and west.
        assert_eq!(extent.quadrant_of(split), 0);
        assert_eq!(extent.quadrant_of(Vec2::new(extent.max.x, split.y)), 1);
        assert_eq!(extent.quadrant_of(Vec2::new(split.x, extent.max.y)), 2);
    }
}
