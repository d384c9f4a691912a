use glam::Vec2;
use rand::Rng;
use std::fmt::Debug;

pub trait Shape: Debug {
    fn bounding_box(&self) -> Aabb;
    fn contains_point(&self, point: Vec2) -> bool;

    // Conservative: may report an overlap that the exact shape does not have,
    // never misses one.
    fn possibly_overlaps(&self, aabb: &Aabb) -> bool {
        self.bounding_box().overlaps(aabb)
    }
}

/// Axis-aligned bounding box stored as a center and a half-size per axis.
///
/// Both containment and overlap treat `center ± half` as a closed extent, so
/// points on an edge belong to the box and boxes that share an edge overlap.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, half: Vec2) -> Self {
        Self { center, half }
    }

    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        let half = (max - min) * 0.5;
        Self {
            center: min + half,
            half,
        }
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }

    pub fn width(&self) -> f32 {
        self.half.x * 2.0
    }

    pub fn height(&self) -> f32 {
        self.half.y * 2.0
    }

    pub fn left(&self) -> f32 {
        self.center.x - self.half.x
    }

    pub fn right(&self) -> f32 {
        self.center.x + self.half.x
    }

    pub fn top(&self) -> f32 {
        self.center.y - self.half.y
    }

    pub fn bottom(&self) -> f32 {
        self.center.y + self.half.y
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    pub fn contains_aabb(&self, other: &Aabb) -> bool {
        other.left() >= self.left()
            && other.right() <= self.right()
            && other.top() >= self.top()
            && other.bottom() <= self.bottom()
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.left() <= other.right()
            && self.right() >= other.left()
            && self.top() <= other.bottom()
            && self.bottom() >= other.top()
    }

    pub fn random_point_inside<R: Rng>(&self, rng: &mut R) -> Vec2 {
        Vec2::new(
            self._safe_randf32(rng, self.left(), self.right()),
            self._safe_randf32(rng, self.top(), self.bottom()),
        )
    }

    fn _safe_randf32<R: Rng>(&self, rng: &mut R, min: f32, max: f32) -> f32 {
        if min >= max {
            return min;
        }
        rng.gen_range(min..=max)
    }
}

impl Shape for Aabb {
    fn bounding_box(&self) -> Aabb {
        *self
    }

    fn contains_point(&self, point: Vec2) -> bool {
        Aabb::contains_point(self, point)
    }
}

/// Rectangle query region. `size` holds the half-extent on each axis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rectangle {
    pub center: Vec2,
    pub size: Vec2,
}

impl Rectangle {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }
}

impl Shape for Rectangle {
    fn bounding_box(&self) -> Aabb {
        Aabb::new(self.center, self.size)
    }

    fn contains_point(&self, point: Vec2) -> bool {
        self.bounding_box().contains_point(point)
    }
}

/// Square query region. `size` is the half-extent shared by both axes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Square {
    pub center: Vec2,
    pub size: f32,
}

impl Square {
    pub fn new(center: Vec2, size: f32) -> Self {
        Self { center, size }
    }
}

impl Shape for Square {
    fn bounding_box(&self) -> Aabb {
        Aabb::new(self.center, Vec2::splat(self.size))
    }

    fn contains_point(&self, point: Vec2) -> bool {
        self.bounding_box().contains_point(point)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl Shape for Circle {
    fn bounding_box(&self) -> Aabb {
        Aabb::new(self.center, Vec2::splat(self.radius))
    }

    fn contains_point(&self, point: Vec2) -> bool {
        self.center.distance_squared(point) <= self.radius * self.radius
    }
}

/// Axis-aligned ellipse. `radii` holds the semi-axis on x and on y.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ellipse {
    pub center: Vec2,
    pub radii: Vec2,
}

impl Ellipse {
    pub fn new(center: Vec2, radii: Vec2) -> Self {
        Self { center, radii }
    }
}

impl Shape for Ellipse {
    fn bounding_box(&self) -> Aabb {
        Aabb::new(self.center, self.radii)
    }

    fn contains_point(&self, point: Vec2) -> bool {
        // A flat ellipse is the segment spanned by its bounding box.
        if self.radii.x == 0.0 || self.radii.y == 0.0 {
            return self.bounding_box().contains_point(point);
        }
        let d = (point - self.center) / self.radii;
        d.length_squared() <= 1.0
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ShapeEnum {
    Rectangle(Rectangle),
    Square(Square),
    Circle(Circle),
    Ellipse(Ellipse),
}

impl ShapeEnum {
    pub fn rectangle(center: Vec2, size: Vec2) -> Self {
        ShapeEnum::Rectangle(Rectangle::new(center, size))
    }

    pub fn square(center: Vec2, size: f32) -> Self {
        ShapeEnum::Square(Square::new(center, size))
    }

    pub fn circle(center: Vec2, radius: f32) -> Self {
        ShapeEnum::Circle(Circle::new(center, radius))
    }

    pub fn ellipse(center: Vec2, radii: Vec2) -> Self {
        ShapeEnum::Ellipse(Ellipse::new(center, radii))
    }

    pub fn center(&self) -> Vec2 {
        match self {
            ShapeEnum::Rectangle(rectangle) => rectangle.center,
            ShapeEnum::Square(square) => square.center,
            ShapeEnum::Circle(circle) => circle.center,
            ShapeEnum::Ellipse(ellipse) => ellipse.center,
        }
    }
}

impl Shape for ShapeEnum {
    fn bounding_box(&self) -> Aabb {
        match self {
            ShapeEnum::Rectangle(rectangle) => rectangle.bounding_box(),
            ShapeEnum::Square(square) => square.bounding_box(),
            ShapeEnum::Circle(circle) => circle.bounding_box(),
            ShapeEnum::Ellipse(ellipse) => ellipse.bounding_box(),
        }
    }

    fn contains_point(&self, point: Vec2) -> bool {
        match self {
            ShapeEnum::Rectangle(rectangle) => rectangle.contains_point(point),
            ShapeEnum::Square(square) => square.contains_point(point),
            ShapeEnum::Circle(circle) => circle.contains_point(point),
            ShapeEnum::Ellipse(ellipse) => ellipse.contains_point(point),
        }
    }
}

impl From<Rectangle> for ShapeEnum {
    fn from(rectangle: Rectangle) -> Self {
        ShapeEnum::Rectangle(rectangle)
    }
}

impl From<Square> for ShapeEnum {
    fn from(square: Square) -> Self {
        ShapeEnum::Square(square)
    }
}

impl From<Circle> for ShapeEnum {
    fn from(circle: Circle) -> Self {
        ShapeEnum::Circle(circle)
    }
}

impl From<Ellipse> for ShapeEnum {
    fn from(ellipse: Ellipse) -> Self {
        ShapeEnum::Ellipse(ellipse)
    }
}
