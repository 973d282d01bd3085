use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{BoundaryError, BoundaryResult};

/// Well-known boundary labels used by the reaching task.
pub mod labels {
    pub const RECT: &str = "rect";
    pub const REWARD: &str = "reward";
    pub const PENALTY: &str = "penalty";
    pub const START: &str = "start";
}

/// Screen position in pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

/// Containment test shared by all boundary shapes.
pub trait Region {
    fn contains(&self, point: Point) -> bool;
    fn center(&self) -> Point;
}

/// Axis-aligned rectangle given by two opposite corners, in any order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectangleBoundary {
    p1: Point,
    p2: Point,
}

impl RectangleBoundary {
    pub fn new(p1: Point, p2: Point) -> Self {
        Self { p1, p2 }
    }

    /// Rectangle of the given size centred on `center`.
    pub fn centered(center: Point, width: f64, height: f64) -> Self {
        Self::new(
            center.offset(-width / 2.0, -height / 2.0),
            center.offset(width / 2.0, height / 2.0),
        )
    }

    pub fn p1(&self) -> Point {
        self.p1
    }

    pub fn p2(&self) -> Point {
        self.p2
    }

    /// Normalised top-left corner.
    pub fn min(&self) -> Point {
        Point::new(self.p1.x.min(self.p2.x), self.p1.y.min(self.p2.y))
    }

    /// Normalised bottom-right corner.
    pub fn max(&self) -> Point {
        Point::new(self.p1.x.max(self.p2.x), self.p1.y.max(self.p2.y))
    }

    pub fn width(&self) -> f64 {
        (self.p1.x - self.p2.x).abs()
    }

    pub fn height(&self) -> f64 {
        (self.p1.y - self.p2.y).abs()
    }
}

impl Region for RectangleBoundary {
    fn contains(&self, point: Point) -> bool {
        let (min, max) = (self.min(), self.max());
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }

    fn center(&self) -> Point {
        Point::new((self.p1.x + self.p2.x) / 2.0, (self.p1.y + self.p2.y) / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleBoundary {
    center: Point,
    radius: f64,
}

impl CircleBoundary {
    pub fn new(center: Point, radius: f64) -> BoundaryResult<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(BoundaryError::InvalidRadius(radius));
        }
        Ok(Self { center, radius })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl Region for CircleBoundary {
    fn contains(&self, point: Point) -> bool {
        self.center.distance_sq(point) <= self.radius * self.radius
    }

    fn center(&self) -> Point {
        self.center
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Rectangle(RectangleBoundary),
    Circle(CircleBoundary),
}

impl Region for Shape {
    fn contains(&self, point: Point) -> bool {
        match self {
            Shape::Rectangle(r) => r.contains(point),
            Shape::Circle(c) => c.contains(point),
        }
    }

    fn center(&self) -> Point {
        match self {
            Shape::Rectangle(r) => r.center(),
            Shape::Circle(c) => c.center(),
        }
    }
}

impl From<RectangleBoundary> for Shape {
    fn from(r: RectangleBoundary) -> Self {
        Shape::Rectangle(r)
    }
}

impl From<CircleBoundary> for Shape {
    fn from(c: CircleBoundary) -> Self {
        Shape::Circle(c)
    }
}

/// A labelled region.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub label: String,
    pub shape: Shape,
}

impl Boundary {
    pub fn new(label: impl Into<String>, shape: impl Into<Shape>) -> Self {
        Self {
            label: label.into(),
            shape: shape.into(),
        }
    }
}

impl Region for Boundary {
    fn contains(&self, point: Point) -> bool {
        self.shape.contains(point)
    }

    fn center(&self) -> Point {
        self.shape.center()
    }
}

/// Label-keyed collection of boundaries. Adding under an existing label
/// replaces the previous boundary, which is how target circles move between
/// trials while the frame and start region stay put.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundarySet {
    boundaries: HashMap<String, Boundary>,
}

impl BoundarySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `boundary`, returning the one it replaced, if any.
    pub fn add_boundary(&mut self, boundary: Boundary) -> Option<Boundary> {
        self.boundaries.insert(boundary.label.clone(), boundary)
    }

    pub fn with(mut self, boundary: Boundary) -> Self {
        self.add_boundary(boundary);
        self
    }

    pub fn get(&self, label: &str) -> Option<&Boundary> {
        self.boundaries.get(label)
    }

    pub fn require(&self, label: &str) -> BoundaryResult<&Boundary> {
        self.get(label)
            .ok_or_else(|| BoundaryError::UnknownBoundary(label.to_string()))
    }

    pub fn has(&self, label: &str) -> bool {
        self.boundaries.contains_key(label)
    }

    /// `Some(inside)` when the label exists, `None` otherwise.
    pub fn within(&self, label: &str, point: Point) -> Option<bool> {
        self.get(label).map(|b| b.contains(point))
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.boundaries.keys().map(String::as_str)
    }
}
