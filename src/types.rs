//! Core geometry and addressing types shared across the editor engine.
//!
//! These are the small value types every other module builds on:
//!
//! - [`Point`]: a position on the visual canvas
//! - [`Size`]: width/height of a canvas cell (groups carry an explicit size)
//! - [`OperatorPort`]: the (operator, port) address a link endpoint points at
//!
//! Entity types with identity and behavior live in [`crate::operator`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position on the visual canvas, in canvas coordinates.
///
/// Positions belong to the layout mirror, never to the logical graph:
/// the logical graph knows *what* is connected, the layout knows *where*
/// it is drawn.
///
/// # Examples
///
/// ```
/// use flowboard::types::Point;
///
/// let origin = Point::default();
/// let p = Point::new(100.0, 40.0);
/// assert_eq!(p + Point::new(-20.0, 10.0), Point::new(80.0, 50.0));
/// assert_eq!(p - p, origin);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns `true` when both components are exactly zero.
    ///
    /// Used to suppress no-op move commands after a drag gesture settles
    /// back where it started.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Width and height of a canvas cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// One endpoint of a link: an operator plus one of its named ports.
///
/// Ports are addressed by ID within their owning operator. Two ports are
/// the same endpoint only when both the operator ID and the port ID match.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorPort {
    pub operator_id: String,
    pub port_id: String,
}

impl OperatorPort {
    pub fn new(operator_id: impl Into<String>, port_id: impl Into<String>) -> Self {
        Self {
            operator_id: operator_id.into(),
            port_id: port_id.into(),
        }
    }
}

impl fmt::Display for OperatorPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.operator_id, self.port_id)
    }
}
