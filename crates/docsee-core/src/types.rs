// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the DocSee scanning pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A 2-D point in image coordinates (x, y).
pub type Point = (f32, f32);

/// Index of a captured page within a session.
pub type ImageIndex = usize;

/// Unique identifier for one live-capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where frames come from. Selects the edge thresholds used by detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanMode {
    /// Stand-alone still images.
    Still,
    /// Consecutive camera frames (motion blur expected).
    Live,
}

/// Four corner points of a detected document boundary, in detector order.
///
/// The order is whatever polygon approximation produced; it is *not* the
/// canonical top-left/top-right/bottom-right/bottom-left order needed for
/// rectification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    points: [Point; 4],
}

impl Quadrilateral {
    pub fn new(points: [Point; 4]) -> Self {
        Self { points }
    }

    /// Borrow the four points in detector order.
    pub fn points(&self) -> &[Point; 4] {
        &self.points
    }

    /// Mean Euclidean distance between corresponding corners of `self` and
    /// `other`, pairing points by index.
    pub fn mean_corner_distance(&self, other: &Quadrilateral) -> f32 {
        let total: f32 = self
            .points
            .iter()
            .zip(other.points.iter())
            .map(|(a, b)| distance(*a, *b))
            .sum();
        total / 4.0
    }

    /// Enclosed area via the shoelace formula. Assumes the points trace the
    /// boundary (CW or CCW), which holds for detector output.
    pub fn area(&self) -> f32 {
        shoelace_area(&self.points)
    }
}

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Area of a polygon given by its vertices in boundary order.
pub fn shoelace_area(points: &[Point]) -> f32 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0f32;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].0 * points[j].1;
        area -= points[j].0 * points[i].1;
    }
    area.abs() / 2.0
}

/// Raw output of the text-extraction capability, before filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHit {
    /// Bounding polygon of the recognised text, in rectified-image coordinates.
    pub region: [Point; 4],
    pub text: String,
    /// Recognition confidence in 0.0..=1.0.
    pub confidence: f32,
}

/// A recognised text line that survived filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextHit {
    pub text: String,
    pub confidence: f32,
}

/// Standard paper sizes for assembled documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }
}
