// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document boundary detection: finds the dominant four-sided contour in a
// frame using edge detection, contour tracing, and polygon approximation.

use docsee_core::config::DetectionConfig;
use docsee_core::types::{Point, Quadrilateral, ScanMode};
use image::{GrayImage, RgbImage};
use imageproc::contours::find_contours;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::morphology::dilate;
use imageproc::point::Point as PixelPoint;
use tracing::{debug, instrument, trace};

/// Locates the quadrilateral boundary of a document-like object in a frame.
///
/// The document is assumed to be the dominant foreground object, so only the
/// few largest contours are examined.
///
/// ## Pipeline
///
/// 1. Convert to grayscale
/// 2. Gaussian blur (5x5 equivalent) for noise reduction
/// 3. Canny edge detection, with mode-dependent thresholds
/// 4. 1-px dilation to close corner gaps in the edge map
/// 5. Contour tracing (all borders, outer and hole)
/// 6. Sort by enclosed area, keep the largest few above the area floor
/// 7. Approximate each candidate with a polygon; the first one with exactly
///    four vertices wins
#[derive(Debug, Clone)]
pub struct BoundaryDetector {
    config: DetectionConfig,
    mode: ScanMode,
}

impl BoundaryDetector {
    pub fn new(config: DetectionConfig, mode: ScanMode) -> Self {
        Self { config, mode }
    }

    /// Detector for stand-alone still images with default parameters.
    pub fn still() -> Self {
        Self::new(DetectionConfig::default(), ScanMode::Still)
    }

    /// Detector for live camera frames with default parameters.
    pub fn live() -> Self {
        Self::new(DetectionConfig::default(), ScanMode::Live)
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Find the best-candidate document quadrilateral in `frame`.
    ///
    /// Returns `None` when no four-vertex candidate exists among the largest
    /// contours. That is a normal negative result, not an error.
    #[instrument(skip_all, fields(width = frame.width(), height = frame.height(), mode = ?self.mode))]
    pub fn detect(&self, frame: &RgbImage) -> Option<Quadrilateral> {
        let gray = image::imageops::grayscale(frame);
        self.detect_gray(&gray)
    }

    /// Same as [`detect`](Self::detect) for an already-grayscale frame.
    pub fn detect_gray(&self, gray: &GrayImage) -> Option<Quadrilateral> {
        if gray.width() < 3 || gray.height() < 3 {
            return None;
        }

        let blurred = gaussian_blur_f32(gray, self.config.blur_sigma);
        let thresholds = self.config.edges_for(self.mode);
        let edges = canny(&blurred, thresholds.low, thresholds.high);
        let closed = dilate(&edges, Norm::LInf, 1);

        let mut candidates: Vec<(f32, Vec<PixelPoint<i32>>)> = find_contours::<i32>(&closed)
            .into_iter()
            .map(|contour| (pixel_polygon_area(&contour.points), contour.points))
            .filter(|(area, _)| *area > self.config.min_area)
            .collect();

        debug!(candidates = candidates.len(), "Contours above area floor");

        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
        candidates.truncate(self.config.max_candidates);

        for (area, points) in &candidates {
            let perimeter = arc_length(points, true);
            let epsilon = self.config.approx_epsilon_ratio * perimeter;
            let Some(approx) = approximate_closed(points, epsilon) else {
                continue;
            };
            trace!(area, perimeter, vertices = approx.len(), "Candidate approximated");

            if approx.len() != 4 {
                continue;
            }

            let corners: [Point; 4] = [
                (approx[0].x as f32, approx[0].y as f32),
                (approx[1].x as f32, approx[1].y as f32),
                (approx[2].x as f32, approx[2].y as f32),
                (approx[3].x as f32, approx[3].y as f32),
            ];
            let quad = Quadrilateral::new(corners);
            if quad.area() <= self.config.min_area {
                continue;
            }

            debug!(corners = ?quad.points(), area = quad.area(), "Document quadrilateral found");
            return Some(quad);
        }

        debug!("No four-sided candidate among the largest contours");
        None
    }
}

/// Approximate a closed contour with a polygon.
///
/// The contour is split at the point farthest from its first point into two
/// open chains; each chain is simplified with Douglas–Peucker and the results
/// are joined without repeating the shared vertices. Returns `None` for
/// contours that collapse to a single location.
fn approximate_closed(points: &[PixelPoint<i32>], epsilon: f64) -> Option<Vec<PixelPoint<i32>>> {
    if points.len() < 3 || epsilon <= 0.0 {
        return None;
    }

    let start = points[0];
    let (split, _) = points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, squared_distance(start, *p)))
        .max_by_key(|(_, d)| *d)?;
    if split == 0 || squared_distance(start, points[split]) == 0 {
        return None;
    }

    let first_chain = &points[..=split];
    let mut second_chain: Vec<PixelPoint<i32>> = points[split..].to_vec();
    second_chain.push(start);

    let mut polygon = approximate_polygon_dp(first_chain, epsilon, false);
    let tail = approximate_polygon_dp(&second_chain, epsilon, false);

    // Both chains share the split point; the tail also ends where we started.
    polygon.pop();
    polygon.extend(tail);
    polygon.pop();

    polygon.dedup();
    Some(polygon)
}

fn squared_distance(a: PixelPoint<i32>, b: PixelPoint<i32>) -> i64 {
    let dx = (a.x - b.x) as i64;
    let dy = (a.y - b.y) as i64;
    dx * dx + dy * dy
}

/// Shoelace area of a traced contour.
fn pixel_polygon_area(points: &[PixelPoint<i32>]) -> f32 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area: i64 = 0;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += points[i].x as i64 * points[j].y as i64;
        twice_area -= points[j].x as i64 * points[i].y as i64;
    }
    twice_area.abs() as f32 / 2.0
}

// -- Tests --------------------------------------------------------------------
