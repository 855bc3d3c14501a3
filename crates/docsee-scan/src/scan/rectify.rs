// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification: canonical corner ordering and the
// quadrilateral-to-rectangle warp.

use docsee_core::error::{DocseeError, Result};
use docsee_core::types::{Point, Quadrilateral, distance, shoelace_area};
use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::{debug, info, instrument};

/// Corners enclosing less than this are treated as collapsed.
const MIN_ENCLOSED_AREA: f32 = 1.0;

/// Four corners in canonical order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderedQuad {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

impl OrderedQuad {
    /// Corners as `[top_left, top_right, bottom_right, bottom_left]`.
    pub fn as_array(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }
}

/// Orders quadrilaterals and warps their region into an upright rectangle.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerspectiveRectifier;

impl PerspectiveRectifier {
    pub fn new() -> Self {
        Self
    }

    /// Put four arbitrary points into canonical corner order.
    ///
    /// The smallest `x + y` is top-left and the largest bottom-right; the
    /// smallest `y - x` is top-right and the largest bottom-left. The result
    /// does not depend on input order. Quadrilaterals rotated close to 45°
    /// can be mis-ordered by this heuristic; that is left as is because
    /// callers rely on this exact convention.
    pub fn order(&self, points: &[Point; 4]) -> OrderedQuad {
        let by = |key: fn(&Point) -> f32, largest: bool| -> Point {
            let pick = points.iter().copied().reduce(|best, p| {
                let better = if largest {
                    key(&p) > key(&best)
                } else {
                    key(&p) < key(&best)
                };
                if better { p } else { best }
            });
            // Four points are always present.
            pick.unwrap_or(points[0])
        };
        let sum = |p: &Point| p.0 + p.1;
        let diff = |p: &Point| p.1 - p.0;

        OrderedQuad {
            top_left: by(sum, false),
            top_right: by(diff, false),
            bottom_right: by(sum, true),
            bottom_left: by(diff, true),
        }
    }

    /// Output size for a rectified quadrilateral: the longer of each pair of
    /// opposite sides, rounded down.
    ///
    /// # Errors
    ///
    /// Returns [`DocseeError::DegenerateGeometry`] if either side is zero.
    pub fn target_size(&self, quad: &OrderedQuad) -> Result<(u32, u32)> {
        let width_bottom = distance(quad.bottom_left, quad.bottom_right);
        let width_top = distance(quad.top_left, quad.top_right);
        let height_right = distance(quad.top_right, quad.bottom_right);
        let height_left = distance(quad.top_left, quad.bottom_left);

        let width = width_bottom.max(width_top).floor();
        let height = height_right.max(height_left).floor();

        if !(width >= 1.0 && height >= 1.0) {
            return Err(DocseeError::DegenerateGeometry(format!(
                "rectified size would be {width}x{height}"
            )));
        }
        Ok((width as u32, height as u32))
    }

    /// Warp the region bounded by `quad` into an upright `W x H` image.
    ///
    /// The homography maps the ordered corners onto
    /// `(0,0), (W-1,0), (W-1,H-1), (0,H-1)`; pixels are sampled bilinearly.
    #[instrument(skip(self, frame), fields(width = frame.width(), height = frame.height()))]
    pub fn rectify(&self, frame: &RgbImage, quad: &OrderedQuad) -> Result<RgbImage> {
        let (out_w, out_h) = self.target_size(quad)?;

        // Collinear corners can still have long sides; the enclosed area
        // catches them before the homography goes singular.
        let area = shoelace_area(&quad.as_array());
        if area < MIN_ENCLOSED_AREA {
            return Err(DocseeError::DegenerateGeometry(format!(
                "corners enclose {area} px²"
            )));
        }

        // A single row or column has no second destination corner to map to.
        if out_w < 2 || out_h < 2 {
            return Err(DocseeError::DegenerateGeometry(format!(
                "rectified size {out_w}x{out_h} is too thin to warp"
            )));
        }

        let right = (out_w - 1) as f32;
        let bottom = (out_h - 1) as f32;
        let dest: [(f32, f32); 4] = [(0.0, 0.0), (right, 0.0), (right, bottom), (0.0, bottom)];

        let projection = Projection::from_control_points(quad.as_array(), dest).ok_or_else(|| {
            DocseeError::DegenerateGeometry(format!(
                "no projective transform for corners {:?}",
                quad.as_array()
            ))
        })?;

        let mut output = RgbImage::new(out_w, out_h);
        warp_into(
            frame,
            &projection,
            Interpolation::Bilinear,
            Rgb([255u8, 255, 255]),
            &mut output,
        );

        info!(out_w, out_h, "Perspective rectification applied");
        Ok(output)
    }

    /// Order a detector quadrilateral and rectify it in one step.
    pub fn rectify_unordered(&self, frame: &RgbImage, quad: &Quadrilateral) -> Result<RgbImage> {
        let ordered = self.order(quad.points());
        debug!(?ordered, "Corners ordered");
        self.rectify(frame, &ordered)
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: [Point; 4] = [(10.0, 20.0), (110.0, 25.0), (105.0, 180.0), (15.0, 170.0)];

    fn canonical() -> OrderedQuad {
        OrderedQuad {
            top_left: CANONICAL[0],
            top_right: CANONICAL[1],
            bottom_right: CANONICAL[2],
            bottom_left: CANONICAL[3],
        }
    }

    #[test]
    fn order_is_independent_of_input_permutation() {
        let rectifier = PerspectiveRectifier::new();
        let [a, b, c, d] = CANONICAL;
        let permutations = [
            [a, b, c, d],
            [b, c, d, a],
            [c, d, a, b],
            [d, a, b, c],
            // mirrored
            [d, c, b, a],
            [a, d, c, b],
            [b, a, d, c],
            [c, b, a, d],
        ];
        for perm in permutations {
            assert_eq!(rectifier.order(&perm), canonical(), "input {:?}", perm);
        }
    }

    #[test]
    fn diamond_shares_a_corner_between_top_left_and_top_right() {
        // Sum and difference ties resolve to the first point in input order,
        // so a 45° square hands the top vertex to two slots.
        let rectifier = PerspectiveRectifier::new();
        let diamond = [(100.0, 0.0), (200.0, 100.0), (100.0, 200.0), (0.0, 100.0)];
        let ordered = rectifier.order(&diamond);
        assert_eq!(
            ordered,
            OrderedQuad {
                top_left: (100.0, 0.0),
                top_right: (100.0, 0.0),
                bottom_right: (200.0, 100.0),
                bottom_left: (100.0, 200.0),
            }
        );
        assert!(!ordered.as_array().contains(&(0.0, 100.0)));
    }

    #[test]
    fn order_is_idempotent() {
        let rectifier = PerspectiveRectifier::new();
        let once = rectifier.order(&[CANONICAL[2], CANONICAL[0], CANONICAL[3], CANONICAL[1]]);
        let twice = rectifier.order(&once.as_array());
        assert_eq!(once, twice);
    }

    #[test]
    fn target_size_uses_longer_sides() {
        let rectifier = PerspectiveRectifier::new();
        let quad = OrderedQuad {
            top_left: (0.0, 0.0),
            top_right: (100.0, 0.0),
            bottom_right: (120.5, 50.0),
            bottom_left: (0.0, 50.0),
        };
        let (w, h) = rectifier.target_size(&quad).expect("size");
        assert_eq!(w, 120);
        // Right edge length sqrt(20.5² + 50²) ≈ 54.04.
        assert_eq!(h, 54);
    }

    #[test]
    fn collapsed_to_point_is_degenerate() {
        let rectifier = PerspectiveRectifier::new();
        let frame = RgbImage::new(50, 50);
        let p = (20.0, 20.0);
        let quad = rectifier.order(&[p, p, p, p]);
        assert!(matches!(
            rectifier.rectify(&frame, &quad),
            Err(DocseeError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn collapsed_to_horizontal_line_is_degenerate() {
        let rectifier = PerspectiveRectifier::new();
        let frame = RgbImage::new(50, 50);
        let quad = rectifier.order(&[(5.0, 10.0), (15.0, 10.0), (30.0, 10.0), (40.0, 10.0)]);
        assert!(matches!(
            rectifier.rectify(&frame, &quad),
            Err(DocseeError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn collapsed_to_diagonal_line_is_degenerate() {
        let rectifier = PerspectiveRectifier::new();
        let frame = RgbImage::new(50, 50);
        let quad = rectifier.order(&[(0.0, 0.0), (10.0, 10.0), (20.0, 20.0), (30.0, 30.0)]);
        assert!(matches!(
            rectifier.rectify(&frame, &quad),
            Err(DocseeError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn rectifying_embedded_rectangle_preserves_aspect_ratio() {
        // 300x150 red rectangle on a blue background.
        let mut frame = RgbImage::from_pixel(400, 300, Rgb([0, 0, 200]));
        for y in 50..200 {
            for x in 40..340 {
                frame.put_pixel(x, y, Rgb([220, 10, 10]));
            }
        }
        let rectifier = PerspectiveRectifier::new();
        let quad = Quadrilateral::new([(339.0, 199.0), (40.0, 50.0), (339.0, 50.0), (40.0, 199.0)]);

        let warped = rectifier.rectify_unordered(&frame, &quad).expect("rectify");
        assert_eq!((warped.width(), warped.height()), (299, 149));

        let ratio = warped.width() as f32 / warped.height() as f32;
        assert!((ratio - 2.0).abs() < 0.05, "ratio {ratio}");

        // The interior is entirely the rectangle's colour.
        let centre = warped.get_pixel(warped.width() / 2, warped.height() / 2);
        assert!(centre.0[0] > 200 && centre.0[2] < 30, "centre pixel {:?}", centre);
    }

    #[test]
    fn rectifying_skewed_quad_produces_exact_target_size() {
        let frame = RgbImage::from_pixel(300, 300, Rgb([128, 128, 128]));
        let rectifier = PerspectiveRectifier::new();
        let ordered = rectifier.order(&[(30.0, 40.0), (250.0, 20.0), (270.0, 260.0), (20.0, 240.0)]);
        let (w, h) = rectifier.target_size(&ordered).expect("size");
        let warped = rectifier.rectify(&frame, &ordered).expect("rectify");
        assert_eq!((warped.width(), warped.height()), (w, h));
    }
}
