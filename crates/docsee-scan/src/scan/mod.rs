// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometry and imaging stages: boundary detection, rectification, live
// stabilisation, manual corner selection, and pre-extraction sharpening.

pub mod detect;
pub mod enhance;
pub mod manual;
pub mod rectify;
pub mod stability;

pub use detect::BoundaryDetector;
pub use manual::ManualSelection;
pub use rectify::{OrderedQuad, PerspectiveRectifier};
pub use stability::{GateState, StabilityGate};
