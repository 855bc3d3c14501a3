// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docsee-scan: the document scanning pipeline.
//
// Finds a sheet of paper in a frame, warps it into an upright rectangle,
// debounces detections across live video, and runs text extraction on
// captured pages in the background. Captured pages can be assembled into a
// PDF.

pub mod extract;
pub mod pdf;
pub mod scan;
pub mod session;

// Re-export the primary types so callers can use `docsee_scan::BoundaryDetector` etc.
pub use extract::{ExtractionDispatcher, JobStatus, NullExtractor, TextExtractor, TextFilter};
pub use pdf::{DocumentAssembler, PdfAssembler};
pub use scan::{
    BoundaryDetector, GateState, ManualSelection, OrderedQuad, PerspectiveRectifier,
    StabilityGate,
};
pub use session::{
    BatchSession, CaptureStore, DirectoryFrameSource, FrameSource, LiveSession, StillFrames,
    TickOutcome,
};

#[cfg(feature = "ocr")]
pub use extract::OcrsExtractor;
