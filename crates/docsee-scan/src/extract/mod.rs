// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text extraction: the extractor seam, background dispatch, hit filtering,
// and plain-text export.

pub mod dispatch;
pub mod extractor;
pub mod filter;
pub mod text;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use dispatch::{ExtractionDispatcher, JobStatus};
pub use extractor::{NullExtractor, TextExtractor};
pub use filter::TextFilter;

#[cfg(feature = "ocr")]
pub use ocr::OcrsExtractor;
