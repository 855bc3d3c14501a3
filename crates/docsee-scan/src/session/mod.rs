// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture sessions: the loops that wire detection, stabilisation,
// rectification and extraction dispatch together.

pub mod batch;
pub mod live;
pub mod source;
pub mod store;

pub use batch::BatchSession;
pub use live::{LiveSession, TickOutcome};
pub use source::{DirectoryFrameSource, FrameSource, StillFrames, load_frame};
pub use store::CaptureStore;

use docsee_core::error::Result;
use docsee_core::types::ImageIndex;
use tracing::info;

use crate::extract::ExtractionDispatcher;
use crate::scan::manual::ManualSelection;
use crate::scan::rectify::PerspectiveRectifier;

/// Replace the page at `index` with the user's manual crop and queue it for
/// extraction again.
pub(crate) fn apply_selection(
    store: &mut CaptureStore,
    dispatcher: &ExtractionDispatcher,
    rectifier: &PerspectiveRectifier,
    index: ImageIndex,
    selection: &ManualSelection,
) -> Result<()> {
    let cropped = selection.crop(store.require(index)?, rectifier)?;
    store.insert(index, cropped.clone());
    dispatcher.submit(index, cropped);
    info!(index, "Page replaced by manual selection");
    Ok(())
}
