// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for DocSee.

use thiserror::Error;

/// Top-level error type for all DocSee operations.
///
/// "No document found" is not an error: detection returns `None` for that.
#[derive(Debug, Error)]
pub enum DocseeError {
    // -- Geometry --
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("invalid corner selection: {0}")]
    InvalidSelection(String),

    // -- Imaging --
    #[error("image processing failed: {0}")]
    Image(String),

    #[error("no image captured at index {0}")]
    NoCapture(usize),

    // -- Collaborators --
    #[error("text extraction failed: {0}")]
    Extraction(String),

    #[error("document assembly failed: {0}")]
    Assembly(String),

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocseeError>;
