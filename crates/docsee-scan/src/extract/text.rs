// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-text export of extraction results.

use std::path::{Path, PathBuf};

use docsee_core::config::OutputConfig;
use docsee_core::error::Result;
use docsee_core::types::TextHit;
use tracing::info;

/// One line per hit, in result order.
pub fn format_text(hits: &[TextHit]) -> String {
    hits.iter()
        .map(|hit| hit.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write `hits` to `path` as plain text.
pub fn export_text(hits: &[TextHit], path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    std::fs::write(path, format_text(hits))?;
    info!(path = %path.display(), lines = hits.len(), "Text exported");
    Ok(path.to_path_buf())
}

/// `ocr_result_<timestamp>.txt`
pub fn default_text_name() -> String {
    OutputConfig::timestamped_name("ocr_result", "txt")
}
