// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Asynchronous extraction dispatch: one background worker per submitted
// page, results collected into a shared store keyed by image index.
//
// The capture loop never waits on extraction: `submit` marks the index
// pending, hands the image to a named worker thread, and returns. Workers
// write their filtered hits into the store when done and announce the index
// on a completion channel. Callers either poll (`is_ready`, `wait_ready`) or
// drain the channel.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use docsee_core::config::{ScanConfig, SharpenConfig};
use docsee_core::error::Result;
use docsee_core::types::{ImageIndex, TextHit};
use image::RgbImage;
use tracing::{debug, error, info, warn};

use super::extractor::TextExtractor;
use super::filter::TextFilter;
use crate::scan::enhance::prepare_for_extraction;

/// Lifecycle of one index in the result store.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    /// Submitted, worker still running.
    Pending,
    /// Worker finished. An empty list means nothing usable was recognised
    /// or the extractor failed.
    Ready(Vec<TextHit>),
}

type ResultStore = Arc<Mutex<HashMap<ImageIndex, JobStatus>>>;

/// Runs text extraction off the capture thread.
pub struct ExtractionDispatcher {
    extractor: Arc<dyn TextExtractor>,
    filter: Arc<TextFilter>,
    sharpen: SharpenConfig,
    results: ResultStore,
    completed_tx: Sender<ImageIndex>,
    completed_rx: Mutex<Option<Receiver<ImageIndex>>>,
}

impl ExtractionDispatcher {
    pub fn new(extractor: Arc<dyn TextExtractor>, config: &ScanConfig) -> Self {
        let (completed_tx, completed_rx) = mpsc::channel();
        Self {
            extractor,
            filter: Arc::new(TextFilter::new(config.filter.clone())),
            sharpen: config.sharpen.clone(),
            results: Arc::new(Mutex::new(HashMap::new())),
            completed_tx,
            completed_rx: Mutex::new(Some(completed_rx)),
        }
    }

    /// Queue extraction for `index`. Never blocks on the work itself.
    ///
    /// Resubmitting an index is allowed; whichever job finishes last
    /// determines the stored result.
    pub fn submit(&self, index: ImageIndex, image: RgbImage) {
        lock(&self.results).insert(index, JobStatus::Pending);

        let extractor = Arc::clone(&self.extractor);
        let filter = Arc::clone(&self.filter);
        let sharpen = self.sharpen.clone();
        let results = Arc::clone(&self.results);
        let completed_tx = self.completed_tx.clone();

        let spawned = std::thread::Builder::new()
            .name(format!("extract-{index}"))
            .spawn(move || {
                let hits = run_job(index, &image, extractor.as_ref(), &filter, &sharpen);
                info!(index, hits = hits.len(), "Extraction complete");
                lock(&results).insert(index, JobStatus::Ready(hits));
                // Nobody listening is fine.
                let _ = completed_tx.send(index);
            });

        match spawned {
            Ok(_) => debug!(index, "Extraction submitted"),
            Err(e) => {
                error!(index, error = %e, "Failed to spawn extraction worker");
                lock(&self.results).insert(index, JobStatus::Ready(Vec::new()));
                let _ = self.completed_tx.send(index);
            }
        }
    }

    /// Whether a completed result exists for `index`.
    pub fn is_ready(&self, index: ImageIndex) -> bool {
        matches!(lock(&self.results).get(&index), Some(JobStatus::Ready(_)))
    }

    /// The filtered hits for `index`, once ready.
    pub fn result(&self, index: ImageIndex) -> Option<Vec<TextHit>> {
        match lock(&self.results).get(&index) {
            Some(JobStatus::Ready(hits)) => Some(hits.clone()),
            _ => None,
        }
    }

    /// `None` if `index` was never submitted.
    pub fn status(&self, index: ImageIndex) -> Option<JobStatus> {
        lock(&self.results).get(&index).cloned()
    }

    /// Indices that have been submitted, in ascending order.
    pub fn submitted(&self) -> Vec<ImageIndex> {
        let mut indices: Vec<_> = lock(&self.results).keys().copied().collect();
        indices.sort_unstable();
        indices
    }

    /// Poll every `poll_interval` until `index` is ready or `timeout` passes.
    pub fn wait_ready(
        &self,
        index: ImageIndex,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Option<Vec<TextHit>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(hits) = self.result(index) {
                return Some(hits);
            }
            let now = Instant::now();
            if now >= deadline {
                warn!(index, ?timeout, "Timed out waiting for extraction");
                return None;
            }
            std::thread::sleep(poll_interval.min(deadline - now));
        }
    }

    /// Take the completion channel. Each finished job sends its index once.
    /// Only the first call gets the receiver.
    pub fn completions(&self) -> Option<Receiver<ImageIndex>> {
        lock(&self.completed_rx).take()
    }
}

/// Sharpen, extract and filter. Any failure, including a panic inside the
/// extractor, yields an empty result.
fn run_job(
    index: ImageIndex,
    image: &RgbImage,
    extractor: &dyn TextExtractor,
    filter: &TextFilter,
    sharpen: &SharpenConfig,
) -> Vec<TextHit> {
    let outcome = catch_unwind(AssertUnwindSafe(|| -> Result<Vec<TextHit>> {
        let prepared = prepare_for_extraction(image, sharpen);
        let raw = extractor.extract_text(&prepared)?;
        debug!(index, raw = raw.len(), extractor = extractor.name(), "Raw hits");
        Ok(filter.filter(raw))
    }));

    match outcome {
        Ok(Ok(hits)) => hits,
        Ok(Err(e)) => {
            error!(index, error = %e, "Extraction failed");
            Vec::new()
        }
        Err(_) => {
            error!(index, "Extraction worker panicked");
            Vec::new()
        }
    }
}

/// Lock, recovering the data if a previous holder panicked. Store writes
/// are single inserts, so the map is never left half-updated.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
