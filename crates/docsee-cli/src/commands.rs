// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand implementations.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use docsee_core::ScanConfig;
use docsee_core::error::{DocseeError, Result};
use docsee_core::types::{ImageIndex, TextHit};
use docsee_scan::extract::text::{default_text_name, export_text, format_text};
use docsee_scan::pdf::assembler::default_pdf_name;
use docsee_scan::{
    BatchSession, CaptureStore, DirectoryFrameSource, DocumentAssembler, ExtractionDispatcher,
    LiveSession, PdfAssembler, TextExtractor,
};
use tracing::{debug, info, warn};

/// Where and how results are written.
#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Directory for rectified pages, extracted text and PDFs.
    #[arg(short, long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Also assemble all pages into a PDF.
    #[arg(long)]
    pub pdf: bool,

    /// How long to wait for text extraction before giving up.
    #[arg(long, default_value_t = 30)]
    pub wait_secs: u64,
}

pub async fn scan(config: &ScanConfig, images: &[PathBuf], output: &OutputArgs) -> Result<()> {
    let dispatcher = Arc::new(ExtractionDispatcher::new(build_extractor(), config));
    let mut session = BatchSession::new(Arc::clone(&dispatcher), config);

    let report = session.process_paths(images);
    for index in &report.raw {
        println!("page {index}: no document found, kept as-is");
    }
    if session.store().is_empty() {
        return Err(DocseeError::NoCapture(0));
    }

    let results = collect_results(&dispatcher, &report.rectified, config, output).await;
    write_outputs(config, session.store(), &results, output)
}

pub async fn live(
    config: &ScanConfig,
    frames_dir: &Path,
    max_frames: usize,
    output: &OutputArgs,
) -> Result<()> {
    let dispatcher = Arc::new(ExtractionDispatcher::new(build_extractor(), config));
    let source = DirectoryFrameSource::open(frames_dir)?;
    let mut session = LiveSession::new(source, Arc::clone(&dispatcher), config);
    let frame_interval = Duration::from_millis(config.frame_interval_ms);

    // Detection is CPU-bound and run() sleeps between frames, so the loop
    // stays off the async worker threads.
    let (session, captured) = tokio::task::spawn_blocking(move || {
        let captured = session.run(max_frames, frame_interval);
        (session, captured)
    })
    .await
    .map_err(|e| DocseeError::Image(format!("live capture task failed: {e}")))?;

    let Some(index) = captured else {
        println!("no stable document found");
        return Err(DocseeError::NoCapture(session.current_index()));
    };
    println!("page {index}: captured");

    let results = collect_results(&dispatcher, &[index], config, output).await;
    write_outputs(config, session.store(), &results, output)
}

pub fn print_config(config: &ScanConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

#[cfg(feature = "ocr")]
fn build_extractor() -> Arc<dyn TextExtractor> {
    match docsee_scan::OcrsExtractor::with_defaults() {
        Ok(extractor) => Arc::new(extractor),
        Err(e) => {
            warn!(error = %e, "OCR models unavailable; text extraction disabled");
            Arc::new(docsee_scan::NullExtractor)
        }
    }
}

#[cfg(not(feature = "ocr"))]
fn build_extractor() -> Arc<dyn TextExtractor> {
    info!("Built without OCR; text extraction yields nothing");
    Arc::new(docsee_scan::NullExtractor)
}

/// Poll the dispatcher on the configured interval until every index is
/// ready or the wait budget runs out. Missing indices are reported and
/// left out.
async fn collect_results(
    dispatcher: &ExtractionDispatcher,
    indices: &[ImageIndex],
    config: &ScanConfig,
    output: &OutputArgs,
) -> BTreeMap<ImageIndex, Vec<TextHit>> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(output.wait_secs);
    let mut poll = tokio::time::interval(Duration::from_millis(config.poll_interval_ms.max(1)));

    loop {
        poll.tick().await;
        let pending = indices.iter().filter(|i| !dispatcher.is_ready(**i)).count();
        if pending == 0 {
            break;
        }
        if tokio::time::Instant::now() >= deadline {
            warn!(pending, "Gave up waiting for text extraction");
            break;
        }
        debug!(pending, "Waiting for text extraction");
    }

    indices
        .iter()
        .filter_map(|index| dispatcher.result(*index).map(|hits| (*index, hits)))
        .collect()
}

fn write_outputs(
    config: &ScanConfig,
    store: &CaptureStore,
    results: &BTreeMap<ImageIndex, Vec<TextHit>>,
    output: &OutputArgs,
) -> Result<()> {
    std::fs::create_dir_all(&output.out_dir)?;

    for index in store.indices() {
        let page = store.require(index)?;
        let path = output.out_dir.join(format!("page_{index:03}.png"));
        page.save(&path)
            .map_err(|err| DocseeError::Image(format!("failed to write {}: {err}", path.display())))?;
        info!(index, path = %path.display(), "Page written");
    }

    let mut all_hits = Vec::new();
    for (index, hits) in results {
        println!("--- page {index} ({} lines) ---", hits.len());
        println!("{}", format_text(hits));
        all_hits.extend(hits.iter().cloned());
    }
    if !all_hits.is_empty() {
        let path = export_text(&all_hits, output.out_dir.join(default_text_name()))?;
        println!("text saved to {}", path.display());
    }

    if output.pdf {
        let assembler = PdfAssembler::from_config(&config.output);
        let path = assembler.assemble(&store.pages(), &output.out_dir.join(default_pdf_name()))?;
        println!("PDF saved to {}", path.display());
    }
    Ok(())
}
