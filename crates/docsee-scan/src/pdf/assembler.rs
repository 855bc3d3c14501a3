// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Multi-page PDF assembly from captured pages using `printpdf` 0.8.
//
// printpdf 0.8 is data-oriented: each page is a `PdfPage` holding a list of
// `Op`s, and the whole document is serialised with `PdfDocument::save()`.

use std::path::{Path, PathBuf};

use docsee_core::PaperSize;
use docsee_core::config::OutputConfig;
use docsee_core::error::{DocseeError, Result};
use image::RgbImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

/// Page margin on every side.
const MARGIN_MM: f32 = 15.0;
/// Native resolution assumed for captured pages.
const IMAGE_DPI: f32 = 150.0;

/// Combines captured pages into a single document on disk.
pub trait DocumentAssembler {
    /// Write `pages` to `path`, one page per image, and return the path.
    ///
    /// # Errors
    ///
    /// [`DocseeError::Assembly`] when there is nothing to assemble or the
    /// document cannot be produced; [`DocseeError::Io`] when writing fails.
    fn assemble(&self, pages: &[RgbImage], path: &Path) -> Result<PathBuf>;
}

/// Lays out each page image centred on a sheet of the configured paper size.
#[derive(Debug, Clone)]
pub struct PdfAssembler {
    paper_size: PaperSize,
    title: String,
}

impl PdfAssembler {
    pub fn new(paper_size: PaperSize, title: impl Into<String>) -> Self {
        Self {
            paper_size,
            title: title.into(),
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(config.paper_size, config.title.clone())
    }

    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (Mm(w_mm as f32), Mm(h_mm as f32))
    }

    /// Serialise `pages` to PDF bytes.
    #[instrument(skip(self, pages), fields(pages = pages.len()))]
    pub fn render(&self, pages: &[RgbImage]) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(DocseeError::Assembly("no pages to assemble".into()));
        }

        let (page_w, page_h) = self.page_dimensions();
        let usable_w_pt = Mm(page_w.0 - 2.0 * MARGIN_MM).into_pt().0;
        let usable_h_pt = Mm(page_h.0 - 2.0 * MARGIN_MM).into_pt().0;
        if usable_w_pt <= 0.0 || usable_h_pt <= 0.0 {
            return Err(DocseeError::Assembly(format!(
                "paper {:?} is smaller than its margins",
                self.paper_size
            )));
        }
        let margin_pt = Mm(MARGIN_MM).into_pt().0;

        info!(paper = ?self.paper_size, title = %self.title, "Assembling PDF");

        let mut doc = PdfDocument::new(&self.title);
        let mut pdf_pages = Vec::with_capacity(pages.len());

        for (number, page) in pages.iter().enumerate() {
            let (width, height) = page.dimensions();
            if width == 0 || height == 0 {
                return Err(DocseeError::Assembly(format!("page {number} is empty")));
            }

            let raw = RawImage {
                pixels: RawImageData::U8(page.as_raw().clone()),
                width: width as usize,
                height: height as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            let img_w_pt = width as f32 / IMAGE_DPI * 72.0;
            let img_h_pt = height as f32 / IMAGE_DPI * 72.0;
            // Fit inside the margins, never upscale.
            let scale = (usable_w_pt / img_w_pt).min(usable_h_pt / img_h_pt).min(1.0);
            let rendered_w_pt = img_w_pt * scale;
            let rendered_h_pt = img_h_pt * scale;

            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(margin_pt + (usable_w_pt - rendered_w_pt) / 2.0)),
                    translate_y: Some(Pt(margin_pt + (usable_h_pt - rendered_h_pt) / 2.0)),
                    scale_x: Some(scale),
                    scale_y: Some(scale),
                    dpi: Some(IMAGE_DPI),
                    rotate: None,
                },
            }];
            debug!(number, width, height, scale, "Page laid out");
            pdf_pages.push(PdfPage::new(page_w, page_h, ops));
        }

        doc.with_pages(pdf_pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "PDF serialisation produced warnings");
        }
        Ok(bytes)
    }
}

impl Default for PdfAssembler {
    fn default() -> Self {
        Self::from_config(&OutputConfig::default())
    }
}

impl DocumentAssembler for PdfAssembler {
    fn assemble(&self, pages: &[RgbImage], path: &Path) -> Result<PathBuf> {
        let bytes = self.render(pages)?;
        std::fs::write(path, &bytes)?;
        info!(path = %path.display(), pages = pages.len(), "PDF written");
        Ok(path.to_path_buf())
    }
}

/// `scanned_<timestamp>.pdf`
pub fn default_pdf_name() -> String {
    OutputConfig::timestamped_name("scanned", "pdf")
}
