//! Per-image and per-directory row extraction

use crate::crop::{crop_rows, LineCrop};
use crate::error::TextRowsError;
use crate::lines::{merge_lines, DEFAULT_MIN_CONFIDENCE};
use crate::tesseract::{Tesseract, WordSource};
use serde::Serialize;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Result of processing one image
#[derive(Debug, Clone, Serialize)]
pub struct ImageReport {
    pub image: PathBuf,
    pub output_dir: PathBuf,
    pub words: usize,
    pub rows: Vec<LineCrop>,
}

/// An image that could not be processed
#[derive(Debug, Clone, Serialize)]
pub struct FailedImage {
    pub image: PathBuf,
    pub error: String,
}

/// Result of processing a directory
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub processed: Vec<ImageReport>,
    pub failed: Vec<FailedImage>,
}

impl BatchReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Whether `path` has a `.png`, `.jpg` or `.jpeg` extension (any case)
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Splits page images into per-line crops
pub struct RowExtractor<S: WordSource = Tesseract> {
    source: S,
    min_confidence: i32,
}

impl<S: WordSource> RowExtractor<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: i32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Write `line_<n>.png` crops of `image_path` into `output_dir/<stem>/`
    pub fn process_image(
        &self,
        image_path: &Path,
        output_dir: &Path,
    ) -> Result<ImageReport, TextRowsError> {
        let stem = image_path
            .file_stem()
            .ok_or_else(|| TextRowsError::NoFileStem(image_path.to_path_buf()))?;

        let image = image::open(image_path).map_err(|source| TextRowsError::Decode {
            path: image_path.to_path_buf(),
            source,
        })?;

        let words = self.source.words(image_path)?;
        let lines = merge_lines(&words, self.min_confidence);

        let subdir = output_dir.join(stem);
        std::fs::create_dir_all(&subdir).map_err(|source| TextRowsError::Io {
            path: subdir.clone(),
            source,
        })?;

        let rows = crop_rows(&image, &lines, &subdir)?;
        tracing::info!(
            image = %image_path.display(),
            words = words.len(),
            rows = rows.len(),
            "extracted rows"
        );

        Ok(ImageReport {
            image: image_path.to_path_buf(),
            output_dir: subdir,
            words: words.len(),
            rows,
        })
    }

    /// Process every supported image directly inside `src_dir`, in name order
    ///
    /// A failing image is recorded in the report and the rest still run;
    /// only a failure to list `src_dir` is returned as an error.
    pub fn process_directory(
        &self,
        src_dir: &Path,
        output_dir: &Path,
    ) -> Result<BatchReport, TextRowsError> {
        let io_err = |source| TextRowsError::Io {
            path: src_dir.to_path_buf(),
            source,
        };

        let mut images = Vec::new();
        for entry in std::fs::read_dir(src_dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && is_supported_image(&path) {
                images.push(path);
            }
        }
        images.sort();

        let mut report = BatchReport::default();
        for image in images {
            match self.process_image(&image, output_dir) {
                Ok(processed) => report.processed.push(processed),
                Err(err) => {
                    tracing::error!(
                        image = %image.display(),
                        error = %err,
                        "failed to process image"
                    );
                    report.failed.push(FailedImage {
                        image,
                        error: err.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}
