//! Full-width row crops

use crate::error::TextRowsError;
use crate::lines::LineBox;
use image::{DynamicImage, GenericImageView, ImageFormat};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A row image written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineCrop {
    pub line_num: u32,
    pub top: u32,
    pub bottom: u32,
    pub path: PathBuf,
}

/// Cut each line out of `image` across its full width and save it as
/// `line_<line_num>.png` in `out_dir`
///
/// Boxes are clamped to the image; rows that end up empty are skipped.
pub fn crop_rows(
    image: &DynamicImage,
    lines: &[LineBox],
    out_dir: &Path,
) -> Result<Vec<LineCrop>, TextRowsError> {
    let (width, height) = image.dimensions();
    let mut crops = Vec::with_capacity(lines.len());

    for line in lines {
        let top = clamp(line.top, height);
        let bottom = clamp(line.bottom, height);
        if bottom <= top || width == 0 {
            tracing::warn!(
                line = line.line_num,
                top = line.top,
                bottom = line.bottom,
                "skipping empty row"
            );
            continue;
        }

        let path = out_dir.join(format!("line_{}.png", line.line_num));
        image
            .crop_imm(0, top, width, bottom - top)
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|source| TextRowsError::Encode {
                path: path.clone(),
                source,
            })?;

        crops.push(LineCrop {
            line_num: line.line_num,
            top,
            bottom,
            path,
        });
    }

    Ok(crops)
}

fn clamp(value: i64, max: u32) -> u32 {
    value.clamp(0, i64::from(max)) as u32
}
