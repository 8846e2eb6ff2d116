//! Line segmentation of scanned pages
//!
//! Tesseract supplies word boxes; accepted words are merged into one box
//! per line number, and each line is cut out of the page at full width and
//! saved as `line_<n>.png`.

pub mod batch;
pub mod crop;
pub mod error;
pub mod lines;
pub mod tesseract;
pub mod tsv;

pub use batch::{is_supported_image, BatchReport, FailedImage, ImageReport, RowExtractor};
pub use crop::{crop_rows, LineCrop};
pub use error::TextRowsError;
pub use lines::{accept_word, merge_lines, LineBox, DEFAULT_MIN_CONFIDENCE};
pub use tesseract::{Tesseract, WordSource, DEFAULT_LANG, DEFAULT_PROGRAM};
pub use tsv::{parse_tsv, WordBox};
