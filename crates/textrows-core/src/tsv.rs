//! Parser for Tesseract's `tsv` output
//!
//! Columns: `level page_num block_num par_num line_num word_num left top
//! width height conf text`. The first line is a header.

use crate::error::TextRowsError;
use serde::Serialize;

const COLUMNS: usize = 12;

/// One row of Tesseract TSV output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordBox {
    pub level: u32,
    pub page_num: u32,
    pub block_num: u32,
    pub par_num: u32,
    pub line_num: u32,
    pub word_num: u32,
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
    /// Recognition confidence in 0..=100, or -1 for non-word rows
    pub conf: f32,
    pub text: String,
}

impl WordBox {
    pub fn right(&self) -> i64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> i64 {
        self.top + self.height
    }
}

/// Parse a whole TSV document
///
/// Blank lines are skipped. A row may omit the trailing text column, in
/// which case the text is empty.
pub fn parse_tsv(input: &str) -> Result<Vec<WordBox>, TextRowsError> {
    let mut words = Vec::new();

    for (index, line) in input.lines().enumerate() {
        let line_no = index + 1;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || (index == 0 && line.starts_with("level")) {
            continue;
        }
        words.push(parse_row(line, line_no)?);
    }

    tracing::trace!(rows = words.len(), "parsed tesseract tsv");
    Ok(words)
}

fn parse_row(line: &str, line_no: usize) -> Result<WordBox, TextRowsError> {
    let fields: Vec<&str> = line.splitn(COLUMNS, '\t').collect();
    if fields.len() < COLUMNS - 1 {
        return Err(TextRowsError::Tsv {
            line: line_no,
            message: format!("expected {} columns, found {}", COLUMNS, fields.len()),
        });
    }

    let int = |i: usize, name: &str| -> Result<i64, TextRowsError> {
        fields[i].trim().parse().map_err(|_| TextRowsError::Tsv {
            line: line_no,
            message: format!("invalid {} '{}'", name, fields[i]),
        })
    };
    let count = |i: usize, name: &str| -> Result<u32, TextRowsError> {
        u32::try_from(int(i, name)?).map_err(|_| TextRowsError::Tsv {
            line: line_no,
            message: format!("negative {}", name),
        })
    };

    let conf = fields[10].trim().parse().map_err(|_| TextRowsError::Tsv {
        line: line_no,
        message: format!("invalid conf '{}'", fields[10]),
    })?;

    Ok(WordBox {
        level: count(0, "level")?,
        page_num: count(1, "page_num")?,
        block_num: count(2, "block_num")?,
        par_num: count(3, "par_num")?,
        line_num: count(4, "line_num")?,
        word_num: count(5, "word_num")?,
        left: int(6, "left")?,
        top: int(7, "top")?,
        width: int(8, "width")?,
        height: int(9, "height")?,
        conf,
        text: fields.get(11).copied().unwrap_or_default().to_string(),
    })
}
