//! Merging word boxes into line boxes

use crate::tsv::WordBox;
use serde::Serialize;
use std::collections::BTreeMap;

/// Words at or below this confidence are dropped
pub const DEFAULT_MIN_CONFIDENCE: i32 = 80;

/// Union of the accepted word boxes sharing a line number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineBox {
    pub line_num: u32,
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl LineBox {
    fn from_word(word: &WordBox) -> Self {
        Self {
            line_num: word.line_num,
            left: word.left,
            top: word.top,
            right: word.right(),
            bottom: word.bottom(),
        }
    }

    fn extend(&mut self, word: &WordBox) {
        self.left = self.left.min(word.left);
        self.top = self.top.min(word.top);
        self.right = self.right.max(word.right());
        self.bottom = self.bottom.max(word.bottom());
    }
}

/// Whether a word takes part in line merging: its truncated confidence must
/// exceed `min_confidence` and its text must not be blank
pub fn accept_word(word: &WordBox, min_confidence: i32) -> bool {
    (word.conf.trunc() as i64) > i64::from(min_confidence) && !word.text.trim().is_empty()
}

/// Merge accepted words by `line_num`, ordered by line number
///
/// Line numbers restart in every block and paragraph; words from different
/// blocks with the same line number are merged into one box.
pub fn merge_lines(words: &[WordBox], min_confidence: i32) -> Vec<LineBox> {
    let mut lines: BTreeMap<u32, LineBox> = BTreeMap::new();

    for word in words.iter().filter(|w| accept_word(w, min_confidence)) {
        lines
            .entry(word.line_num)
            .and_modify(|line| line.extend(word))
            .or_insert_with(|| LineBox::from_word(word));
    }

    lines.into_values().collect()
}

#[cfg(test)]
pub(crate) fn word(
    line_num: u32,
    left: i64,
    top: i64,
    width: i64,
    height: i64,
    conf: f32,
    text: &str,
) -> WordBox {
    WordBox {
        level: 5,
        page_num: 1,
        block_num: 1,
        par_num: 1,
        line_num,
        word_num: 1,
        left,
        top,
        width,
        height,
        conf,
        text: text.to_string(),
    }
}
