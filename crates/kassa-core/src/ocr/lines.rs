//! Reconstruction of text lines from word bounding boxes.
//!
//! The oracle returns words in no particular order. Receipt parsing needs
//! physical lines, so words are grouped by vertical position and ordered
//! horizontally within each group. Grouping is tolerant, not exact: when
//! two printed lines overlap vertically (skewed photos, crumpled paper)
//! they may merge, which downstream parsing treats as ordinary noise.

use super::WordBox;

/// Groups OCR words into text lines.
#[derive(Debug, Clone, Copy)]
pub struct LineReconstructor {
    y_tolerance: i32,
}

impl LineReconstructor {
    pub fn new(y_tolerance: i32) -> Self {
        Self { y_tolerance }
    }

    /// Rebuild reading-order lines from word boxes. The first element is
    /// the full-text blob and is skipped.
    pub fn reconstruct(&self, words: &[WordBox]) -> Vec<String> {
        if words.len() < 2 {
            return Vec::new();
        }

        let mut sorted: Vec<&WordBox> = words[1..].iter().collect();
        sorted.sort_by_key(|w| w.y());

        let mut lines = Vec::new();
        let mut current: Vec<&WordBox> = Vec::new();
        let mut reference_y: Option<i32> = None;

        for word in sorted {
            match reference_y {
                Some(y) if (word.y() - y).abs() < self.y_tolerance => {
                    current.push(word);
                }
                Some(_) => {
                    lines.push(Self::close_line(&mut current));
                    reference_y = Some(word.y());
                    current.push(word);
                }
                None => {
                    reference_y = Some(word.y());
                    current.push(word);
                }
            }
        }

        if !current.is_empty() {
            lines.push(Self::close_line(&mut current));
        }

        lines
    }

    /// Sort the accumulated words left-to-right and join them.
    fn close_line(words: &mut Vec<&WordBox>) -> String {
        words.sort_by_key(|w| w.x());
        let line = words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        words.clear();
        line
    }
}
