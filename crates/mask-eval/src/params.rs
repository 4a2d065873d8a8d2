use crate::mask::MASK_DELIMITER;

/// Annotation marking an image with no forged region.
pub const AUTHENTIC_LABEL: &str = "authentic";

/// Evaluation parameters for dataset scoring.
///
/// Defaults match the competition metric: the `authentic` sentinel, `;`
/// between masks, rows paired by position and scored in parallel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Params {
    /// Annotation that marks a row as having no mask. Compared ordinally.
    pub authentic_label: String,
    /// Separator between the RLE strings of one annotation.
    pub mask_delimiter: char,
    /// Score rows on the rayon thread pool.
    pub parallel: bool,
    /// Require paired solution and submission rows to carry the same row id.
    pub match_row_ids: bool,
}

impl Params {
    pub fn new() -> Self {
        Params {
            authentic_label: AUTHENTIC_LABEL.to_string(),
            mask_delimiter: MASK_DELIMITER,
            parallel: true,
            match_row_ids: false,
        }
    }

    /// True when `annotation` is the authentic sentinel.
    pub fn is_authentic(&self, annotation: &str) -> bool {
        annotation == self.authentic_label
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::new()
    }
}
