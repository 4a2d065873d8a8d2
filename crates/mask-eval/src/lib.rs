pub mod assignment;
pub mod dataset;
pub mod error;
pub mod eval;
pub mod mask;
pub mod params;
pub mod score;
pub mod similarity;
pub mod types;

pub use assignment::linear_sum_assignment;
pub use dataset::Dataset;
pub use error::{Result, ScoreError};
pub use eval::{score, score_row, score_with, EvalSummary, MaskEval, RowEval, RowKind};
pub use params::{Params, AUTHENTIC_LABEL};
pub use score::{optimal_match, optimal_score, MatchResult, MatchedPair};
pub use similarity::{f1_score, similarity_matrix};
pub use types::{Mask, Rle, Run, ScoreRow, Shape};
