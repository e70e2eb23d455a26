//! Profile name matching: normalization, tokenizing, scoring.

pub mod normalize;
pub mod score;
pub mod tokenize;

pub use normalize::{normalize, normalize_opt};
pub use score::{is_match, score, ACCEPT_THRESHOLD};
pub use tokenize::{split_profiles, split_profiles_opt};
