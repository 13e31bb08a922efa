//! The two search engines over an [`Index`](crate::index::Index).

pub mod similarity;
pub mod substructure;

use crate::error::{Error, Result};

pub use similarity::{SimilarityHit, SimilarityQuery};
pub use substructure::{SubstructureHit, SubstructureQuery};

///Positive limits only; the count is returned as a usize for truncation
pub(crate) fn check_limit(limit: i64) -> Result<usize> {

    match limit > 0 {
        true => Ok(limit as usize),
        false => Err(Error::InvalidArgument(format!("limit must be positive, got {}", limit))),
    }
}
