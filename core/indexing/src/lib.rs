pub mod banding;
pub mod ranker;

pub use banding::{band_entries, dense_ranks, PRIORITY_HIGH, PRIORITY_LOW};
pub use ranker::AssociationRanker;
