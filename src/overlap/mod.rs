pub mod engine;
pub mod stats;

pub use engine::{OverlapError, OverlapRecord, OverlapReport, Participant, find_overlaps};
pub use stats::{PersonStatistics, Statistics};
