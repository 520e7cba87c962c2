pub mod calendar;
pub mod overlap;
pub mod search;
pub mod storage;
pub mod sync;

pub use calendar::{Interval, PersonId, RawEvent, Schedule, TimeWindow};
pub use overlap::{OverlapRecord, OverlapReport, Statistics, find_overlaps};
pub use search::{OverlapSearch, SearchError, SearchOutcome, SearchRequest, ValidationError};
