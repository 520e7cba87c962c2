pub mod event;
pub mod interval;
pub mod normalizer;
pub mod window;

pub use event::{EventTime, Organizer, RawEvent, TimeMarker};
pub use interval::{BUSY_TITLE, Interval, PersonId, Schedule, overlaps};
pub use normalizer::{MalformedEventError, NormalizedCalendar, RejectedEvent, normalize_events};
pub use window::{TimeWindow, WindowError};
