// Declare modules
pub mod event;
pub mod meeting;
pub mod occurrence;
pub mod schedule;

// Flatten so callers can `use crate::models::NormalizedEvent`.
pub use event::NormalizedEvent;
pub use meeting::{DeepLink, DeepLinkKind, JoinTarget, VideoMeetingInfo};
pub use occurrence::RawOccurrence;
pub use schedule::{Schedule, ScheduleResult};
