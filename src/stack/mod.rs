//! Stage scheduling.
//!
//! Events resolve one stage at a time. The scheduler is an explicit stack of
//! frames, one per event in flight:
//! - **Nesting** pushes a frame; the parent resumes at its own cursor once the
//!   child pops
//! - **Cancellation** drops the cancelled event's frame and anything above it
//! - **Insertion** lets an ability splice extra stages into a running event
//!
//! ## Example Usage
//!
//! ```
//! use rust_sgs::events::{GameEventKind, Stage};
//! use rust_sgs::stack::StageScheduler;
//!
//! let mut scheduler = StageScheduler::new();
//! scheduler.involve(GameEventKind::CardUse);
//! scheduler.involve(GameEventKind::CardEffect);
//!
//! // The effect is countered.
//! scheduler.skip_event_process(GameEventKind::CardEffect);
//! assert_eq!(scheduler.current(), Some(Stage::PreCardUse));
//! ```

mod scheduler;
mod sequence;

pub use scheduler::StageScheduler;
pub use sequence::StageSequence;
