//! Zikr Companion Library
//!
//! Core of the devotional counter: Hijri calendar, time-of-day selection,
//! navigation with undo, milestone counting and persisted preferences.
//! The binary wraps it in a terminal event loop.

pub mod api;
pub mod app;
pub mod config;
pub mod corpus;
pub mod gesture;
pub mod hijri;
pub mod milestone;
pub mod navigation;
pub mod schedule;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod traits;

// Re-export commonly used types
pub use api::{DateServiceError, HijriApiClient, resolve_hijri};
pub use config::AppConfig;
pub use corpus::{Corpus, EntryId, PreferredSlot, SupplementaryZikr, ZikrEntry};
pub use gesture::PullGesture;
pub use hijri::{HijriDate, gregorian_to_hijri, is_leap_year, julian_day};
pub use milestone::{Celebration, CelebrationState, MilestoneTracker, Target, is_milestone, target};
pub use navigation::Navigator;
pub use schedule::{AzkarPeriod, TimeSlot, azkar_period, classify, format_clock};
pub use scheduler::{TaskHandle, TaskScheduler};
pub use session::{NavOutcome, SessionController, SessionState, SessionTimings, TapOutcome};
pub use store::{FileStore, Layout, MemoryStore, Preferences, Store};
pub use traits::{Clock, MockClock, SystemClock};
