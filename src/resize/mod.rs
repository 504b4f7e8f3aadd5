//! Aspect-ratio-locked resizing
//!
//! When the user changes one side of the window, the other side is corrected
//! to keep the aspect ratio of the background image. Each programmatic
//! correction produces a size change of its own, so the axes take turns:
//! while one axis has a correction in flight, changes on the other axis are
//! treated as the echo of that correction and never trigger one back.
//!
//! A correction cycle looks like this:
//!
//! ```text
//! Idle --size change--> Pending --settle timer--> Unlocking --unlock timer--> Idle
//!                         ^   |
//!                         +---+ further size changes re-arm the settle timer
//! ```

mod debouncer;
mod timer;
mod window;

pub use debouncer::{
    AxisPhase, Correction, ResizeCoordinator, ResizeDebouncer, ResizeDelays, SizeChange,
    TimerOutcome,
};
pub use timer::{TimerId, TimerScheduler, TimerThread};
pub use window::{AspectLockedWindow, WindowHandle, stored_geometry, stored_min_size};
