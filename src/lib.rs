//! # Round Face Core Library
//!
//! A power-aware watch face for a 176x176 round display. The library decides
//! when to wake, what to redraw, and how touch input changes the display.
//!
//! ## Design Philosophy
//!
//! ### Wake as little as possible
//! - **One schedule**: every part of the watch that needs the screen refreshed
//!   registers a named rate in [`rates::RateRegistry`]; the fastest one wins.
//! - **Wall-clock aligned**: [`scheduler::WakeScheduler`] ticks just after
//!   each multiple of the rate, so the second hand moves with the real second.
//! - **Face down is slow**: paired rates drop to their conservative period
//!   while the watch lies face down.
//!
//! ### Draw as little as possible
//! - **Dirty fields**: [`face::Face`] remembers what each region shows and
//!   only redraws regions whose value changed.
//! - **Save-unders**: the hands keep a copy of the pixels they cover and put
//!   them back before moving, so no full clear is ever needed.
//!
//! ### Data Flow
//! 1. **Event or timer** arrives at [`watch::Watch`]
//! 2. **Scheduler** picks the effective rate and calls the face
//! 3. **Face** redraws dirty fields onto a [`framebuffer::Canvas`]
//! 4. **Face** reports the rate it needs back into the registry
//!
//! ## Example
//! ```
//! use round_face_lib::rates::{timescale, Rate, RateRegistry, CLOCK};
//!
//! let mut rates = RateRegistry::new();
//! rates.set_rate(CLOCK, timescale(1));
//! assert_eq!(rates.effective_rate(), Rate::Every(1_000));
//!
//! rates.set_conservative(true);
//! assert_eq!(rates.effective_rate(), Rate::Every(60_000));
//! ```

// Module declarations
pub mod config;
pub mod events;
pub mod face;
pub mod framebuffer;
pub mod geometry;
pub mod gesture;
pub mod glyphs;
pub mod orientation;
pub mod rates;
pub mod scheduler;
pub mod timers;
pub mod watch;

pub use config::{FaceOptions, Options, TomlFile};
pub use events::Event;
pub use face::{DeviceStatus, Face};
pub use framebuffer::{Canvas, Color, FrameBuffer};
pub use rates::{Rate, RateRegistry, RateRequest};
pub use watch::{Host, Mode, Watch};

// Test modules
#[cfg(test)]
mod tests;
