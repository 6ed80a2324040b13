//! Timing for the ASCII Arena game loop.
//!
//! Two independent pieces:
//!
//! - [`FramePacer`]: computes how long to wait before the next frame so
//!   the loop runs at a target frame rate, subtracting the time the last
//!   frame took to compute. Monitors the frame budget and keeps metrics.
//! - [`SignalTimers`]: runs callbacks after a delay on a small dedicated
//!   runtime. Pending timers can be listed and are cancelled together at
//!   shutdown.
//!
//! # Integration
//!
//! ```ignore
//! let delay = pacer.next_delay_at(Instant::now());
//! let queue = queue.clone();
//! timers.schedule(delay, move || queue.enqueue_input(InputPack::signal(Signal::ComputeFrame)));
//! ```

mod error;
mod pacer;
mod timers;

pub use error::TickError;
pub use pacer::{FramePacer, PacerConfig, PacerMetrics};
pub use timers::{SignalTimers, TimerId};
