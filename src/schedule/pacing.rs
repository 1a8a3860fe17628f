use std::time::{Duration, Instant};

use crate::foundation::core::Fps;

/// Policy deciding when the next render step may run.
///
/// The compositor never sleeps; a driver asks the pacer for a tick before each step.
pub trait FramePacer {
    /// Return once the next step may run.
    fn wait_next_tick(&mut self);
}

/// Run steps back to back.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unpaced;

impl FramePacer for Unpaced {
    fn wait_next_tick(&mut self) {}
}

/// Tick at a fixed rate, measured from the previous deadline.
///
/// A late tick resets the schedule instead of bursting to catch up, so frames never pile up.
#[derive(Clone, Debug)]
pub struct RealTime {
    interval: Duration,
    next_deadline: Option<Instant>,
}

impl RealTime {
    pub fn new(fps: Fps) -> Self {
        Self {
            interval: Duration::from_secs_f64(fps.frame_duration_secs()),
            next_deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl FramePacer for RealTime {
    fn wait_next_tick(&mut self) {
        let now = Instant::now();
        let deadline = match self.next_deadline {
            Some(d) if d > now => {
                std::thread::sleep(d - now);
                d
            }
            _ => now,
        };
        self.next_deadline = Some(deadline + self.interval);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/pacing.rs"]
mod tests;
