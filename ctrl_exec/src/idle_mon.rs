//! Low effort monitor
//!
//! Tracks how long every joint of the suit has continuously demanded less than the idle effort
//! threshold. Time is taken from the sample timestamps so a replayed run behaves exactly like
//! the live one.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct IdleMonitor {
    /// Units: seconds
    timeout_s: f64,

    /// Time of the last sample which was not low effort, or of the first
    /// sample after a reset.
    last_effort_s: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl IdleMonitor {
    pub fn new(timeout_s: f64) -> Self {
        Self {
            timeout_s,
            last_effort_s: None,
        }
    }

    /// Restart the timer.
    pub fn reset(&mut self) {
        self.last_effort_s = None;
    }

    /// Feed one tick's effort evaluation, returning true once effort has been low for longer
    /// than the timeout.
    pub fn update(&mut self, effort_low: bool, time_s: f64) -> bool {
        match self.last_effort_s {
            Some(last_s) if effort_low => {
                let low_for_s = time_s - last_s;
                trace!("Low effort for {:.3} s", low_for_s);
                low_for_s > self.timeout_s
            }
            _ => {
                self.last_effort_s = Some(time_s);
                false
            }
        }
    }

    pub fn timeout_s(&self) -> f64 {
        self.timeout_s
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
