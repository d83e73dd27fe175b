//! Scene side of the sequencer
//!
//! No renderer is attached to the console, so animator calls are written
//! to the log instead.

use brickstep_core::{Animator, UnitId, Vec3};
use std::time::Duration;
use tracing::{debug, trace};

/// Animator that reports every call through `tracing`
#[derive(Debug, Default)]
pub struct TracingAnimator {
    triggered: u64,
}

impl TracingAnimator {
    /// Number of placement animations started so far
    pub fn triggered(&self) -> u64 {
        self.triggered
    }
}

impl Animator for TracingAnimator {
    fn trigger(&mut self, unit: &UnitId, from: Vec3, to: Vec3, duration: Duration) {
        self.triggered += 1;
        debug!(
            unit = %unit,
            from = ?from.to_array(),
            to = ?to.to_array(),
            duration_ms = duration.as_millis() as u64,
            "Animate unit"
        );
    }

    fn place(&mut self, unit: &UnitId, at: Vec3) {
        debug!(unit = %unit, at = ?at.to_array(), "Place unit");
    }

    fn set_visible(&mut self, unit: &UnitId, visible: bool) {
        trace!(unit = %unit, visible, "Set visibility");
    }
}
