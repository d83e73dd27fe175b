//! Animation collaborator interface
//!
//! The sequencer never plays animations itself. It tells an [`Animator`]
//! which unit to move, snap or hide and carries on without waiting.

use std::fmt;
use std::ops::{Add, Mul};
use std::time::Duration;

/// Distance a part travels when animated into place
pub const ANIMATION_DISTANCE: f64 = 10.0;

/// Length of a placement animation
pub const ANIMATION_DURATION: Duration = Duration::from_secs(1);

/// Name of a part or sub-assembly, as known to the scene
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct UnitId(pub String);

impl UnitId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Local position or direction in 3D space
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const DOWN: Vec3 = Vec3::new(0.0, -1.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Parse a vector string "x y z" into a Vec3
pub fn parse_vec3_string(s: &str) -> Option<Vec3> {
    let parts: Vec<f64> = s
        .split_whitespace()
        .map(|p| p.parse().ok())
        .collect::<Option<_>>()?;
    if parts.len() == 3 {
        Some(Vec3::new(parts[0], parts[1], parts[2]))
    } else {
        None
    }
}

/// Where a unit starts before it is animated into `to` along `direction`
pub fn approach_from(to: Vec3, direction: Vec3) -> Vec3 {
    to + direction * ANIMATION_DISTANCE
}

/// Receiver of the side effects produced by traversal
///
/// Calls are fire-and-forget. Implementations must tolerate being invoked
/// again for a unit that is already in the requested state.
pub trait Animator {
    /// Animate `unit` from `from` to `to` over `duration`
    fn trigger(&mut self, unit: &UnitId, from: Vec3, to: Vec3, duration: Duration);

    /// Snap `unit` to `at` without animating
    fn place(&mut self, unit: &UnitId, at: Vec3);

    /// Show or hide `unit`
    fn set_visible(&mut self, unit: &UnitId, visible: bool);
}

/// Animator that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAnimator;

impl Animator for NullAnimator {
    fn trigger(&mut self, _unit: &UnitId, _from: Vec3, _to: Vec3, _duration: Duration) {}

    fn place(&mut self, _unit: &UnitId, _at: Vec3) {}

    fn set_visible(&mut self, _unit: &UnitId, _visible: bool) {}
}

/// A single recorded animator call
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationEvent {
    Trigger { unit: UnitId, from: Vec3, to: Vec3 },
    Place { unit: UnitId, at: Vec3 },
    Visible { unit: UnitId, visible: bool },
}

impl AnimationEvent {
    pub fn unit(&self) -> &UnitId {
        match self {
            AnimationEvent::Trigger { unit, .. }
            | AnimationEvent::Place { unit, .. }
            | AnimationEvent::Visible { unit, .. } => unit,
        }
    }
}

/// Animator that records every call, for hosts that forward events elsewhere
#[derive(Debug, Clone, Default)]
pub struct AnimationLog {
    events: Vec<AnimationEvent>,
}

impl AnimationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[AnimationEvent] {
        &self.events
    }

    /// Take all recorded events, leaving the log empty
    pub fn drain(&mut self) -> Vec<AnimationEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Animator for AnimationLog {
    fn trigger(&mut self, unit: &UnitId, from: Vec3, to: Vec3, _duration: Duration) {
        self.events.push(AnimationEvent::Trigger {
            unit: unit.clone(),
            from,
            to,
        });
    }

    fn place(&mut self, unit: &UnitId, at: Vec3) {
        self.events.push(AnimationEvent::Place {
            unit: unit.clone(),
            at,
        });
    }

    fn set_visible(&mut self, unit: &UnitId, visible: bool) {
        self.events.push(AnimationEvent::Visible {
            unit: unit.clone(),
            visible,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vec3_string() {
        assert_eq!(parse_vec3_string("1 -2 0.5"), Some(Vec3::new(1.0, -2.0, 0.5)));
        assert_eq!(parse_vec3_string("  0   -1 0 "), Some(Vec3::DOWN));
        assert_eq!(parse_vec3_string("1 2"), None);
        assert_eq!(parse_vec3_string("1 2 3 4"), None);
        assert_eq!(parse_vec3_string("1 up 3"), None);
    }

    #[test]
    fn test_approach_from() {
        let start = approach_from(Vec3::new(1.0, 2.0, 3.0), Vec3::DOWN);
        assert_eq!(start, Vec3::new(1.0, -8.0, 3.0));
    }

    #[test]
    fn test_animation_log_drain() {
        let mut log = AnimationLog::new();
        let unit = UnitId::new("brick-1");
        log.set_visible(&unit, true);
        log.place(&unit, Vec3::ZERO);
        assert_eq!(log.events().len(), 2);
        assert_eq!(log.events()[0].unit(), &unit);

        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert!(log.events().is_empty());
    }
}
