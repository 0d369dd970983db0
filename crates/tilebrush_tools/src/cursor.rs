//! Virtual cursor history for cursor flow

use glam::Vec3;

/// How many recent hit positions the history keeps
pub const CURSOR_HISTORY_LEN: usize = 3;
/// Samples closer than this to the last entry are rejected
pub const MIN_SAMPLE_DISTANCE: f32 = 0.01;

/// Weight falloff per step of age when smoothing the direction
const SMOOTHING: f32 = 0.5;

/// A bounded trail of recent build positions.
///
/// Only used to estimate a flow direction for auto-advancing the 3-D cursor
/// after a build; cleared whenever a tool session ends.
#[derive(Debug, Clone, Default)]
pub struct VirtualCursorHistory {
    points: Vec<Vec3>,
}

impl VirtualCursorHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append a hit position; rejected when it sits within
    /// `MIN_SAMPLE_DISTANCE` of the newest entry. Returns whether the point
    /// was kept.
    pub fn push(&mut self, point: Vec3) -> bool {
        if let Some(&last) = self.points.last() {
            if last.distance(point) < MIN_SAMPLE_DISTANCE {
                return false;
            }
        }
        self.points.push(point);
        if self.points.len() > CURSOR_HISTORY_LEN {
            self.points.remove(0);
        }
        true
    }

    /// Exponentially-smoothed flow direction, newest motion weighted
    /// heaviest. `None` until two samples exist.
    pub fn direction(&self) -> Option<Vec3> {
        if self.points.len() < 2 {
            return None;
        }

        let mut sum = Vec3::ZERO;
        let steps = self.points.len() - 1;
        for i in 0..steps {
            let delta = self.points[i + 1] - self.points[i];
            let age = (steps - 1 - i) as i32;
            sum += delta.normalize_or_zero() * SMOOTHING.powi(age);
        }

        let dir = sum.normalize_or_zero();
        (dir != Vec3::ZERO).then_some(dir)
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_near_duplicates() {
        let mut history = VirtualCursorHistory::new();
        assert!(history.push(Vec3::ZERO));
        assert!(!history.push(Vec3::splat(MIN_SAMPLE_DISTANCE * 0.1)));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_bounded_length() {
        let mut history = VirtualCursorHistory::new();
        for i in 0..6 {
            history.push(Vec3::X * i as f32);
        }
        assert_eq!(history.len(), CURSOR_HISTORY_LEN);
    }

    #[test]
    fn test_direction_follows_motion() {
        let mut history = VirtualCursorHistory::new();
        history.push(Vec3::ZERO);
        history.push(Vec3::X);
        let dir = history.direction().unwrap();
        assert!((dir - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_direction_weights_recent_motion() {
        let mut history = VirtualCursorHistory::new();
        history.push(Vec3::ZERO);
        history.push(Vec3::X);
        history.push(Vec3::X + Vec3::Y);
        // The newer +Y step dominates the older +X step
        let dir = history.direction().unwrap();
        assert!(dir.y > dir.x);
        assert!(dir.x > 0.0);
    }

    #[test]
    fn test_no_direction_until_two_samples() {
        let mut history = VirtualCursorHistory::new();
        assert!(history.direction().is_none());
        history.push(Vec3::ZERO);
        assert!(history.direction().is_none());
    }
}
