//! The ephemeral working plane anchored at the 3-D cursor

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::math::{axis_snap, EPSILON};

/// The build plane used when a raycast hits no existing geometry.
///
/// Origin is the 3-D cursor; `normal` and `up` are unit vectors kept
/// mutually orthogonal, with `right = up x normal`. The `rotation` angle
/// (radians around the normal) is applied to `up`/`right` before any use, so
/// the stored axes always stay axis-snapped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorkingPlane {
    pub origin: Vec3,
    pub normal: Vec3,
    pub up: Vec3,
    /// Rotation around the normal applied to the basis before use
    pub rotation: f32,
    /// When set, view changes no longer rebuild the axes
    pub locked: bool,
}

impl Default for WorkingPlane {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            normal: Vec3::Z,
            up: Vec3::Y,
            rotation: 0.0,
            locked: false,
        }
    }
}

impl WorkingPlane {
    /// Build a plane from explicit axes, orthogonalizing `up` against the
    /// normal. Returns `None` when the axes are degenerate or parallel.
    pub fn from_axes(origin: Vec3, normal: Vec3, up: Vec3) -> Option<Self> {
        if normal.length_squared() <= EPSILON {
            return None;
        }
        let normal = normal.normalize();

        // Gram-Schmidt: remove the component of up parallel to the normal
        let projected = up - normal * normal.dot(up);
        if projected.length_squared() <= EPSILON {
            return None;
        }

        Some(Self {
            origin,
            normal,
            up: projected.normalize(),
            rotation: 0.0,
            locked: false,
        })
    }

    /// The rotated basis as `(right, up)`, with `right = up x normal`
    pub fn basis(&self) -> (Vec3, Vec3) {
        let spin = Quat::from_axis_angle(self.normal, self.rotation);
        let up = spin * self.up;
        (up.cross(self.normal), up)
    }

    /// The rotated right axis
    pub fn right(&self) -> Vec3 {
        self.basis().0
    }

    /// Signed perpendicular distance from a point to the plane
    pub fn distance_to(&self, point: Vec3) -> f32 {
        (point - self.origin).dot(self.normal)
    }

    /// Whether a point lies on the plane within tolerance
    pub fn contains(&self, point: Vec3) -> bool {
        self.distance_to(point).abs() < EPSILON
    }

    /// Re-derive the axes from the current view, snapped to world axes.
    ///
    /// The normal snaps to face the viewer and `up` snaps from the view's up
    /// vector. If the snapped axes collide and no orthogonal up can be
    /// derived, the plane is left unchanged. Locked planes never update.
    /// Returns whether the axes changed.
    pub fn rebuild_from_view(&mut self, view_dir: Vec3, view_up: Vec3) -> bool {
        if self.locked {
            return false;
        }

        let normal = axis_snap(view_dir, true);
        let mut up = axis_snap(view_up, false);

        if normal.dot(up).abs() > EPSILON {
            // Snapped up collides with the normal; fall back to the raw view
            // up orthogonalized against the snapped normal
            let projected = view_up - normal * normal.dot(view_up);
            if projected.length_squared() <= EPSILON {
                return false;
            }
            up = axis_snap(projected, false);
            if normal.dot(up).abs() > EPSILON {
                return false;
            }
        }

        let changed = normal != self.normal || up != self.up;
        self.normal = normal;
        self.up = up;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_axes_orthogonalizes_up() {
        let plane = WorkingPlane::from_axes(Vec3::ZERO, Vec3::Z, Vec3::new(0.3, 1.0, 0.4)).unwrap();
        assert!(plane.normal.dot(plane.up).abs() < EPSILON);
        assert!((plane.up.length() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_from_axes_rejects_parallel_up() {
        assert!(WorkingPlane::from_axes(Vec3::ZERO, Vec3::Z, Vec3::Z).is_none());
        assert!(WorkingPlane::from_axes(Vec3::ZERO, Vec3::ZERO, Vec3::Y).is_none());
    }

    #[test]
    fn test_basis_is_right_handed() {
        let plane = WorkingPlane::default();
        let (right, up) = plane.basis();
        assert!((right - Vec3::X).length() < EPSILON);
        assert!((up - Vec3::Y).length() < EPSILON);
        assert!((right.cross(up) - plane.normal).length() < EPSILON);
    }

    #[test]
    fn test_rotation_spins_basis_around_normal() {
        let plane = WorkingPlane {
            rotation: std::f32::consts::FRAC_PI_2,
            ..Default::default()
        };
        let (right, up) = plane.basis();
        assert!((up - (-Vec3::X)).length() < 1e-4);
        assert!((right - Vec3::Y).length() < 1e-4);
    }

    #[test]
    fn test_rebuild_snaps_normal_toward_viewer() {
        let mut plane = WorkingPlane::default();
        // Looking down -Y: the plane should face back up +Y
        assert!(plane.rebuild_from_view(Vec3::new(0.1, -0.95, 0.2), Vec3::Z));
        assert_eq!(plane.normal, Vec3::Y);
        assert_eq!(plane.up, Vec3::Z);
    }

    #[test]
    fn test_rebuild_leaves_plane_when_axes_collide() {
        let mut plane = WorkingPlane::default();
        let before = (plane.normal, plane.up);
        // View up parallel to the snapped normal and no usable fallback
        assert!(!plane.rebuild_from_view(-Vec3::Z, Vec3::Z));
        assert_eq!((plane.normal, plane.up), before);
    }

    #[test]
    fn test_locked_plane_ignores_view() {
        let mut plane = WorkingPlane {
            locked: true,
            ..Default::default()
        };
        assert!(!plane.rebuild_from_view(Vec3::new(0.0, -1.0, 0.0), Vec3::Z));
        assert_eq!(plane.normal, Vec3::Z);
    }
}
