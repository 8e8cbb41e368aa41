//! Axis-aligned bounding boxes.

use glam::DVec3;

use crate::transform::Transform;

/// Slack used by containment tests so boxes sitting exactly on a face of the
/// container are not rejected by rounding noise.
pub const CONTAINMENT_EPSILON: f64 = 1e-9;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: DVec3,
    /// Maximum corner.
    pub max: DVec3,
}

impl Aabb {
    /// Build a box from two opposite corners in any order.
    pub fn new(a: DVec3, b: DVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Build a box centred on `center` with the given half extents.
    pub fn from_center_half_extents(center: DVec3, half_extents: DVec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Smallest box containing every point, or `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::new(first, first), |acc, p| Self {
            min: acc.min.min(p),
            max: acc.max.max(p),
        }))
    }

    /// Unit cube centred on the origin.
    pub fn unit() -> Self {
        Self::from_center_half_extents(DVec3::ZERO, DVec3::splat(0.5))
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> DVec3 {
        (self.max - self.min) * 0.5
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// The eight corners.
    pub fn corners(&self) -> [DVec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            DVec3::new(a.x, a.y, a.z),
            DVec3::new(b.x, a.y, a.z),
            DVec3::new(a.x, b.y, a.z),
            DVec3::new(b.x, b.y, a.z),
            DVec3::new(a.x, a.y, b.z),
            DVec3::new(b.x, a.y, b.z),
            DVec3::new(a.x, b.y, b.z),
            DVec3::new(b.x, b.y, b.z),
        ]
    }

    /// Whether the interiors of the two boxes overlap. Boxes that only share
    /// a face do not intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// Whether `other` lies fully inside this box (within
    /// [`CONTAINMENT_EPSILON`]).
    pub fn contains(&self, other: &Aabb) -> bool {
        other.min.cmpge(self.min - CONTAINMENT_EPSILON).all()
            && other.max.cmple(self.max + CONTAINMENT_EPSILON).all()
    }

    /// World-space box enclosing this local box under `transform`.
    pub fn transformed(&self, transform: &Transform) -> Aabb {
        let [first, rest @ ..] = self
            .corners()
            .map(|c| transform.position + transform.orientation * (c * transform.scale));
        rest.iter().fold(Aabb::new(first, first), |acc, p| Aabb {
            min: acc.min.min(*p),
            max: acc.max.max(*p),
        })
    }

    /// Scale the box about the local origin.
    pub fn scaled(&self, scale: DVec3) -> Aabb {
        Aabb::new(self.min * scale, self.max * scale)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::unit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DQuat;

    #[test]
    fn touching_boxes_do_not_intersect() {
        let a = Aabb::new(DVec3::ZERO, DVec3::ONE);
        let b = Aabb::new(DVec3::new(1.0, 0.0, 0.0), DVec3::new(2.0, 1.0, 1.0));
        assert!(!a.intersects(&b));
    }

    #[test]
    fn overlapping_boxes_intersect() {
        let a = Aabb::new(DVec3::ZERO, DVec3::ONE);
        let b = Aabb::new(DVec3::splat(0.5), DVec3::splat(1.5));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn contains_accepts_flush_box() {
        let outer = Aabb::new(DVec3::ZERO, DVec3::ONE);
        assert!(outer.contains(&outer));
        let outside = Aabb::new(DVec3::splat(0.5), DVec3::splat(1.01));
        assert!(!outer.contains(&outside));
    }

    #[test]
    fn transformed_box_grows_under_yaw() {
        let local = Aabb::from_center_half_extents(DVec3::ZERO, DVec3::new(1.0, 0.5, 1.0));
        let t = Transform {
            orientation: DQuat::from_rotation_z(std::f64::consts::FRAC_PI_4),
            ..Transform::IDENTITY
        };
        let world = local.transformed(&t);
        let expected = std::f64::consts::FRAC_1_SQRT_2 * 1.5;
        assert!((world.half_extents().x - expected).abs() < 1e-12);
        assert!((world.half_extents().z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn from_points_empty_is_none() {
        assert!(Aabb::from_points(std::iter::empty()).is_none());
    }
}
