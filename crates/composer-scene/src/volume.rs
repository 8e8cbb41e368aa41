//! Spawn volumes for randomized placement.

use glam::DVec3;

use crate::bounds::Aabb;
use crate::SceneError;

/// Axis-aligned region, in the export (Z-up) frame, inside which movable
/// objects are placed.
///
/// `min <= max` holds on every axis. A zero-width axis (`min == max`) is a
/// legal degenerate range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnVolume {
    min: DVec3,
    max: DVec3,
}

impl SpawnVolume {
    /// Build a volume, rejecting non-finite bounds and inverted axes.
    pub fn new(min: DVec3, max: DVec3) -> Result<Self, SceneError> {
        for (axis, lo, hi) in [('x', min.x, max.x), ('y', min.y, max.y), ('z', min.z, max.z)] {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(SceneError::NonFiniteVolume {
                    axis,
                    min: lo,
                    max: hi,
                });
            }
            if lo > hi {
                return Err(SceneError::InvertedVolume {
                    axis,
                    min: lo,
                    max: hi,
                });
            }
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> DVec3 {
        self.min
    }

    pub fn max(&self) -> DVec3 {
        self.max
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// The volume as a bounding box.
    pub fn as_aabb(&self) -> Aabb {
        Aabb {
            min: self.min,
            max: self.max,
        }
    }

    /// Sampling range left after pulling every face inward by
    /// `half_extents`, or `None` if any axis ends up inverted.
    pub fn shrunk(&self, half_extents: DVec3) -> Option<Aabb> {
        let min = self.min + half_extents;
        let max = self.max - half_extents;
        if min.cmpgt(max).any() {
            return None;
        }
        Some(Aabb { min, max })
    }
}

impl Default for SpawnVolume {
    /// A 1 m x 1 m tabletop patch, 0.5 m tall, resting on the ground plane.
    fn default() -> Self {
        Self {
            min: DVec3::new(-0.5, -0.5, 0.0),
            max: DVec3::new(0.5, 0.5, 0.5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_axis_is_rejected() {
        let err = SpawnVolume::new(DVec3::ZERO, DVec3::new(1.0, -1.0, 1.0)).unwrap_err();
        assert_eq!(
            err,
            SceneError::InvertedVolume {
                axis: 'y',
                min: 0.0,
                max: -1.0
            }
        );
    }

    #[test]
    fn non_finite_bounds_are_rejected() {
        let err = SpawnVolume::new(DVec3::ZERO, DVec3::new(1.0, 1.0, f64::INFINITY)).unwrap_err();
        assert_eq!(
            err,
            SceneError::NonFiniteVolume {
                axis: 'z',
                min: 0.0,
                max: f64::INFINITY
            }
        );
        assert!(matches!(
            SpawnVolume::new(DVec3::new(f64::NAN, 0.0, 0.0), DVec3::ONE),
            Err(SceneError::NonFiniteVolume { axis: 'x', .. })
        ));
    }

    #[test]
    fn degenerate_volume_is_legal() {
        let v = SpawnVolume::new(DVec3::ONE, DVec3::ONE).unwrap();
        assert_eq!(v.center(), DVec3::ONE);
        assert_eq!(v.shrunk(DVec3::ZERO).map(|b| b.size()), Some(DVec3::ZERO));
        assert!(v.shrunk(DVec3::splat(0.1)).is_none());
    }

    #[test]
    fn shrink_pulls_faces_inward() {
        let v = SpawnVolume::new(DVec3::splat(-1.0), DVec3::splat(1.0)).unwrap();
        let range = v.shrunk(DVec3::new(0.25, 0.5, 1.0)).unwrap();
        assert_eq!(range.min, DVec3::new(-0.75, -0.5, 0.0));
        assert_eq!(range.max, DVec3::new(0.75, 0.5, 0.0));
    }
}
