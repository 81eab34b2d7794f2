// Anchor geometry for the base and moving platform rings
//
// Both rings are flat: each anchor sits at (r*cos(a), r*sin(a), 0) in its
// own frame. The six base anchors and six platform anchors are index-paired,
// one leg per index.

use std::fmt;

/// A Stewart platform has six legs; every per-leg array in this crate is
/// index-aligned with the anchor index.
pub const LEG_COUNT: usize = 6;

/// 3-vector in millimeters
pub type Vec3 = [f64; 3];

/// Which anchor ring a configuration error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ring {
    Base,
    Platform,
}

impl fmt::Display for Ring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ring::Base => write!(f, "base"),
            Ring::Platform => write!(f, "platform"),
        }
    }
}

/// Error types for rig geometry construction
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{ring} ring expects {LEG_COUNT} anchor angles, got {count}")]
    AngleCount { ring: Ring, count: usize },

    #[error("{ring} ring radius must be positive, got {radius}")]
    Radius { ring: Ring, radius: f64 },

    #[error("{ring} anchor {index}: angle {angle} outside [0, 360)")]
    Angle { ring: Ring, index: usize, angle: f64 },
}

/// Fixed anchor points of the rig, computed once at startup and shared
/// read-only across control ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformGeometry {
    base_anchors: [Vec3; LEG_COUNT],
    platform_anchors: [Vec3; LEG_COUNT],
}

impl PlatformGeometry {
    /// Build the anchor sets from ring radii (mm) and anchor angles (degrees).
    ///
    /// Fails if either slice is not exactly six angles, an angle falls
    /// outside [0, 360), or a radius is not positive.
    pub fn new(
        base_radius: f64,
        base_angles: &[f64],
        platform_radius: f64,
        platform_angles: &[f64],
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            base_anchors: ring_anchors(Ring::Base, base_radius, base_angles)?,
            platform_anchors: ring_anchors(Ring::Platform, platform_radius, platform_angles)?,
        })
    }

    pub fn base_anchors(&self) -> &[Vec3; LEG_COUNT] {
        &self.base_anchors
    }

    pub fn platform_anchors(&self) -> &[Vec3; LEG_COUNT] {
        &self.platform_anchors
    }
}

fn ring_anchors(ring: Ring, radius: f64, angles: &[f64]) -> Result<[Vec3; LEG_COUNT], ConfigError> {
    if angles.len() != LEG_COUNT {
        return Err(ConfigError::AngleCount {
            ring,
            count: angles.len(),
        });
    }
    if radius <= 0.0 {
        return Err(ConfigError::Radius { ring, radius });
    }
    for (index, &angle) in angles.iter().enumerate() {
        if !(0.0..360.0).contains(&angle) {
            return Err(ConfigError::Angle { ring, index, angle });
        }
    }

    let mut anchors = [[0.0; 3]; LEG_COUNT];
    for (anchor, &angle) in anchors.iter_mut().zip(angles) {
        let rad = angle.to_radians();
        *anchor = [radius * rad.cos(), radius * rad.sin(), 0.0];
    }
    Ok(anchors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        BASE_ANGLES_DEG, BASE_RADIUS_MM, PLATFORM_ANGLES_DEG, PLATFORM_RADIUS_MM,
    };

    fn default_geometry() -> PlatformGeometry {
        PlatformGeometry::new(
            BASE_RADIUS_MM,
            &BASE_ANGLES_DEG,
            PLATFORM_RADIUS_MM,
            &PLATFORM_ANGLES_DEG,
        )
        .expect("default rig geometry is valid")
    }

    #[test]
    fn anchors_lie_on_the_ring() {
        let geometry = default_geometry();
        for anchor in geometry.base_anchors() {
            let radius = (anchor[0] * anchor[0] + anchor[1] * anchor[1]).sqrt();
            assert!((radius - BASE_RADIUS_MM).abs() < 1e-9);
            assert_eq!(anchor[2], 0.0);
        }
        // Spot-check the first platform anchor at 350 degrees
        let p0 = geometry.platform_anchors()[0];
        assert!((p0[0] - 100.0 * 350.0_f64.to_radians().cos()).abs() < 1e-9);
        assert!((p0[1] - 100.0 * 350.0_f64.to_radians().sin()).abs() < 1e-9);
    }

    #[test]
    fn rejects_wrong_angle_count() {
        let err = PlatformGeometry::new(100.0, &[0.0, 60.0, 120.0], 100.0, &PLATFORM_ANGLES_DEG)
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::AngleCount {
                ring: Ring::Base,
                count: 3
            }
        );
    }

    #[test]
    fn rejects_non_positive_radius() {
        let err =
            PlatformGeometry::new(BASE_RADIUS_MM, &BASE_ANGLES_DEG, 0.0, &PLATFORM_ANGLES_DEG)
                .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Radius {
                ring: Ring::Platform,
                radius: 0.0
            }
        );
    }

    #[test]
    fn rejects_angle_outside_turn() {
        // 360 itself is out: the domain is [0, 360)
        let angles = [340.0, 20.0, 100.0, 360.0, 240.0, 280.0];
        let err =
            PlatformGeometry::new(BASE_RADIUS_MM, &angles, PLATFORM_RADIUS_MM, &PLATFORM_ANGLES_DEG)
                .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Angle {
                ring: Ring::Base,
                index: 3,
                angle: 360.0
            }
        );
    }
}
