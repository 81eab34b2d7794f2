// Inverse kinematics for the six-leg platform
//
// Converts a platform pose (translation + rotation) to the six leg lengths
// required by the rigid-body constraint, and leg lengths to servo horn
// angles. All distances in millimeters, all angles in degrees.

use std::fmt;

use super::geometry::{LEG_COUNT, PlatformGeometry, Vec3};
use crate::config::HOME_HEIGHT_MM;

/// Operating envelope for translation components (mm)
pub const TRANSLATION_MIN_MM: f64 = 0.0;
pub const TRANSLATION_MAX_MM: f64 = 200.0;

/// Operating envelope for rotation components (degrees)
pub const ROTATION_LIMIT_DEG: f64 = 45.0;

/// Target platform pose: translation in mm, rotation in degrees.
///
/// Rotation composes as Rz(yaw) * Ry(pitch) * Rx(roll); roll is about X,
/// pitch about Y, yaw about Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Pose {
    /// Level platform at the rig's resting height
    pub fn home() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: HOME_HEIGHT_MM,
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
        }
    }
}

/// Pose fields, in validation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseField {
    X,
    Y,
    Z,
    Roll,
    Pitch,
    Yaw,
}

impl fmt::Display for PoseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoseField::X => write!(f, "x"),
            PoseField::Y => write!(f, "y"),
            PoseField::Z => write!(f, "z"),
            PoseField::Roll => write!(f, "roll"),
            PoseField::Pitch => write!(f, "pitch"),
            PoseField::Yaw => write!(f, "yaw"),
        }
    }
}

/// Pose outside the operating envelope; rejects the whole tick
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{field} = {value} outside [{min}, {max}]")]
pub struct RangeError {
    pub field: PoseField,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

/// Per-leg conversion faults; sibling legs are unaffected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LegError {
    #[error("leg {leg}: length {length:.3} outside reachable [{min:.3}, {max:.3}]")]
    Unreachable {
        leg: usize,
        length: f64,
        min: f64,
        max: f64,
    },

    #[error("leg {leg}: horn {horn} longer than link {leg_link}, no real solution")]
    Domain { leg: usize, horn: f64, leg_link: f64 },

    #[error("leg {leg}: cos_theta = {cos_theta:.4} outside [-1, 1]")]
    InvalidAngle { leg: usize, cos_theta: f64 },
}

/// Leg lengths for a target pose.
///
/// Validates the pose against the operating envelope before any matrix
/// arithmetic, then transforms each platform anchor and measures its
/// distance to the paired base anchor. Either all six lengths are produced
/// or the call fails as a whole; a partial rigid-body solution has no
/// physical meaning.
pub fn leg_lengths(
    geometry: &PlatformGeometry,
    pose: &Pose,
) -> Result<[f64; LEG_COUNT], RangeError> {
    validate_pose(pose)?;

    let rotation = rotation_matrix(pose.roll, pose.pitch, pose.yaw);
    let translation = [pose.x, pose.y, pose.z];

    let mut lengths = [0.0; LEG_COUNT];
    for (i, length) in lengths.iter_mut().enumerate() {
        let platform_point = transform(&rotation, &geometry.platform_anchors()[i], &translation);
        let base = geometry.base_anchors()[i];
        let leg_vector = [
            platform_point[0] - base[0],
            platform_point[1] - base[1],
            platform_point[2] - base[2],
        ];
        *length = norm(&leg_vector);
    }
    Ok(lengths)
}

/// Horn rotation angles for a set of leg lengths.
///
/// Each leg converts independently; the result array is index-aligned and a
/// faulted leg never blocks its siblings.
pub fn horn_angles(
    horn: f64,
    leg_link: f64,
    lengths: &[f64; LEG_COUNT],
) -> [Result<f64, LegError>; LEG_COUNT] {
    std::array::from_fn(|leg| horn_angle(leg, horn, leg_link, lengths[leg]))
}

/// Solve a single horn angle (degrees) from a leg length.
///
/// TODO: validate this relation against the law-of-cosines solution
/// acos((r^2 + L^2 - l^2) / (2*r*L)) on the physical rig. The linearized
/// form below is what the platform was assembled and tuned with, so it is
/// kept as-is; see the divergence test before changing it.
pub fn horn_angle(leg: usize, horn: f64, leg_link: f64, length: f64) -> Result<f64, LegError> {
    let min = (horn - leg_link).abs();
    let max = horn + leg_link;
    if !(min..=max).contains(&length) {
        return Err(LegError::Unreachable {
            leg,
            length,
            min,
            max,
        });
    }

    let discriminant = leg_link * leg_link - horn * horn;
    if discriminant < 0.0 {
        return Err(LegError::Domain {
            leg,
            horn,
            leg_link,
        });
    }

    let cos_theta = (length - discriminant.sqrt()) / horn;
    if !(-1.0..=1.0).contains(&cos_theta) {
        return Err(LegError::InvalidAngle { leg, cos_theta });
    }

    Ok(cos_theta.asin().to_degrees())
}

fn validate_pose(pose: &Pose) -> Result<(), RangeError> {
    let translation = [
        (PoseField::X, pose.x),
        (PoseField::Y, pose.y),
        (PoseField::Z, pose.z),
    ];
    for (field, value) in translation {
        if !(TRANSLATION_MIN_MM..=TRANSLATION_MAX_MM).contains(&value) {
            return Err(RangeError {
                field,
                value,
                min: TRANSLATION_MIN_MM,
                max: TRANSLATION_MAX_MM,
            });
        }
    }

    let rotation = [
        (PoseField::Roll, pose.roll),
        (PoseField::Pitch, pose.pitch),
        (PoseField::Yaw, pose.yaw),
    ];
    for (field, value) in rotation {
        if !(-ROTATION_LIMIT_DEG..=ROTATION_LIMIT_DEG).contains(&value) {
            return Err(RangeError {
                field,
                value,
                min: -ROTATION_LIMIT_DEG,
                max: ROTATION_LIMIT_DEG,
            });
        }
    }
    Ok(())
}

// R = Rz(yaw) * Ry(pitch) * Rx(roll). The composition order is part of the
// rig's calibration; do not reorder.
fn rotation_matrix(roll_deg: f64, pitch_deg: f64, yaw_deg: f64) -> [[f64; 3]; 3] {
    #[cfg(test)]
    tests::ROTATION_EVALS.with(|count| count.set(count.get() + 1));

    let (sin_roll, cos_roll) = roll_deg.to_radians().sin_cos();
    let (sin_pitch, cos_pitch) = pitch_deg.to_radians().sin_cos();
    let (sin_yaw, cos_yaw) = yaw_deg.to_radians().sin_cos();

    // roll, about X
    let rx = [
        [1.0, 0.0, 0.0],
        [0.0, cos_roll, -sin_roll],
        [0.0, sin_roll, cos_roll],
    ];
    // pitch, about Y
    let ry = [
        [cos_pitch, 0.0, sin_pitch],
        [0.0, 1.0, 0.0],
        [-sin_pitch, 0.0, cos_pitch],
    ];
    // yaw, about Z
    let rz = [
        [cos_yaw, -sin_yaw, 0.0],
        [sin_yaw, cos_yaw, 0.0],
        [0.0, 0.0, 1.0],
    ];

    mat_mul(&rz, &mat_mul(&ry, &rx))
}

fn mat_mul(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
        }
    }
    out
}

fn transform(rotation: &[[f64; 3]; 3], point: &Vec3, translation: &Vec3) -> Vec3 {
    let mut out = [0.0; 3];
    for i in 0..3 {
        out[i] = rotation[i][0] * point[0]
            + rotation[i][1] * point[1]
            + rotation[i][2] * point[2]
            + translation[i];
    }
    out
}

fn norm(v: &Vec3) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        BASE_ANGLES_DEG, BASE_RADIUS_MM, HORN_LENGTH_MM, LEG_LINK_LENGTH_MM, PLATFORM_ANGLES_DEG,
        PLATFORM_RADIUS_MM,
    };
    use std::cell::Cell;

    thread_local! {
        // Incremented by rotation_matrix; lets tests assert that a rejected
        // pose never reaches the matrix step.
        pub(super) static ROTATION_EVALS: Cell<usize> = const { Cell::new(0) };
    }

    fn rotation_evals() -> usize {
        ROTATION_EVALS.with(|count| count.get())
    }

    fn reference_rig() -> PlatformGeometry {
        PlatformGeometry::new(
            BASE_RADIUS_MM,
            &BASE_ANGLES_DEG,
            PLATFORM_RADIUS_MM,
            &PLATFORM_ANGLES_DEG,
        )
        .unwrap()
    }

    // Mirror-symmetric about the XZ plane: angle sets closed under
    // a -> 360 - a, with the same index pairing (0 1)(2 5)(3 4) on both
    // rings.
    fn symmetric_rig() -> PlatformGeometry {
        PlatformGeometry::new(
            100.0,
            &[340.0, 20.0, 100.0, 140.0, 220.0, 260.0],
            100.0,
            &[350.0, 10.0, 110.0, 130.0, 230.0, 250.0],
        )
        .unwrap()
    }

    fn pose(x: f64, y: f64, z: f64, roll: f64, pitch: f64, yaw: f64) -> Pose {
        Pose {
            x,
            y,
            z,
            roll,
            pitch,
            yaw,
        }
    }

    // Reference run of the rig: all six legs come out identical at the
    // level home pose.
    const REFERENCE_LENGTH: f64 = 95.602536262151;

    #[test]
    fn identical_ring_layouts_give_equal_lengths() {
        // Same angular layout on both rings: every leg vector is the pure
        // translation, so any valid height gives six equal lengths.
        let geometry =
            PlatformGeometry::new(100.0, &BASE_ANGLES_DEG, 100.0, &BASE_ANGLES_DEG).unwrap();
        let lengths = leg_lengths(&geometry, &pose(0.0, 0.0, 80.0, 0.0, 0.0, 0.0)).unwrap();
        for length in lengths {
            assert!((length - 80.0).abs() < 1e-9);
        }
    }

    #[test]
    fn reference_pose_lengths_match_oracle() {
        let lengths = leg_lengths(&reference_rig(), &Pose::home()).unwrap();
        let spread = lengths.iter().cloned().fold(f64::MIN, f64::max)
            - lengths.iter().cloned().fold(f64::MAX, f64::min);
        assert!(spread < 1e-9, "lengths not equal, spread = {spread}");
        for length in lengths {
            assert!((length - REFERENCE_LENGTH).abs() < 1e-9, "got {length}");
        }
    }

    #[test]
    fn asymmetric_pose_regression() {
        let lengths =
            leg_lengths(&reference_rig(), &pose(5.0, 10.0, 94.0, 4.0, -3.0, 2.0)).unwrap();
        let expected = [
            103.016396662,
            100.795097149,
            100.026976217,
            99.069847267,
            89.110160916,
            87.891237983,
        ];
        for (got, want) in lengths.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "got {got}, want {want}");
        }
    }

    #[test]
    fn out_of_envelope_rejected_before_any_matrix_work() {
        let geometry = reference_rig();
        let cases = [
            (pose(-0.1, 0.0, 94.0, 0.0, 0.0, 0.0), PoseField::X),
            (pose(0.0, 200.5, 94.0, 0.0, 0.0, 0.0), PoseField::Y),
            (pose(0.0, 0.0, 201.0, 0.0, 0.0, 0.0), PoseField::Z),
            (pose(0.0, 0.0, 94.0, -45.5, 0.0, 0.0), PoseField::Roll),
            (pose(0.0, 0.0, 94.0, 0.0, 46.0, 0.0), PoseField::Pitch),
            (pose(0.0, 0.0, 94.0, 0.0, 0.0, 90.0), PoseField::Yaw),
        ];

        let before = rotation_evals();
        for (bad_pose, field) in cases {
            let err = leg_lengths(&geometry, &bad_pose).unwrap_err();
            assert_eq!(err.field, field);
        }
        assert_eq!(
            rotation_evals(),
            before,
            "rejected poses must not evaluate the rotation matrix"
        );

        // Multiple violations report the first field in x..yaw order
        let err = leg_lengths(&geometry, &pose(300.0, 0.0, 94.0, 60.0, 0.0, 0.0)).unwrap_err();
        assert_eq!(err.field, PoseField::X);
    }

    #[test]
    fn envelope_bounds_are_inclusive() {
        let geometry = reference_rig();
        assert!(leg_lengths(&geometry, &pose(200.0, 0.0, 94.0, 0.0, 0.0, 0.0)).is_ok());
        assert!(leg_lengths(&geometry, &pose(0.0, 0.0, 94.0, -45.0, 45.0, 45.0)).is_ok());
        assert!(leg_lengths(&geometry, &pose(0.0, 0.0, 0.0, 0.0, 0.0, 0.0)).is_ok());
    }

    #[test]
    fn negated_roll_permutes_lengths_on_a_symmetric_rig() {
        // With y = 0 and pitch = yaw = 0, negating roll mirrors the platform
        // through the XZ plane, so the lengths permute by the rings' mirror
        // pairing. The permutation must be stable across calls.
        let geometry = symmetric_rig();
        let permutation = [1, 0, 5, 4, 3, 2];

        for _ in 0..3 {
            let forward = leg_lengths(&geometry, &pose(12.0, 0.0, 94.0, 9.0, 0.0, 0.0)).unwrap();
            let mirrored = leg_lengths(&geometry, &pose(12.0, 0.0, 94.0, -9.0, 0.0, 0.0)).unwrap();
            for i in 0..LEG_COUNT {
                assert!(
                    (mirrored[i] - forward[permutation[i]]).abs() < 1e-9,
                    "leg {i} broke the mirror pairing"
                );
            }
        }
    }

    #[test]
    fn horn_angle_matches_reference_run() {
        let angle = horn_angle(0, HORN_LENGTH_MM, LEG_LINK_LENGTH_MM, REFERENCE_LENGTH).unwrap();
        assert!((angle - 5.668666092584).abs() < 1e-9, "got {angle}");
    }

    #[test]
    fn horn_angle_diverges_from_law_of_cosines() {
        // The rig's linearized relation is intentionally not the textbook
        // triangle solution; pin both values so a silent "correction" of
        // either side trips this test.
        let (r, l) = (HORN_LENGTH_MM, LEG_LINK_LENGTH_MM);
        let length = REFERENCE_LENGTH;

        let implemented = horn_angle(0, r, l, length).unwrap();
        let law_of_cosines = ((r * r + length * length - l * l) / (2.0 * r * length))
            .acos()
            .to_degrees();

        assert!((implemented - 5.668666092584).abs() < 1e-9);
        assert!((law_of_cosines - 84.448841879760).abs() < 1e-9);
        assert!((implemented - law_of_cosines).abs() > 1.0);
    }

    #[test]
    fn unreachable_lengths_name_the_leg() {
        // r = 40, l = 100: reachable band is [60, 140]
        let below = horn_angle(3, HORN_LENGTH_MM, LEG_LINK_LENGTH_MM, 59.9).unwrap_err();
        assert_eq!(
            below,
            LegError::Unreachable {
                leg: 3,
                length: 59.9,
                min: 60.0,
                max: 140.0
            }
        );

        let above = horn_angle(5, HORN_LENGTH_MM, LEG_LINK_LENGTH_MM, 140.1).unwrap_err();
        assert!(matches!(above, LegError::Unreachable { leg: 5, .. }));

        // On the lower bound the conversion still succeeds
        let on_bound = horn_angle(0, HORN_LENGTH_MM, LEG_LINK_LENGTH_MM, 60.0).unwrap();
        assert!((on_bound - -52.306026227005).abs() < 1e-9);
    }

    #[test]
    fn cos_theta_out_of_unit_range_is_reported() {
        // 139 is reachable but pushes cos_theta past 1 for this rig
        let err = horn_angle(2, HORN_LENGTH_MM, LEG_LINK_LENGTH_MM, 139.0).unwrap_err();
        match err {
            LegError::InvalidAngle { leg, cos_theta } => {
                assert_eq!(leg, 2);
                assert!(cos_theta > 1.0);
            }
            other => panic!("expected InvalidAngle, got {other:?}"),
        }
    }

    #[test]
    fn horn_longer_than_link_is_a_domain_error() {
        let err = horn_angle(1, 100.0, 40.0, 90.0).unwrap_err();
        assert_eq!(
            err,
            LegError::Domain {
                leg: 1,
                horn: 100.0,
                leg_link: 40.0
            }
        );
    }

    #[test]
    fn one_bad_leg_does_not_block_the_others() {
        let mut lengths = [REFERENCE_LENGTH; LEG_COUNT];
        lengths[2] = 30.0; // unreachable

        let results = horn_angles(HORN_LENGTH_MM, LEG_LINK_LENGTH_MM, &lengths);
        for (leg, result) in results.iter().enumerate() {
            if leg == 2 {
                assert!(matches!(
                    result,
                    Err(LegError::Unreachable { leg: 2, .. })
                ));
            } else {
                assert!((result.as_ref().unwrap() - 5.668666092584).abs() < 1e-9);
            }
        }
    }
}
