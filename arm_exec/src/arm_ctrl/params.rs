//! Parameters structure for ArmCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use arm_if::eqpt::scene::{LayerMask, NUM_JOINTS};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Arm control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    // ---- SPEEDS ----
    /// Rate at which a joint rotates while its manual input is held.
    ///
    /// Units: degrees/second
    pub manual_rotation_speed_degs: f64,

    /// Blend rate of the reactive seek. The base and elbow move this fraction
    /// of their remaining error per second, the shoulder twice as fast.
    ///
    /// Units: 1/second
    pub auto_speed: f64,

    /// Rate at which the evasion offset grows while the target is obstructed.
    ///
    /// Units: degrees/second
    pub evasion_speed_degs: f64,

    /// Rate at which the evasion offset decays once the target is clear.
    ///
    /// Units: degrees/second
    pub recovery_speed_degs: f64,

    /// Speed of the arm's root when moved by the operator.
    ///
    /// Units: meters/second
    pub root_move_speed_ms: f64,

    // ---- LIMITS ----
    /// Limits of the shoulder on the manual control path, as [min, max].
    ///
    /// Units: degrees
    pub shoulder_limits_deg: [f64; 2],

    /// Limits of the elbow on the manual control path, as [min, max].
    ///
    /// Units: degrees
    pub elbow_limits_deg: [f64; 2],

    /// Limits of the seek evasion offset, as [min, max].
    ///
    /// Units: degrees
    pub evasion_limits_deg: [f64; 2],

    // ---- SEEK HEURISTIC ----
    /// Shoulder angle demanded per meter of distance to the target.
    ///
    /// Units: degrees/meter
    pub seek_shoulder_gain_degm: f64,

    /// Limits of the ideal seek shoulder angle, as [min, max].
    ///
    /// Units: degrees
    pub seek_shoulder_limits_deg: [f64; 2],

    /// Elbow angle demanded per meter of distance to the target.
    ///
    /// Units: degrees/meter
    pub seek_elbow_gain_degm: f64,

    /// Limits of the ideal seek elbow angle, as [min, max].
    ///
    /// Units: degrees
    pub seek_elbow_limits_deg: [f64; 2],

    /// Base error below which a seek may complete.
    ///
    /// Units: degrees
    pub seek_base_tolerance_deg: f64,

    /// Shoulder error below which a seek may complete.
    ///
    /// Units: degrees
    pub seek_shoulder_tolerance_deg: f64,

    /// Time after which a seek which hasn't completed is cancelled. A seek
    /// with no timeout runs until it completes or manual mode is selected.
    ///
    /// Units: seconds
    #[serde(default)]
    pub seek_timeout_s: Option<f64>,

    // ---- COLLISION ----
    /// If true manual moves which collide with an obstacle are reverted.
    pub block_manual_on_collision: bool,

    /// Radius of the capsules around the base, upper arm and forearm used
    /// for manual collision checks.
    ///
    /// Units: meters
    pub link_radius_m: f64,

    /// Radius of the sphere around the end effector used for manual
    /// collision checks.
    ///
    /// Units: meters
    pub end_effector_radius_m: f64,

    /// Radius around the end effector within which objects are considered to
    /// be touched.
    ///
    /// Units: meters
    pub touch_radius_m: f64,

    /// Layers containing obstacles.
    pub obstacle_layer: LayerMask,

    /// Layers containing objects that can be grabbed.
    pub grabbable_layer: LayerMask,

    /// Layers containing drop zones.
    pub drop_zone_layer: LayerMask,

    // ---- POSES ----
    /// Home pose, ordered base to gripper.
    ///
    /// Units: degrees
    pub home_pose_deg: [f64; NUM_JOINTS],

    /// Duration parameter of the transition to the home pose.
    ///
    /// Units: seconds
    pub reset_duration_s: f64,

    /// Position of a grabbed object relative to the grip point.
    ///
    /// Units: meters
    pub grasp_offset_m: [f64; 3],

    /// Orientation of a grabbed object relative to the grip point, as Euler
    /// angles.
    ///
    /// Units: degrees
    pub grasp_orientation_deg: [f64; 3],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            manual_rotation_speed_degs: 50.0,
            auto_speed: 1.0,
            evasion_speed_degs: 60.0,
            recovery_speed_degs: 30.0,
            root_move_speed_ms: 4.0,
            shoulder_limits_deg: [-100.0, 100.0],
            elbow_limits_deg: [-10.0, 160.0],
            evasion_limits_deg: [-100.0, 0.0],
            seek_shoulder_gain_degm: 10.0,
            seek_shoulder_limits_deg: [0.0, 50.0],
            seek_elbow_gain_degm: 5.0,
            seek_elbow_limits_deg: [20.0, 90.0],
            seek_base_tolerance_deg: 1.0,
            seek_shoulder_tolerance_deg: 2.0,
            seek_timeout_s: None,
            block_manual_on_collision: true,
            link_radius_m: 0.1,
            end_effector_radius_m: 0.15,
            touch_radius_m: 0.3,
            obstacle_layer: LayerMask::layer(3),
            grabbable_layer: LayerMask::layer(4),
            drop_zone_layer: LayerMask::layer(5),
            home_pose_deg: [0.0; NUM_JOINTS],
            reset_duration_s: 1.0,
            grasp_offset_m: [0.0; 3],
            grasp_orientation_deg: [90.0, 0.0, 0.0],
        }
    }
}
