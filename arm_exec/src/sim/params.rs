//! Parameters structure for the simulated scene

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::Shape;
use arm_if::eqpt::scene::{JointId, LayerMask, NUM_JOINTS};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the simulated scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Initial position of the arm's root in the world.
    ///
    /// Units: meters
    pub root_m: [f64; 3],

    /// Length of each link, measured from a joint to the next joint along the
    /// chain. The gripper length is measured from the gripper joint to the
    /// grip point.
    ///
    /// Units: meters
    pub base_height_m: f64,
    pub upper_arm_m: f64,
    pub forearm_m: f64,
    pub wrist_m: f64,
    pub mini_elbow_m: f64,
    pub gripper_m: f64,

    /// Initial pose of the arm, ordered base to gripper.
    ///
    /// Units: degrees
    pub initial_pose_deg: [f64; NUM_JOINTS],

    /// Joints which are missing from the scene.
    #[serde(default)]
    pub unbound_joints: Vec<JointId>,

    /// Bodies in the scene.
    #[serde(default)]
    pub bodies: Vec<BodyParams>,
}

/// Parameters of a single body in the scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyParams {
    /// Unique name of the body.
    pub name: String,

    /// Units: meters
    pub position_m: [f64; 3],

    pub shape: Shape,

    /// Layers the body is on.
    pub layer: LayerMask,

    /// Kinematic flag of the body's physics, or `None` for bodies without
    /// physics.
    #[serde(default)]
    pub kinematic: Option<bool>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            root_m: [0.0; 3],
            base_height_m: 0.5,
            upper_arm_m: 1.0,
            forearm_m: 1.0,
            wrist_m: 0.3,
            mini_elbow_m: 0.3,
            gripper_m: 0.2,
            initial_pose_deg: [0.0; NUM_JOINTS],
            unbound_joints: Vec::new(),
            bodies: Vec::new(),
        }
    }
}

impl Params {
    /// Link lengths in chain order, from the base to the grip point.
    pub fn link_lengths_m(&self) -> [f64; NUM_JOINTS] {
        [
            self.base_height_m,
            self.upper_arm_m,
            self.forearm_m,
            self.wrist_m,
            self.mini_elbow_m,
            self.gripper_m,
        ]
    }
}
