//! # Arm control telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::eqpt::scene::{JointId, NUM_JOINTS};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A pair of directional inputs for one joint.
///
/// Both pressed at once cancel each other out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisInput {
    /// Rotate the joint towards more negative angles
    #[serde(default)]
    pub decrease: bool,

    /// Rotate the joint towards more positive angles
    #[serde(default)]
    pub increase: bool,
}

/// The operator inputs sampled on one control cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualInputs {
    /// Directional inputs for each joint, ordered as [`JointId::ALL`].
    #[serde(default)]
    pub axes: [AxisInput; NUM_JOINTS],

    /// Planar movement request for the arm's root, as (x, z) with each
    /// component in [-1, 1].
    #[serde(default)]
    pub root_move: [f64; 2],

    /// Grab the nearest object, or release the held one. Edge triggered.
    #[serde(default)]
    pub grab_toggle: bool,

    /// Request a reset of the arm to its home pose. Edge triggered.
    #[serde(default)]
    pub reset: bool,

    /// Request a change of control mode. Edge triggered.
    #[serde(default)]
    pub mode: Option<ControlMode>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The control mode of the arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMode {
    /// The operator drives the joints directly.
    Manual,

    /// The arm is driven by autonomous operations (seek, pose transitions).
    Autonomous,
}

/// A command that can be completed by arm control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArmCmd {
    /// Reactively seek the end effector towards a fixed world point.
    MoveToTarget {
        /// Target position in the world frame.
        target_m: [f64; 3],
    },

    /// Reactively seek towards a named scene object, following it if it
    /// moves.
    MoveToObject { object: String },

    /// Smoothly move every joint to the given angles.
    MoveToPose {
        /// Target angles in degrees, ordered as [`JointId::ALL`].
        angles_deg: [f64; NUM_JOINTS],

        /// Duration parameter of the transition.
        duration_s: f64,
    },

    /// Move all joints back to zero.
    Reset,

    /// Attach the named object to the gripper regardless of proximity.
    Grab { object: String },

    /// Release the held object, if any.
    Release,

    /// Switch between manual and autonomous control.
    SetManualMode { manual: bool },

    /// Hold the given operator inputs until replaced.
    Manual { inputs: ManualInputs },

    /// Run the pick and place sequence between two named scene objects.
    PickAndPlace { object: String, drop_zone: String },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl AxisInput {
    /// Signed direction of the input: -1, 0 or +1.
    pub fn direction(&self) -> f64 {
        let mut dir = 0.0;

        if self.decrease {
            dir -= 1.0;
        }
        if self.increase {
            dir += 1.0;
        }

        dir
    }
}

impl ManualInputs {
    /// Set the input for a single joint, returning the modified inputs.
    pub fn with_axis(mut self, joint: JointId, input: AxisInput) -> Self {
        self.axes[joint.index()] = input;
        self
    }

    /// Returns a copy of these inputs with all edge triggered inputs cleared,
    /// leaving only those that are held down.
    pub fn held(&self) -> Self {
        Self {
            grab_toggle: false,
            reset: false,
            mode: None,
            ..*self
        }
    }
}
