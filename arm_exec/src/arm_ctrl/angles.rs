//! Joint angle state of the arm

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{trace, warn};
use serde::{Deserialize, Serialize};

// Internal
use super::Params;
use arm_if::eqpt::scene::{JointId, PoseApplier, NUM_JOINTS};
use util::maths::{clamp, lerp_angle_deg, wrap_deg};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The angles of all six joints of the arm.
///
/// Units: degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AngleState {
    pub base_deg: f64,
    pub shoulder_deg: f64,
    pub elbow_deg: f64,
    pub wrist_deg: f64,
    pub mini_elbow_deg: f64,
    pub gripper_deg: f64,
}

/// Which joints were limited by [`AngleState::limit_manual`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LimitFlags {
    pub shoulder_limited: bool,
    pub elbow_limited: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AngleState {
    /// Build a state from angles ordered as [`JointId::ALL`].
    pub fn from_array(angles_deg: [f64; NUM_JOINTS]) -> Self {
        Self {
            base_deg: angles_deg[0],
            shoulder_deg: angles_deg[1],
            elbow_deg: angles_deg[2],
            wrist_deg: angles_deg[3],
            mini_elbow_deg: angles_deg[4],
            gripper_deg: angles_deg[5],
        }
    }

    /// Get the angles ordered as [`JointId::ALL`].
    pub fn to_array(&self) -> [f64; NUM_JOINTS] {
        [
            self.base_deg,
            self.shoulder_deg,
            self.elbow_deg,
            self.wrist_deg,
            self.mini_elbow_deg,
            self.gripper_deg,
        ]
    }

    pub fn get(&self, joint: JointId) -> f64 {
        match joint {
            JointId::Base => self.base_deg,
            JointId::Shoulder => self.shoulder_deg,
            JointId::Elbow => self.elbow_deg,
            JointId::Wrist => self.wrist_deg,
            JointId::MiniElbow => self.mini_elbow_deg,
            JointId::Gripper => self.gripper_deg,
        }
    }

    pub fn set(&mut self, joint: JointId, angle_deg: f64) {
        match joint {
            JointId::Base => self.base_deg = angle_deg,
            JointId::Shoulder => self.shoulder_deg = angle_deg,
            JointId::Elbow => self.elbow_deg = angle_deg,
            JointId::Wrist => self.wrist_deg = angle_deg,
            JointId::MiniElbow => self.mini_elbow_deg = angle_deg,
            JointId::Gripper => self.gripper_deg = angle_deg,
        }
    }

    /// Interpolate every joint along its shortest arc from `start` to
    /// `target` by the blend factor `k`.
    pub fn lerp_angles(start: &AngleState, target: &AngleState, k: f64) -> Self {
        let mut out = AngleState::default();

        for joint in JointId::ALL.iter() {
            out.set(
                *joint,
                lerp_angle_deg(start.get(*joint), target.get(*joint), k),
            );
        }

        out
    }

    /// Limit the shoulder and elbow to the ranges allowed on the manual
    /// control path.
    pub fn limit_manual(&mut self, params: &Params) -> LimitFlags {
        let mut flags = LimitFlags::default();

        let shoulder = clamp(
            self.shoulder_deg,
            params.shoulder_limits_deg[0],
            params.shoulder_limits_deg[1],
        );
        flags.shoulder_limited = shoulder != self.shoulder_deg;
        self.shoulder_deg = shoulder;

        let elbow = clamp(
            self.elbow_deg,
            params.elbow_limits_deg[0],
            params.elbow_limits_deg[1],
        );
        flags.elbow_limited = elbow != self.elbow_deg;
        self.elbow_deg = elbow;

        flags
    }

    /// Send every joint angle to the scene.
    ///
    /// Joints which aren't bound in the scene are skipped. Returns the number
    /// of joints that were set.
    pub fn apply<S>(&self, scene: &mut S) -> usize
    where
        S: PoseApplier + ?Sized,
    {
        let mut num_set = 0;

        for joint in JointId::ALL.iter() {
            match scene.set_joint_orientation(*joint, joint.local_euler_deg(self.get(*joint))) {
                Ok(()) => num_set += 1,
                Err(e) => trace!("Skipping joint: {}", e),
            }
        }

        num_set
    }

    /// Read the angles of the given joints back from the scene.
    ///
    /// Angles are normalised into (-180, 180]. Unbound joints keep their
    /// current value.
    pub fn sync_from<S>(&mut self, scene: &S, joints: &[JointId])
    where
        S: PoseApplier + ?Sized,
    {
        for joint in joints {
            match scene.joint_orientation(*joint) {
                Some(euler) => self.set(*joint, wrap_deg(joint.angle_from_euler_deg(&euler))),
                None => warn!(
                    "Cannot sync {:?} from the scene as it is not bound, keeping {:.2} deg",
                    joint,
                    self.get(*joint)
                ),
            }
        }
    }
}
