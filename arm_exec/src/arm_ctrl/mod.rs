//! # Arm control module
//!
//! Arm control decides the angles of the arm's six joints on every cycle.
//! The angles come from one of three places:
//!
//! - Manual control, where the operator's directional inputs rotate each
//!   joint. Each manual move is applied speculatively, the scene is probed for
//!   collisions, and the move is reverted if the arm would hit an obstacle.
//! - A reactive seek towards a point, which uses a distance heuristic rather
//!   than a full inverse kinematics solution, and pulls the shoulder back
//!   while the line from the end effector to the target is obstructed.
//! - A pose transition, which eases every joint to a known safe pose.
//!
//! Seeks and pose transitions are step objects driven once per cycle by
//! [`ArmCtrl`]. Switching to manual mode cancels them immediately.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod angles;
mod grasp;
mod manual;
mod params;
mod pose_transition;
mod seek;
mod state;

#[cfg(test)]
pub(crate) mod mock;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use angles::*;
pub use grasp::*;
pub use manual::*;
pub use params::*;
pub use pose_transition::*;
pub use seek::*;
pub use state::*;

pub use arm_if::tc::arm_ctrl::ControlMode;

use arm_if::eqpt::scene::SceneError;
use serde::Serialize;
use util::{archive::ArchiveError, params::LoadError};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during ArmCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum ArmCtrlError {
    #[error("Cannot start a {0} while the arm is busy with a {1}")]
    Busy(&'static str, &'static str),

    #[error("Pose transition duration must be positive and finite, found {0}")]
    InvalidDuration(f64),

    #[error("Scene error: {0}")]
    SceneError(SceneError),
}

/// Possible errors that can occur while initialising ArmCtrl.
#[derive(Debug, thiserror::Error)]
pub enum ArmCtrlInitError {
    #[error("Could not load the ArmCtrl parameters: {0}")]
    ParamLoadError(LoadError),

    #[error("Could not create the ArmCtrl archive: {0}")]
    ArchiveError(ArchiveError),
}

/// Result of stepping an autonomous operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepStatus {
    /// The operation needs more cycles to complete.
    Running,

    /// The operation reached its goal.
    Completed,

    /// The operation stopped without reaching its goal.
    Cancelled,
}

impl From<SceneError> for ArmCtrlError {
    fn from(e: SceneError) -> Self {
        ArmCtrlError::SceneError(e)
    }
}
