//! # Pick and place sequencer
//!
//! Drives [`ArmCtrl`] through a fixed pick and place routine using only the
//! controller's public operations. The routine is a queue of actions. An
//! action that starts an arm operation stays at the front of the queue until
//! the arm is no longer busy, the sequencer polling it once per cycle.
//!
//! The routine is:
//!
//! 1. Hover above the object, descend onto it, and settle.
//! 2. Check contact (advisory only) and grab the object, then settle.
//! 3. Lift back to the hover point and show the object in the presentation
//!    poses, keeping the current base angle.
//! 4. Hover above the drop zone, descend, and settle.
//! 5. Check the drop zone (advisory only) and release, then settle.
//! 6. Lift, reset the arm, and hand control back to the operator.
//!
//! Selecting manual mode while the sequence runs cancels it.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use nalgebra::Vector3;
use std::collections::VecDeque;

// Internal
pub use params::*;

use crate::arm_ctrl::{ArmCtrl, ArmCtrlError, ControlMode, SeekTarget, StepStatus};
use arm_if::eqpt::scene::{ObjectId, Scene, SceneError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A running pick and place sequence.
#[derive(Debug)]
pub struct PickAndPlace {
    object: ObjectId,

    actions: VecDeque<SeqAction>,

    /// True once the arm has been switched to autonomous mode.
    started: bool,

    /// True while the front action's arm operation is running.
    waiting: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur while running a sequence.
#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    #[error("Object {0:?} is not in the scene")]
    UnknownObject(ObjectId),

    #[error("Arm control error: {0}")]
    ArmCtrlError(ArmCtrlError),
}

/// A single step of the sequence.
#[derive(Debug, Clone, PartialEq)]
enum SeqAction {
    SetAutonomous,
    Seek(Vector3<f64>),
    Wait { remaining_s: f64 },
    CheckTouching,
    Grab,
    Present { angles_deg: [f64; 5], duration_s: f64 },
    CheckDropZone,
    Release,
    Reset,
    SetManual,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PickAndPlace {
    /// Build the sequence for moving `object` to `drop_zone`.
    ///
    /// The positions of both are captured now, so moving either afterwards
    /// doesn't change where the arm goes.
    pub fn new<S>(
        object: ObjectId,
        drop_zone: ObjectId,
        params: &Params,
        scene: &S,
    ) -> Result<Self, SequenceError>
    where
        S: Scene + ?Sized,
    {
        let object_m = scene
            .object_position(object)
            .ok_or(SequenceError::UnknownObject(object))?;
        let drop_m = scene
            .object_position(drop_zone)
            .ok_or(SequenceError::UnknownObject(drop_zone))?;

        let up = Vector3::new(0.0, params.hover_height_m, 0.0);
        let object_hover_m = object_m + up;
        let drop_hover_m = drop_m + up;

        let mut actions = VecDeque::new();

        // Pick
        actions.push_back(SeqAction::SetAutonomous);
        actions.push_back(SeqAction::Seek(object_hover_m));
        actions.push_back(SeqAction::Seek(object_m));
        actions.push_back(SeqAction::Wait {
            remaining_s: params.settle_time_s,
        });
        actions.push_back(SeqAction::CheckTouching);
        actions.push_back(SeqAction::Grab);
        actions.push_back(SeqAction::Wait {
            remaining_s: params.settle_time_s,
        });
        actions.push_back(SeqAction::Seek(object_hover_m));

        // Present
        for pose in params.present_poses.iter() {
            actions.push_back(SeqAction::Present {
                angles_deg: pose.angles_deg,
                duration_s: pose.duration_s,
            });
        }
        actions.push_back(SeqAction::Wait {
            remaining_s: params.present_settle_time_s,
        });

        // Place
        actions.push_back(SeqAction::Seek(drop_hover_m));
        actions.push_back(SeqAction::Seek(drop_m));
        actions.push_back(SeqAction::Wait {
            remaining_s: params.settle_time_s,
        });
        actions.push_back(SeqAction::CheckDropZone);
        actions.push_back(SeqAction::Release);
        actions.push_back(SeqAction::Wait {
            remaining_s: params.settle_time_s,
        });
        actions.push_back(SeqAction::Seek(drop_hover_m));
        actions.push_back(SeqAction::Reset);
        actions.push_back(SeqAction::SetManual);

        info!(
            "Pick and place of {:?} from {:?} to {:?} ({} actions)",
            object,
            object_m,
            drop_m,
            actions.len()
        );

        Ok(Self {
            object,
            actions,
            started: false,
            waiting: false,
        })
    }

    /// Number of actions left, including the one in progress.
    pub fn num_remaining(&self) -> usize {
        self.actions.len()
    }

    /// Advance the sequence by one cycle.
    pub fn step<S>(
        &mut self,
        dt_s: f64,
        arm: &mut ArmCtrl,
        scene: &mut S,
    ) -> Result<StepStatus, SequenceError>
    where
        S: Scene + ?Sized,
    {
        if self.started && arm.mode() == ControlMode::Manual {
            warn!("Manual mode selected, pick and place cancelled");
            return Ok(StepStatus::Cancelled);
        }

        if arm.is_busy() {
            return Ok(StepStatus::Running);
        }

        if self.waiting {
            self.waiting = false;
            self.actions.pop_front();
        }

        while let Some(action) = self.actions.front_mut() {
            match action {
                SeqAction::SetAutonomous => {
                    arm.set_manual_mode(false);
                    self.started = true;
                }
                SeqAction::Seek(target_m) => {
                    arm.move_to_target(SeekTarget::Point(*target_m))?;
                    self.waiting = true;
                    return Ok(StepStatus::Running);
                }
                SeqAction::Wait { remaining_s } => {
                    *remaining_s -= dt_s;
                    if *remaining_s > 0.0 {
                        return Ok(StepStatus::Running);
                    }
                }
                SeqAction::CheckTouching => {
                    if arm.is_touching_object(self.object, scene) {
                        debug!("Touching {:?}", self.object);
                    } else {
                        warn!("Not touching {:?}, grabbing it anyway", self.object);
                    }
                }
                SeqAction::Grab => {
                    arm.force_grab(self.object, scene)?;
                }
                SeqAction::Present {
                    angles_deg,
                    duration_s,
                } => {
                    let a = angles_deg;
                    let base_deg = arm.get_base_angle();
                    arm.move_to_pose([base_deg, a[0], a[1], a[2], a[3], a[4]], *duration_s)?;
                    self.waiting = true;
                    return Ok(StepStatus::Running);
                }
                SeqAction::CheckDropZone => {
                    if arm.is_in_drop_zone(scene) {
                        debug!("In the drop zone");
                    } else {
                        warn!("Not in the drop zone, releasing anyway");
                    }
                }
                SeqAction::Release => {
                    arm.release_object(scene)?;
                }
                SeqAction::Reset => {
                    arm.reset_arm()?;
                    self.waiting = true;
                    return Ok(StepStatus::Running);
                }
                SeqAction::SetManual => {
                    arm.set_manual_mode(true);
                }
            }

            self.actions.pop_front();
        }

        info!("Pick and place of {:?} complete", self.object);
        Ok(StepStatus::Completed)
    }
}

impl From<ArmCtrlError> for SequenceError {
    fn from(e: ArmCtrlError) -> Self {
        SequenceError::ArmCtrlError(e)
    }
}

impl From<SceneError> for SequenceError {
    fn from(e: SceneError) -> Self {
        SequenceError::ArmCtrlError(ArmCtrlError::SceneError(e))
    }
}
