//! Implementations for the ArmCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use nalgebra::Vector3;
use serde::Serialize;

// Internal
use super::{
    manual_step, AngleState, ArmCtrlError, ArmCtrlInitError, ControlMode, GraspState, Params,
    PoseTransition, Seek, SeekTarget, StepStatus,
};
use arm_if::eqpt::scene::{JointId, ObjectId, Scene};
use arm_if::tc::arm_ctrl::ManualInputs;
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State,
    params,
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Joints read back from the scene when the controller syncs.
const SYNCED_JOINTS: [JointId; 3] = [JointId::Base, JointId::Shoulder, JointId::Elbow];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Arm control module state
pub struct ArmCtrl {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,
    arch_report: Archiver,

    angles: AngleState,

    mode: ControlMode,

    operation: Operation,

    grasp: GraspState,
}

/// Input data to Arm Control.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// Time since the last cycle.
    ///
    /// Units: seconds
    pub dt_s: f64,

    /// Operator inputs for this cycle.
    pub inputs: ManualInputs,
}

/// Status report for ArmCtrl processing.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusReport {
    pub mode: ControlMode,
    pub busy: bool,

    /// Status of the autonomous operation stepped on this cycle, if any.
    pub op_status: Option<StepStatus>,

    /// The manual move on this cycle collided and was reverted.
    pub manual_rolled_back: bool,
    pub shoulder_limited: bool,
    pub elbow_limited: bool,

    /// Units: degrees
    pub evasion_offset_deg: f64,
    pub obstructed: bool,
}

/// A single archived row, flattened for CSV.
#[derive(Serialize)]
struct ArchRecord {
    time_s: f64,
    mode: ControlMode,
    busy: bool,
    op_status: Option<StepStatus>,
    manual_rolled_back: bool,
    shoulder_limited: bool,
    elbow_limited: bool,
    evasion_offset_deg: f64,
    obstructed: bool,
    base_deg: f64,
    shoulder_deg: f64,
    elbow_deg: f64,
    wrist_deg: f64,
    mini_elbow_deg: f64,
    gripper_deg: f64,
    held_object: Option<u32>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The autonomous operation currently driving the arm.
#[derive(Debug, Clone)]
pub enum Operation {
    Idle,
    Seek(Seek),
    PoseTransition(PoseTransition),
    Reset(PoseTransition),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ArmCtrl {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl Default for StatusReport {
    fn default() -> Self {
        Self {
            mode: ControlMode::Manual,
            busy: false,
            op_status: None,
            manual_rolled_back: false,
            shoulder_limited: false,
            elbow_limited: false,
            evasion_offset_deg: 0.0,
            obstructed: false,
        }
    }
}

impl Operation {
    /// Short name of the operation for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Idle => "idle",
            Operation::Seek(_) => "seek",
            Operation::PoseTransition(_) => "pose transition",
            Operation::Reset(_) => "reset",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Operation::Idle)
    }
}

impl ArmCtrl {
    /// Create a new controller from the given parameters.
    ///
    /// The controller starts in manual mode with all angles at zero, use
    /// `sync_joints` to pick up the scene's current pose.
    pub fn new(params: Params) -> Self {
        Self {
            params,
            report: StatusReport::default(),
            arch_report: Archiver::default(),
            angles: AngleState::default(),
            mode: ControlMode::Manual,
            operation: Operation::Idle,
            grasp: GraspState::default(),
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn angles(&self) -> &AngleState {
        &self.angles
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// True while an autonomous operation is running.
    pub fn is_busy(&self) -> bool {
        !self.operation.is_idle()
    }

    /// Current angle of the base joint.
    ///
    /// Units: degrees
    pub fn get_base_angle(&self) -> f64 {
        self.angles.base_deg
    }

    pub fn held_object(&self) -> Option<ObjectId> {
        self.grasp.held()
    }

    /// Read the base, shoulder and elbow angles back from the scene.
    pub fn sync_joints<S>(&mut self, scene: &S)
    where
        S: Scene + ?Sized,
    {
        self.angles.sync_from(scene, &SYNCED_JOINTS);
        debug!("Synced joints from the scene: {:?}", self.angles);
    }

    /// Switch between manual and autonomous control.
    ///
    /// Selecting manual control cancels any running operation, leaving the
    /// arm where it is.
    pub fn set_manual_mode(&mut self, manual: bool) {
        if manual {
            if !self.operation.is_idle() {
                info!("Manual mode selected, cancelling the {}", self.operation.name());
            }
            self.operation = Operation::Idle;
            self.mode = ControlMode::Manual;
        } else {
            self.mode = ControlMode::Autonomous;
        }

        debug!("Control mode is now {:?}", self.mode);
    }

    /// Start a seek towards the target.
    pub fn move_to_target(&mut self, target: SeekTarget) -> Result<(), ArmCtrlError> {
        self.check_not_busy("seek")?;

        info!("Moving to {:?}", target);
        self.operation = Operation::Seek(Seek::new(target));

        Ok(())
    }

    /// Start a transition to the given angles, ordered base to gripper.
    pub fn move_to_pose(
        &mut self,
        angles_deg: [f64; 6],
        duration_s: f64,
    ) -> Result<(), ArmCtrlError> {
        self.check_not_busy("pose transition")?;

        let trans =
            PoseTransition::new(self.angles, AngleState::from_array(angles_deg), duration_s)?;

        info!("Moving to pose {:?} over {:.2} s", angles_deg, duration_s);
        self.operation = Operation::PoseTransition(trans);

        Ok(())
    }

    /// Start a transition back to the home pose.
    pub fn reset_arm(&mut self) -> Result<(), ArmCtrlError> {
        self.check_not_busy("reset")?;

        let trans = PoseTransition::new(
            self.angles,
            AngleState::from_array(self.params.home_pose_deg),
            self.params.reset_duration_s,
        )?;

        info!("Resetting the arm");
        self.operation = Operation::Reset(trans);

        Ok(())
    }

    /// Attach the object to the gripper regardless of proximity.
    pub fn force_grab<S>(&mut self, object: ObjectId, scene: &mut S) -> Result<(), ArmCtrlError>
    where
        S: Scene + ?Sized,
    {
        Ok(self.grasp.force_grab(object, &self.params, scene)?)
    }

    /// Release the held object, returning it, or `None` if nothing was held.
    pub fn release_object<S>(&mut self, scene: &mut S) -> Result<Option<ObjectId>, ArmCtrlError>
    where
        S: Scene + ?Sized,
    {
        Ok(self.grasp.release(scene)?)
    }

    /// Returns true if the object is grabbable and within the touch radius of
    /// the end effector.
    pub fn is_touching_object<S>(&self, object: ObjectId, scene: &S) -> bool
    where
        S: Scene + ?Sized,
    {
        match scene.end_effector_position() {
            Some(ee) => scene
                .sphere_overlaps(&ee, self.params.touch_radius_m, self.params.grabbable_layer)
                .contains(&object),
            None => false,
        }
    }

    /// Returns true if any drop zone is within the touch radius of the end
    /// effector.
    pub fn is_in_drop_zone<S>(&self, scene: &S) -> bool
    where
        S: Scene + ?Sized,
    {
        match scene.end_effector_position() {
            Some(ee) => !scene
                .sphere_overlaps(&ee, self.params.touch_radius_m, self.params.drop_zone_layer)
                .is_empty(),
            None => false,
        }
    }

    fn check_not_busy(&self, requested: &'static str) -> Result<(), ArmCtrlError> {
        if self.is_busy() {
            warn!(
                "Rejecting {} as the arm is busy with a {}",
                requested,
                self.operation.name()
            );
            return Err(ArmCtrlError::Busy(requested, self.operation.name()));
        }

        Ok(())
    }

    /// Grab the nearest grabbable object in reach, or release the held one.
    fn toggle_grab<S>(&mut self, scene: &mut S) -> Result<(), ArmCtrlError>
    where
        S: Scene + ?Sized,
    {
        if self.grasp.held().is_some() {
            self.grasp.release(scene)?;
            return Ok(());
        }

        let ee = match scene.end_effector_position() {
            Some(p) => p,
            None => {
                warn!("Cannot grab without an end effector");
                return Ok(());
            }
        };

        match scene
            .sphere_overlaps(&ee, self.params.touch_radius_m, self.params.grabbable_layer)
            .first()
        {
            Some(obj) => self.grasp.force_grab(*obj, &self.params, scene)?,
            None => debug!("Nothing in reach to grab"),
        }

        Ok(())
    }

    /// Step the running operation, returning to idle once it finishes.
    fn step_operation<S>(&mut self, dt_s: f64, scene: &mut S)
    where
        S: Scene + ?Sized,
    {
        let status = match self.operation {
            Operation::Idle => return,
            Operation::Seek(ref mut seek) => {
                let status = seek.step(&mut self.angles, dt_s, &self.params, scene);
                self.report.evasion_offset_deg = seek.evasion_offset_deg();
                self.report.obstructed = seek.obstructed();
                status
            }
            Operation::PoseTransition(ref mut trans) | Operation::Reset(ref mut trans) => {
                trans.step(&mut self.angles, dt_s, scene)
            }
        };

        self.report.op_status = Some(status);

        match status {
            StepStatus::Running => (),
            StepStatus::Completed => {
                info!("{} complete", self.operation.name());
                self.operation = Operation::Idle;
            }
            StepStatus::Cancelled => {
                warn!("{} cancelled", self.operation.name());
                self.operation = Operation::Idle;
            }
        }
    }
}

impl State for ArmCtrl {
    type InitData = &'static str;
    type InitError = ArmCtrlInitError;

    type InputData = InputData;
    type Env = dyn Scene;
    type OutputData = AngleState;
    type StatusReport = StatusReport;
    type ProcError = ArmCtrlError;

    /// Initialise the ArmCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        self.params = params::load(init_data).map_err(ArmCtrlInitError::ParamLoadError)?;

        self.arch_report = Archiver::from_path(session, "arm_ctrl/status_report.csv")
            .map_err(ArmCtrlInitError::ArchiveError)?;

        Ok(())
    }

    /// Perform cyclic processing of Arm Control.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
        scene: &mut Self::Env,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport::default();

        let dt_s = input_data.dt_s;
        let inputs = &input_data.inputs;

        // Root translation is allowed in any mode, requests longer than one
        // are scaled back to unit length
        let mut root_dir = Vector3::new(inputs.root_move[0], 0.0, inputs.root_move[1]);
        let root_mag = root_dir.norm();
        if root_mag > 1.0 {
            root_dir /= root_mag;
        }
        if root_mag > 0.0 {
            scene.translate_root(root_dir * self.params.root_move_speed_ms * dt_s);
        }

        if let Some(mode) = inputs.mode {
            self.set_manual_mode(mode == ControlMode::Manual);
        }

        if inputs.reset {
            if let Err(e) = self.reset_arm() {
                warn!("Could not reset the arm: {}", e);
            }
        }

        if self.mode == ControlMode::Manual && !self.is_busy() {
            let out = manual_step(&self.angles, inputs, dt_s, &self.params, scene);

            self.angles = out.committed;
            self.report.manual_rolled_back = out.rolled_back;
            self.report.shoulder_limited = out.limits.shoulder_limited;
            self.report.elbow_limited = out.limits.elbow_limited;

            if inputs.grab_toggle {
                if let Err(e) = self.toggle_grab(scene) {
                    warn!("Could not toggle the grab: {}", e);
                }
            }
        }

        self.step_operation(dt_s, scene);

        self.report.mode = self.mode;
        self.report.busy = self.is_busy();

        trace!("ArmCtrl output: {:?}", self.angles);

        Ok((self.angles, self.report))
    }
}

impl Archived for ArmCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        let record = ArchRecord {
            time_s: session::get_elapsed_seconds(),
            mode: self.report.mode,
            busy: self.report.busy,
            op_status: self.report.op_status,
            manual_rolled_back: self.report.manual_rolled_back,
            shoulder_limited: self.report.shoulder_limited,
            elbow_limited: self.report.elbow_limited,
            evasion_offset_deg: self.report.evasion_offset_deg,
            obstructed: self.report.obstructed,
            base_deg: self.angles.base_deg,
            shoulder_deg: self.angles.shoulder_deg,
            elbow_deg: self.angles.elbow_deg,
            wrist_deg: self.angles.wrist_deg,
            mini_elbow_deg: self.angles.mini_elbow_deg,
            gripper_deg: self.angles.gripper_deg,
            held_object: self.grasp.held().map(|o| o.0),
        };

        self.arch_report.serialise(record)
    }
}
