//! # Telecommand processor module
//!
//! The telecommand processor handles TCs coming from any source, turning
//! them into calls on the modules in the data store.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use nalgebra::Vector3;
use thiserror::Error;

// Internal
use crate::{
    arm_ctrl::{ArmCtrlError, SeekTarget},
    data_store::DataStore,
    sequencer::{PickAndPlace, SequenceError},
    sim::SimScene,
};
use arm_if::{
    eqpt::scene::ObjectId,
    tc::{arm_ctrl::ArmCmd, Tc, TcType},
};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Reasons a TC could not be executed.
#[derive(Debug, Error)]
pub enum TcExecError {
    #[error("No object named \"{0}\" in the scene")]
    UnknownObjectName(String),

    #[error("A pick and place sequence is already running")]
    SequenceRunning,

    #[error(transparent)]
    ArmCtrlError(#[from] ArmCtrlError),

    #[error(transparent)]
    SequenceError(#[from] SequenceError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Mutates the datastore to send commands to different modules. TCs that
/// cannot be executed are logged and dropped.
pub fn exec(ds: &mut DataStore, scene: &mut SimScene, tc: &Tc) {
    match tc.tc_type {
        TcType::None => (),
        TcType::Heartbeat => debug!("Heartbeat received"),
        TcType::MakeSafe => {
            debug!("Recieved MakeSafe command");
            ds.make_safe();
        }
        TcType::ArmCtrl => match tc.arm_cmd() {
            Ok(Some(cmd)) => {
                if let Err(e) = exec_arm_cmd(ds, scene, cmd) {
                    warn!("Could not execute arm command: {}", e);
                }
            }
            Ok(None) => (),
            Err(e) => warn!("Invalid arm command: {}", e),
        },
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn exec_arm_cmd(ds: &mut DataStore, scene: &mut SimScene, cmd: ArmCmd) -> Result<(), TcExecError> {
    debug!("Executing {:?}", cmd);

    match cmd {
        ArmCmd::MoveToTarget { target_m } => ds
            .arm_ctrl
            .move_to_target(SeekTarget::Point(Vector3::from(target_m)))?,
        ArmCmd::MoveToObject { object } => {
            let id = find(scene, &object)?;
            ds.arm_ctrl.move_to_target(SeekTarget::Object(id))?
        }
        ArmCmd::MoveToPose {
            angles_deg,
            duration_s,
        } => ds.arm_ctrl.move_to_pose(angles_deg, duration_s)?,
        ArmCmd::Reset => ds.arm_ctrl.reset_arm()?,
        ArmCmd::Grab { object } => {
            let id = find(scene, &object)?;
            ds.arm_ctrl.force_grab(id, scene)?
        }
        ArmCmd::Release => {
            ds.arm_ctrl.release_object(scene)?;
        }
        ArmCmd::SetManualMode { manual } => {
            ds.arm_ctrl.set_manual_mode(manual);
            if manual && ds.sequence.take().is_some() {
                info!("Pick and place sequence stopped");
            }
        }
        ArmCmd::Manual { inputs } => ds.set_manual_inputs(inputs),
        ArmCmd::PickAndPlace { object, drop_zone } => {
            if ds.sequence.is_some() {
                return Err(TcExecError::SequenceRunning);
            }

            let object = find(scene, &object)?;
            let drop_zone = find(scene, &drop_zone)?;

            ds.sequence = Some(PickAndPlace::new(
                object,
                drop_zone,
                &ds.sequence_params,
                &*scene,
            )?);
        }
    }

    Ok(())
}

fn find(scene: &SimScene, name: &str) -> Result<ObjectId, TcExecError> {
    scene
        .find_object(name)
        .ok_or_else(|| TcExecError::UnknownObjectName(name.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::arm_ctrl::ControlMode;
    use crate::sim::{self, BodyParams, Shape};
    use arm_if::eqpt::scene::LayerMask;
    use arm_if::tc::arm_ctrl::ManualInputs;

    fn scene() -> SimScene {
        SimScene::new(sim::Params {
            bodies: vec![BodyParams {
                name: "cube".into(),
                position_m: [0.0, 0.1, 1.8],
                shape: Shape::Sphere { radius_m: 0.1 },
                layer: LayerMask::layer(4),
                kinematic: Some(false),
            }],
            ..sim::Params::default()
        })
        .unwrap()
    }

    fn tc(json: &str) -> Tc {
        Tc::from_json(json).unwrap()
    }

    #[test]
    fn test_manual_inputs_edges_apply_once() {
        let mut ds = DataStore::default();
        let mut scene = scene();

        ds.cycle_start(0.02);
        exec(
            &mut ds,
            &mut scene,
            &tc(r#"{"type": "ARM", "payload": {"Manual": {"inputs": {"reset": true, "root_move": [1.0, 0.0]}}}}"#),
        );

        assert!(ds.arm_ctrl_input.inputs.reset);
        assert_eq!(ds.arm_ctrl_input.inputs.root_move, [1.0, 0.0]);

        // Next cycle only the held part remains
        ds.cycle_start(0.02);
        assert!(!ds.arm_ctrl_input.inputs.reset);
        assert_eq!(ds.arm_ctrl_input.inputs.root_move, [1.0, 0.0]);
        assert_eq!(ds.arm_ctrl_input.dt_s, 0.02);
    }

    #[test]
    fn test_make_safe() {
        let mut ds = DataStore::default();
        let mut scene = scene();

        exec(
            &mut ds,
            &mut scene,
            &tc(r#"{"type": "ARM", "payload": {"SetManualMode": {"manual": false}}}"#),
        );
        exec(
            &mut ds,
            &mut scene,
            &tc(r#"{"type": "ARM", "payload": {"MoveToTarget": {"target_m": [0.0, 0.5, 2.0]}}}"#),
        );
        assert_eq!(ds.arm_ctrl.mode(), ControlMode::Autonomous);
        assert!(ds.arm_ctrl.is_busy());

        exec(&mut ds, &mut scene, &tc(r#"{"type": "SAFE"}"#));
        assert_eq!(ds.arm_ctrl.mode(), ControlMode::Manual);
        assert!(!ds.arm_ctrl.is_busy());
        assert_eq!(ds.held_inputs, ManualInputs::default());
    }

    #[test]
    fn test_object_commands() {
        let mut ds = DataStore::default();
        let mut scene = scene();
        let cube = scene.find_object("cube").unwrap();

        exec(
            &mut ds,
            &mut scene,
            &tc(r#"{"type": "ARM", "payload": {"Grab": {"object": "cube"}}}"#),
        );
        assert_eq!(ds.arm_ctrl.held_object(), Some(cube));

        exec(&mut ds, &mut scene, &tc(r#"{"type": "ARM", "payload": "Release"}"#));
        assert_eq!(ds.arm_ctrl.held_object(), None);

        // Unknown names are dropped
        exec(
            &mut ds,
            &mut scene,
            &tc(r#"{"type": "ARM", "payload": {"MoveToObject": {"object": "dragon"}}}"#),
        );
        assert!(!ds.arm_ctrl.is_busy());

        exec(
            &mut ds,
            &mut scene,
            &tc(r#"{"type": "ARM", "payload": {"MoveToObject": {"object": "cube"}}}"#),
        );
        assert!(ds.arm_ctrl.is_busy());
    }

    #[test]
    fn test_single_sequence_at_a_time() {
        let mut ds = DataStore::default();
        let mut scene = scene();

        let start = r#"{"type": "ARM", "payload": {"PickAndPlace": {"object": "cube", "drop_zone": "cube"}}}"#;

        exec(&mut ds, &mut scene, &tc(start));
        assert!(ds.sequence.is_some());
        let remaining = ds.sequence.as_ref().map(|s| s.num_remaining());

        exec(&mut ds, &mut scene, &tc(start));
        assert_eq!(ds.sequence.as_ref().map(|s| s.num_remaining()), remaining);

        exec(
            &mut ds,
            &mut scene,
            &tc(r#"{"type": "ARM", "payload": {"SetManualMode": {"manual": true}}}"#),
        );
        assert!(ds.sequence.is_none());
    }
}
