//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;

use crate::{
    arm_ctrl::{self, AngleState, ArmCtrl},
    sequencer::{self, PickAndPlace},
};
use arm_if::tc::arm_ctrl::ManualInputs;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// Simulation elapsed time
    pub sim_time_s: f64,

    // ArmCtrl
    pub arm_ctrl: ArmCtrl,
    pub arm_ctrl_input: arm_ctrl::InputData,
    pub arm_ctrl_output: AngleState,
    pub arm_ctrl_status_rpt: arm_ctrl::StatusReport,

    /// Operator inputs which stay applied until the next manual command.
    /// Edge triggered inputs are only applied on the cycle they arrive.
    pub held_inputs: ManualInputs,

    // Sequencing
    pub sequence: Option<PickAndPlace>,
    pub sequence_params: sequencer::Params,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Prepare the store for a new cycle of the given length.
    pub fn cycle_start(&mut self, dt_s: f64) {
        self.arm_ctrl_input = arm_ctrl::InputData {
            dt_s,
            inputs: self.held_inputs,
        };
    }

    /// Apply a new set of operator inputs.
    pub fn set_manual_inputs(&mut self, inputs: ManualInputs) {
        self.arm_ctrl_input.inputs = inputs;
        self.held_inputs = inputs.held();
    }

    /// Put the arm into a safe state: manual mode with no inputs held and no
    /// sequence running.
    pub fn make_safe(&mut self) {
        warn!("Make safe requested");

        self.arm_ctrl.set_manual_mode(true);
        self.sequence = None;
        self.held_inputs = ManualInputs::default();
        self.arm_ctrl_input.inputs = ManualInputs::default();
    }
}
