//! # Arm library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to
//! access items defined inside the arm executable crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Arm control module - turns operator inputs and autonomous operations into joint angles
pub mod arm_ctrl;

/// Data store - the data shared between modules over one cycle
pub mod data_store;

/// Pick and place sequencer - drives arm control through a grab and drop sequence
pub mod sequencer;

/// Simulated scene - kinematics, obstacles and objects for the arm to act on
pub mod sim;

/// Telecommand processor - routes telecommands to the modules
pub mod tc_processor;
