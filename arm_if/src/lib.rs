//! # Arm interface crate.
//!
//! Provides the interfaces shared between the arm control software and the
//! things it talks to: the scene the arm lives in and the telecommands that
//! drive it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod tc;

/// Interfaces to equipment and the scene (joints, collision queries, objects)
pub mod eqpt;
