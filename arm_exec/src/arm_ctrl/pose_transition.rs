//! Timed transitions between two poses

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;

// Internal
use super::{AngleState, ArmCtrlError, StepStatus};
use arm_if::eqpt::scene::PoseApplier;
use util::maths::smoothstep;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A running transition from one pose to another.
///
/// Each joint is interpolated along its shortest arc, with the blend factor
/// eased by a smoothstep curve. The transition is not collision checked.
#[derive(Debug, Clone)]
pub struct PoseTransition {
    start: AngleState,
    target: AngleState,

    /// Units: seconds
    duration_s: f64,

    /// Normalised progress, from 0 to 1
    t: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PoseTransition {
    /// Create a new transition.
    ///
    /// The progress advances by `2 dt / duration_s` each step, so
    /// `duration_s` must be positive and finite.
    pub fn new(
        start: AngleState,
        target: AngleState,
        duration_s: f64,
    ) -> Result<Self, ArmCtrlError> {
        if !duration_s.is_finite() || duration_s <= 0.0 {
            return Err(ArmCtrlError::InvalidDuration(duration_s));
        }

        Ok(Self {
            start,
            target,
            duration_s,
            t: 0.0,
        })
    }

    pub fn target(&self) -> &AngleState {
        &self.target
    }

    /// Normalised progress of the transition, from 0 to 1.
    pub fn progress(&self) -> f64 {
        self.t.min(1.0)
    }

    /// Advance the transition by one cycle, updating and applying `angles`.
    pub fn step<S>(&mut self, angles: &mut AngleState, dt_s: f64, scene: &mut S) -> StepStatus
    where
        S: PoseApplier + ?Sized,
    {
        self.t += dt_s * 2.0 / self.duration_s;

        if self.t >= 1.0 {
            // Finish exactly on the target rather than on an equivalent angle
            *angles = self.target;
            angles.apply(scene);

            debug!("Pose transition complete: {:?}", self.target);
            return StepStatus::Completed;
        }

        *angles = AngleState::lerp_angles(&self.start, &self.target, smoothstep(self.t));
        angles.apply(scene);

        StepStatus::Running
    }
}
