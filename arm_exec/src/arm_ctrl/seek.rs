//! Reactive seek towards a point in the world

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use nalgebra::Vector3;

// Internal
use super::{AngleState, Params, StepStatus};
use arm_if::eqpt::scene::{JointId, ObjectId, Scene};
use util::maths::{ang_dist_deg, clamp, lerp_angle_deg};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Joints which are re-read from the scene when a seek starts.
const SYNCED_JOINTS: [JointId; 3] = [JointId::Base, JointId::Shoulder, JointId::Elbow];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A running seek operation.
///
/// The seek doesn't solve the arm's inverse kinematics. Instead the base is
/// turned to face the target and the shoulder and elbow are driven to angles
/// proportional to the distance to the target. While the line from the end
/// effector to the target is obstructed an evasion offset pulls the shoulder
/// back, and it recovers once the line is clear.
#[derive(Debug, Clone)]
pub struct Seek {
    target: SeekTarget,

    /// Offset added to the shoulder target to evade obstructions.
    ///
    /// Units: degrees
    evasion_offset_deg: f64,

    /// Time since the seek started.
    ///
    /// Units: seconds
    elapsed_s: f64,

    /// Whether the last step found the target obstructed.
    obstructed: bool,

    /// Whether the angles have been read back from the scene yet.
    synced: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// What a seek is moving towards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekTarget {
    /// A fixed point in the world frame
    Point(Vector3<f64>),

    /// An object in the scene, whose position is read on every step
    Object(ObjectId),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Seek {
    pub fn new(target: SeekTarget) -> Self {
        Self {
            target,
            evasion_offset_deg: 0.0,
            elapsed_s: 0.0,
            obstructed: false,
            synced: false,
        }
    }

    pub fn target(&self) -> SeekTarget {
        self.target
    }

    pub fn evasion_offset_deg(&self) -> f64 {
        self.evasion_offset_deg
    }

    pub fn obstructed(&self) -> bool {
        self.obstructed
    }

    pub fn elapsed_s(&self) -> f64 {
        self.elapsed_s
    }

    /// Advance the seek by one cycle, updating and applying `angles`.
    pub fn step<S>(
        &mut self,
        angles: &mut AngleState,
        dt_s: f64,
        params: &Params,
        scene: &mut S,
    ) -> StepStatus
    where
        S: Scene + ?Sized,
    {
        if !self.synced {
            angles.sync_from(scene, &SYNCED_JOINTS);
            self.synced = true;
            debug!("Seek started towards {:?} from {:?}", self.target, angles);
        }

        self.elapsed_s += dt_s;

        if let Some(timeout_s) = params.seek_timeout_s {
            if self.elapsed_s > timeout_s {
                warn!(
                    "Seek towards {:?} timed out after {:.2} s",
                    self.target, self.elapsed_s
                );
                return StepStatus::Cancelled;
            }
        }

        let target_m = match self.target {
            SeekTarget::Point(p) => p,
            SeekTarget::Object(id) => match scene.object_position(id) {
                Some(p) => p,
                None => {
                    warn!("Seek target {:?} is no longer in the scene", id);
                    return StepStatus::Cancelled;
                }
            },
        };

        // ---- IDEAL ANGLES ----

        let dir_m = target_m - scene.root_position();
        let dist_m = dir_m.norm();

        let ideal_base_deg = dir_m.x.atan2(dir_m.z).to_degrees();
        let ideal_shoulder_deg = clamp(
            dist_m * params.seek_shoulder_gain_degm,
            params.seek_shoulder_limits_deg[0],
            params.seek_shoulder_limits_deg[1],
        );
        let ideal_elbow_deg = clamp(
            dist_m * params.seek_elbow_gain_degm,
            params.seek_elbow_limits_deg[0],
            params.seek_elbow_limits_deg[1],
        );

        // ---- EVASION ----

        // If there's no end effector to look from the path is assumed clear
        self.obstructed = match scene.end_effector_position() {
            Some(ee_m) => scene.segment_blocked(&ee_m, &target_m, params.obstacle_layer),
            None => false,
        };

        if self.obstructed {
            self.evasion_offset_deg -= params.evasion_speed_degs * dt_s;
        } else {
            self.evasion_offset_deg += params.recovery_speed_degs * dt_s;
        }
        self.evasion_offset_deg = clamp(
            self.evasion_offset_deg,
            params.evasion_limits_deg[0],
            params.evasion_limits_deg[1],
        );

        let final_shoulder_deg = ideal_shoulder_deg + self.evasion_offset_deg;

        // ---- BLEND ----

        let k = clamp(dt_s * params.auto_speed, 0.0, 1.0);
        let k_shoulder = clamp(2.0 * dt_s * params.auto_speed, 0.0, 1.0);

        angles.base_deg = lerp_angle_deg(angles.base_deg, ideal_base_deg, k);
        angles.shoulder_deg = lerp_angle_deg(angles.shoulder_deg, final_shoulder_deg, k_shoulder);
        angles.elbow_deg = lerp_angle_deg(angles.elbow_deg, ideal_elbow_deg, k);

        angles.apply(scene);

        trace!(
            "Seek: dist {:.3} m, base {:.2}/{:.2}, shoulder {:.2}/{:.2}, elbow {:.2}/{:.2}, \
            evasion {:.2}, obstructed {}",
            dist_m,
            angles.base_deg,
            ideal_base_deg,
            angles.shoulder_deg,
            final_shoulder_deg,
            angles.elbow_deg,
            ideal_elbow_deg,
            self.evasion_offset_deg,
            self.obstructed
        );

        // ---- TERMINATION ----

        let base_err_deg = ang_dist_deg(angles.base_deg, ideal_base_deg).abs();
        let shoulder_err_deg = ang_dist_deg(angles.shoulder_deg, final_shoulder_deg).abs();

        if base_err_deg < params.seek_base_tolerance_deg
            && shoulder_err_deg < params.seek_shoulder_tolerance_deg
            && !self.obstructed
        {
            debug!("Seek reached {:?} after {:.2} s", self.target, self.elapsed_s);
            StepStatus::Completed
        } else {
            StepStatus::Running
        }
    }
}
