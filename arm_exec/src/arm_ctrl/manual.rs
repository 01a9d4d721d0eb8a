//! Manual control step and the collision gate

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde::Serialize;

// Internal
use super::{AngleState, LimitFlags, Params};
use arm_if::eqpt::scene::{JointId, Scene};
use arm_if::tc::arm_ctrl::ManualInputs;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Pairs of joints whose links are checked for collisions, as capsules
/// between the joint origins.
const LINK_CAPSULES: [(JointId, JointId); 3] = [
    (JointId::Base, JointId::Shoulder),
    (JointId::Shoulder, JointId::Elbow),
    (JointId::Elbow, JointId::Wrist),
];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The result of a single manual control step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ManualStepOutput {
    /// The angles now applied to the scene.
    pub committed: AngleState,

    /// True if the candidate angles collided and were reverted.
    pub rolled_back: bool,

    /// Which joints were held at their limits while building the candidate.
    pub limits: LimitFlags,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Perform one manual control step.
///
/// The candidate angles are built from the held directional inputs, limited,
/// and applied to the scene. The scene is then probed for collisions and if
/// the arm collides (and blocking is enabled) the previous angles are
/// reapplied.
pub fn manual_step<S>(
    current: &AngleState,
    inputs: &ManualInputs,
    dt_s: f64,
    params: &Params,
    scene: &mut S,
) -> ManualStepOutput
where
    S: Scene + ?Sized,
{
    let step_deg = dt_s * params.manual_rotation_speed_degs;

    let mut candidate = *current;
    for joint in JointId::ALL.iter() {
        let dir = inputs.axes[joint.index()].direction();
        candidate.set(*joint, candidate.get(*joint) + dir * step_deg);
    }

    let limits = candidate.limit_manual(params);

    // Speculatively apply the candidate, the collision geometry depends on
    // where the links end up
    candidate.apply(scene);

    if params.block_manual_on_collision && collision_check(params, scene) {
        debug!("Manual move collides, reverting to the previous angles");
        current.apply(scene);

        return ManualStepOutput {
            committed: *current,
            rolled_back: true,
            limits,
        };
    }

    trace!("Manual move committed: {:?}", candidate);

    ManualStepOutput {
        committed: candidate,
        rolled_back: false,
        limits,
    }
}

/// Check whether the arm in its current scene pose intersects an obstacle.
///
/// The base, upper arm and forearm are checked as capsules between their
/// joints, and the end effector as a sphere. Links with a missing joint are
/// not checked.
pub fn collision_check<S>(params: &Params, scene: &S) -> bool
where
    S: Scene + ?Sized,
{
    for (from, to) in LINK_CAPSULES.iter() {
        if let (Some(a), Some(b)) = (scene.joint_position(*from), scene.joint_position(*to)) {
            if scene.capsule_blocked(&a, &b, params.link_radius_m, params.obstacle_layer) {
                trace!("Link {:?} -> {:?} is blocked", from, to);
                return true;
            }
        }
    }

    match scene.end_effector_position() {
        Some(ee) => scene.sphere_blocked(&ee, params.end_effector_radius_m, params.obstacle_layer),
        None => false,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::arm_ctrl::mock::MockScene;
    use arm_if::tc::arm_ctrl::AxisInput;

    const INC: AxisInput = AxisInput {
        decrease: false,
        increase: true,
    };
    const DEC: AxisInput = AxisInput {
        decrease: true,
        increase: false,
    };

    fn shoulder_above_20(scene: &MockScene) -> bool {
        scene.angle_or_zero(JointId::Shoulder) > 20.0
    }

    #[test]
    fn test_step_moves_held_axes() {
        let params = Params::default();
        let mut scene = MockScene::new();

        let inputs = ManualInputs::default()
            .with_axis(JointId::Base, INC)
            .with_axis(JointId::Elbow, DEC)
            .with_axis(JointId::Gripper, AxisInput { decrease: true, increase: true });

        let start = AngleState {
            elbow_deg: 30.0,
            ..Default::default()
        };
        let out = manual_step(&start, &inputs, 0.1, &params, &mut scene);

        assert!(!out.rolled_back);
        assert!((out.committed.base_deg - 5.0).abs() < 1e-9);
        assert!((out.committed.elbow_deg - 25.0).abs() < 1e-9);
        assert_eq!(out.committed.gripper_deg, 0.0);

        // One application of all six joints
        assert_eq!(scene.apply_count, 6);
        assert_eq!(scene.joint_angle(JointId::Base), Some(out.committed.base_deg));
    }

    #[test]
    fn test_rollback_is_lossless() {
        let params = Params::default();
        let mut scene = MockScene::new();
        scene.link_collision = shoulder_above_20;

        let start = AngleState::from_array([12.25, 19.0, 33.5, -4.0, 7.0, 91.0]);
        let inputs = ManualInputs::default()
            .with_axis(JointId::Shoulder, INC)
            .with_axis(JointId::Base, INC);

        let out = manual_step(&start, &inputs, 0.1, &params, &mut scene);

        assert!(out.rolled_back);
        assert_eq!(out.committed, start);

        // Candidate then the previous angles
        assert_eq!(scene.apply_count, 12);
        for joint in JointId::ALL.iter() {
            assert_eq!(scene.joint_angle(*joint), Some(start.get(*joint)));
        }
    }

    #[test]
    fn test_collision_ignored_when_not_blocking() {
        let params = Params {
            block_manual_on_collision: false,
            ..Params::default()
        };
        let mut scene = MockScene::new();
        scene.link_collision = shoulder_above_20;

        let start = AngleState {
            shoulder_deg: 19.0,
            ..Default::default()
        };
        let inputs = ManualInputs::default().with_axis(JointId::Shoulder, INC);
        let out = manual_step(&start, &inputs, 0.1, &params, &mut scene);

        assert!(!out.rolled_back);
        assert!((out.committed.shoulder_deg - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_limits_hold_over_many_steps() {
        let params = Params::default();
        let mut scene = MockScene::new();

        let up = ManualInputs::default()
            .with_axis(JointId::Shoulder, INC)
            .with_axis(JointId::Elbow, DEC);

        let mut angles = AngleState::default();
        let mut limits = LimitFlags::default();
        for _ in 0..100 {
            let out = manual_step(&angles, &up, 0.1, &params, &mut scene);
            angles = out.committed;
            limits = out.limits;

            assert!(angles.shoulder_deg <= 100.0 && angles.shoulder_deg >= -100.0);
            assert!(angles.elbow_deg <= 160.0 && angles.elbow_deg >= -10.0);
        }

        assert_eq!(angles.shoulder_deg, 100.0);
        assert_eq!(angles.elbow_deg, -10.0);
        assert!(limits.shoulder_limited && limits.elbow_limited);
    }

    #[test]
    fn test_collision_check_skips_missing_links() {
        let params = Params::default();
        let mut scene = MockScene::new();
        scene.link_collision = |_| true;

        assert!(collision_check(&params, &scene));

        // With every joint and the end effector missing nothing is checked
        for joint in JointId::ALL.iter() {
            scene.unbind(*joint);
        }
        scene.end_effector_m = None;
        assert!(!collision_check(&params, &scene));
    }
}
