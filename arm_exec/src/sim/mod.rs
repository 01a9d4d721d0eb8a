//! # Simulated scene
//!
//! A minimal stand-in for the arm's physical world. The arm is modelled as a
//! chain of six joints with straight links, each joint's local rotation being
//! built from its Euler angles as `Ry(y) Rx(x) Rz(z)`. At zero angles every
//! link points straight up (+Y), and the base yaw turns the arm towards +X
//! from +Z.
//!
//! The scene also holds bodies (obstacles, objects to pick up, drop zones)
//! with sphere or box shapes on collision layers. Bodies attached to the arm
//! follow it and are ignored by blocking queries. There is no physics, a
//! released body stays where it was let go.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod geometry;
mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use nalgebra::{Rotation3, Vector3};
use std::collections::HashSet;
use thiserror::Error;

// Internal
pub use geometry::*;
pub use params::*;

use arm_if::eqpt::scene::{
    AttachPoint, CollisionProbe, JointId, LayerMask, ObjectId, PoseApplier, SceneAttach,
    SceneError, NUM_JOINTS,
};
use util::maths::rem_euclid;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The simulated scene.
#[derive(Debug, Clone)]
pub struct SimScene {
    params: Params,

    /// Units: meters
    root_m: Vector3<f64>,

    /// Local Euler angles of each joint, ordered as [`JointId::ALL`].
    ///
    /// Units: degrees
    eulers_deg: [Vector3<f64>; NUM_JOINTS],

    unbound: HashSet<JointId>,

    bodies: Vec<SimBody>,
}

/// A body in the simulated scene.
#[derive(Debug, Clone)]
pub struct SimBody {
    pub id: ObjectId,
    pub name: String,
    pub shape: Shape,
    pub layer: LayerMask,

    /// World position while free. Stale while attached.
    position_m: Vector3<f64>,

    kinematic: Option<bool>,

    attachment: Option<Attachment>,
}

#[derive(Debug, Clone, Copy)]
struct Attachment {
    parent: AttachPoint,
    offset_m: Vector3<f64>,
    orientation_deg: Vector3<f64>,
}

/// World frames of the arm, the result of forward kinematics.
#[derive(Debug, Clone)]
pub struct ArmFrames {
    /// Origin of each joint.
    pub joint_positions_m: [Vector3<f64>; NUM_JOINTS],

    /// Orientation of each joint after its own rotation.
    pub joint_rotations: [Rotation3<f64>; NUM_JOINTS],

    /// The grip point at the end of the gripper link.
    pub grip_point_m: Vector3<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Link length {0} must be non-negative and finite, found {1}")]
    InvalidLength(&'static str, f64),

    #[error("Body \"{0}\" has an invalid shape")]
    InvalidShape(String),

    #[error("More than one body is named \"{0}\"")]
    DuplicateName(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimScene {
    /// Build a new scene from the parameters.
    pub fn new(params: Params) -> Result<Self, SimError> {
        let link_names = [
            "base_height_m",
            "upper_arm_m",
            "forearm_m",
            "wrist_m",
            "mini_elbow_m",
            "gripper_m",
        ];
        for (name, len) in link_names.iter().zip(params.link_lengths_m().iter()) {
            if !len.is_finite() || *len < 0.0 {
                return Err(SimError::InvalidLength(*name, *len));
            }
        }

        let mut names = HashSet::new();
        let mut bodies = Vec::with_capacity(params.bodies.len());

        for (i, b) in params.bodies.iter().enumerate() {
            if !b.shape.is_valid() {
                return Err(SimError::InvalidShape(b.name.clone()));
            }
            if !names.insert(b.name.clone()) {
                return Err(SimError::DuplicateName(b.name.clone()));
            }

            bodies.push(SimBody {
                id: ObjectId(i as u32),
                name: b.name.clone(),
                shape: b.shape,
                layer: b.layer,
                position_m: Vector3::from(b.position_m),
                kinematic: b.kinematic,
                attachment: None,
            });
        }

        let mut eulers_deg = [Vector3::zeros(); NUM_JOINTS];
        for joint in JointId::ALL.iter() {
            eulers_deg[joint.index()] =
                joint.local_euler_deg(params.initial_pose_deg[joint.index()]);
        }

        debug!(
            "Simulated scene built with {} bodies and {} unbound joints",
            bodies.len(),
            params.unbound_joints.len()
        );

        Ok(Self {
            root_m: Vector3::from(params.root_m),
            eulers_deg,
            unbound: params.unbound_joints.iter().copied().collect(),
            bodies,
            params,
        })
    }

    /// Find a body by name.
    pub fn find_object(&self, name: &str) -> Option<ObjectId> {
        self.bodies.iter().find(|b| b.name == name).map(|b| b.id)
    }

    pub fn body(&self, id: ObjectId) -> Option<&SimBody> {
        self.bodies.get(id.0 as usize)
    }

    pub fn bodies(&self) -> &[SimBody] {
        &self.bodies
    }

    /// The point on the arm a body is attached to, if any.
    pub fn attached_to(&self, id: ObjectId) -> Option<AttachPoint> {
        self.body(id).and_then(|b| b.attachment).map(|a| a.parent)
    }

    /// The local orientation a body was attached with, if attached.
    ///
    /// Units: degrees
    pub fn attached_orientation_deg(&self, id: ObjectId) -> Option<Vector3<f64>> {
        self.body(id)
            .and_then(|b| b.attachment)
            .map(|a| a.orientation_deg)
    }

    /// Teleport a free body to a new position.
    pub fn set_object_position(
        &mut self,
        id: ObjectId,
        position_m: Vector3<f64>,
    ) -> Result<(), SceneError> {
        self.body_mut(id)?.position_m = position_m;
        Ok(())
    }

    /// Compute the world frames of the arm.
    pub fn forward_kinematics(&self) -> ArmFrames {
        let lengths = self.params.link_lengths_m();

        let mut joint_positions_m = [Vector3::zeros(); NUM_JOINTS];
        let mut joint_rotations = [Rotation3::identity(); NUM_JOINTS];

        let mut pos = self.root_m;
        let mut rot = Rotation3::identity();

        for i in 0..NUM_JOINTS {
            joint_positions_m[i] = pos;
            rot = rot * local_rotation(&self.eulers_deg[i]);
            joint_rotations[i] = rot;
            pos += rot * Vector3::new(0.0, lengths[i], 0.0);
        }

        ArmFrames {
            joint_positions_m,
            joint_rotations,
            grip_point_m: pos,
        }
    }

    fn body_mut(&mut self, id: ObjectId) -> Result<&mut SimBody, SceneError> {
        self.bodies
            .get_mut(id.0 as usize)
            .ok_or(SceneError::UnknownObject(id))
    }

    /// World position of a body, following its attachment if it has one.
    fn body_position(&self, body: &SimBody, frames: &ArmFrames) -> Vector3<f64> {
        match body.attachment {
            None => body.position_m,
            Some(att) => {
                let (pos, rot) = match att.parent {
                    AttachPoint::GripPoint => (
                        frames.grip_point_m,
                        frames.joint_rotations[JointId::Gripper.index()],
                    ),
                    AttachPoint::Joint(j) => {
                        (frames.joint_positions_m[j.index()], frames.joint_rotations[j.index()])
                    }
                };
                pos + rot * att.offset_m
            }
        }
    }

    /// Free bodies on the given layers, which can block the arm.
    fn blockers(&self, mask: LayerMask) -> impl Iterator<Item = &SimBody> + '_ {
        self.bodies
            .iter()
            .filter(move |b| b.attachment.is_none() && b.layer.intersects(mask))
    }
}

/// Local rotation of a joint from its Euler angles in degrees.
fn local_rotation(euler_deg: &Vector3<f64>) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::y_axis(), euler_deg.y.to_radians())
        * Rotation3::from_axis_angle(&Vector3::x_axis(), euler_deg.x.to_radians())
        * Rotation3::from_axis_angle(&Vector3::z_axis(), euler_deg.z.to_radians())
}

impl CollisionProbe for SimScene {
    fn segment_blocked(&self, a_m: &Vector3<f64>, b_m: &Vector3<f64>, mask: LayerMask) -> bool {
        self.blockers(mask)
            .any(|b| b.shape.intersects_segment(&b.position_m, a_m, b_m))
    }

    fn sphere_blocked(&self, centre_m: &Vector3<f64>, radius_m: f64, mask: LayerMask) -> bool {
        self.blockers(mask)
            .any(|b| b.shape.intersects_sphere(&b.position_m, centre_m, radius_m))
    }

    fn capsule_blocked(
        &self,
        a_m: &Vector3<f64>,
        b_m: &Vector3<f64>,
        radius_m: f64,
        mask: LayerMask,
    ) -> bool {
        self.blockers(mask)
            .any(|b| b.shape.intersects_capsule(&b.position_m, a_m, b_m, radius_m))
    }

    fn sphere_overlaps(
        &self,
        centre_m: &Vector3<f64>,
        radius_m: f64,
        mask: LayerMask,
    ) -> Vec<ObjectId> {
        let frames = self.forward_kinematics();

        let mut hits: Vec<(f64, ObjectId)> = self
            .bodies
            .iter()
            .filter(|b| b.layer.intersects(mask))
            .filter_map(|b| {
                let pos = self.body_position(b, &frames);
                if b.shape.intersects_sphere(&pos, centre_m, radius_m) {
                    Some(((pos - centre_m).norm(), b.id))
                } else {
                    None
                }
            })
            .collect();

        hits.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        hits.into_iter().map(|(_, id)| id).collect()
    }
}

impl PoseApplier for SimScene {
    fn set_joint_orientation(
        &mut self,
        joint: JointId,
        local_euler_deg: Vector3<f64>,
    ) -> Result<(), SceneError> {
        if self.unbound.contains(&joint) {
            return Err(SceneError::UnboundJoint(joint));
        }

        self.eulers_deg[joint.index()] = local_euler_deg;
        Ok(())
    }

    fn joint_orientation(&self, joint: JointId) -> Option<Vector3<f64>> {
        if self.unbound.contains(&joint) {
            return None;
        }

        Some(self.eulers_deg[joint.index()].map(|c| rem_euclid(c, 360.0)))
    }

    fn joint_position(&self, joint: JointId) -> Option<Vector3<f64>> {
        if self.unbound.contains(&joint) {
            return None;
        }

        Some(self.forward_kinematics().joint_positions_m[joint.index()])
    }

    fn end_effector_position(&self) -> Option<Vector3<f64>> {
        Some(self.forward_kinematics().grip_point_m)
    }

    fn root_position(&self) -> Vector3<f64> {
        self.root_m
    }

    fn translate_root(&mut self, delta_m: Vector3<f64>) {
        self.root_m += delta_m;
        trace!("Root moved to {:?}", self.root_m);
    }
}

impl SceneAttach for SimScene {
    fn attach(
        &mut self,
        object: ObjectId,
        parent: AttachPoint,
        local_offset_m: Vector3<f64>,
        local_orientation_deg: Vector3<f64>,
    ) -> Result<(), SceneError> {
        if let AttachPoint::Joint(j) = parent {
            if self.unbound.contains(&j) {
                return Err(SceneError::UnboundJoint(j));
            }
        }

        self.body_mut(object)?.attachment = Some(Attachment {
            parent,
            offset_m: local_offset_m,
            orientation_deg: local_orientation_deg,
        });

        Ok(())
    }

    fn detach(&mut self, object: ObjectId) -> Result<(), SceneError> {
        let frames = self.forward_kinematics();

        let world_m = {
            let body = self.body(object).ok_or(SceneError::UnknownObject(object))?;
            self.body_position(body, &frames)
        };

        let body = self.body_mut(object)?;
        body.position_m = world_m;
        body.attachment = None;

        Ok(())
    }

    fn set_kinematic(&mut self, object: ObjectId, kinematic: bool) -> Result<(), SceneError> {
        let body = self.body_mut(object)?;

        match body.kinematic {
            Some(_) => {
                body.kinematic = Some(kinematic);
                Ok(())
            }
            None => Err(SceneError::NoBody(object)),
        }
    }

    fn is_kinematic(&self, object: ObjectId) -> Option<bool> {
        self.body(object).and_then(|b| b.kinematic)
    }

    fn object_position(&self, object: ObjectId) -> Option<Vector3<f64>> {
        let body = self.body(object)?;
        Some(self.body_position(body, &self.forward_kinematics()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::arm_ctrl::{self, collision_check, AngleState, GraspState};

    fn assert_near(a: Vector3<f64>, b: Vector3<f64>) {
        assert!((a - b).norm() < 1e-9, "{:?} != {:?}", a, b);
    }

    fn body(name: &str, position_m: [f64; 3], shape: Shape, layer: LayerMask) -> BodyParams {
        BodyParams {
            name: name.into(),
            position_m,
            shape,
            layer,
            kinematic: Some(false),
        }
    }

    #[test]
    fn test_forward_kinematics() {
        let mut scene = SimScene::new(Params::default()).unwrap();

        // Straight up
        assert_near(
            scene.end_effector_position().unwrap(),
            Vector3::new(0.0, 3.3, 0.0),
        );
        assert_near(
            scene.joint_position(JointId::Elbow).unwrap(),
            Vector3::new(0.0, 1.5, 0.0),
        );

        // Shoulder pitched forward to horizontal
        AngleState::from_array([0.0, 90.0, 0.0, 0.0, 0.0, 0.0]).apply(&mut scene);
        assert_near(
            scene.end_effector_position().unwrap(),
            Vector3::new(0.0, 0.5, 2.8),
        );

        // Then turned by the base to face +X
        AngleState::from_array([90.0, 90.0, 0.0, 0.0, 0.0, 0.0]).apply(&mut scene);
        assert_near(
            scene.end_effector_position().unwrap(),
            Vector3::new(2.8, 0.5, 0.0),
        );

        // Moving the root moves the whole arm
        scene.translate_root(Vector3::new(0.0, 0.0, 1.0));
        assert_near(
            scene.end_effector_position().unwrap(),
            Vector3::new(2.8, 0.5, 1.0),
        );
    }

    #[test]
    fn test_joint_orientation_normalised() {
        let mut scene = SimScene::new(Params::default()).unwrap();

        AngleState::from_array([-10.0, 370.0, 0.0, 0.0, 0.0, 0.0]).apply(&mut scene);

        assert_eq!(scene.joint_orientation(JointId::Base).unwrap().y, 350.0);
        assert!((scene.joint_orientation(JointId::Shoulder).unwrap().x - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_unbound_joints() {
        let params = Params {
            unbound_joints: vec![JointId::Wrist],
            ..Params::default()
        };
        let mut scene = SimScene::new(params).unwrap();

        assert_eq!(
            scene.set_joint_orientation(JointId::Wrist, Vector3::zeros()),
            Err(SceneError::UnboundJoint(JointId::Wrist))
        );
        assert!(scene.joint_orientation(JointId::Wrist).is_none());
        assert!(scene.joint_position(JointId::Wrist).is_none());

        // The rest of the arm is still driven
        assert_eq!(
            AngleState::from_array([0.0, 90.0, 0.0, 45.0, 0.0, 0.0]).apply(&mut scene),
            5
        );
        assert_near(
            scene.end_effector_position().unwrap(),
            Vector3::new(0.0, 0.5, 2.8),
        );
    }

    #[test]
    fn test_collision_queries() {
        let arm_params = arm_ctrl::Params::default();
        let params = Params {
            bodies: vec![body(
                "pillar",
                [0.0, 1.0, 1.2],
                Shape::Box {
                    half_extents_m: [0.2, 1.0, 0.2],
                },
                arm_params.obstacle_layer,
            )],
            ..Params::default()
        };
        let mut scene = SimScene::new(params).unwrap();

        // Upright arm is clear of the pillar
        assert!(!collision_check(&arm_params, &scene));

        // Pitched forward the upper arm runs into it
        AngleState::from_array([0.0, 90.0, 0.0, 0.0, 0.0, 0.0]).apply(&mut scene);
        assert!(collision_check(&arm_params, &scene));

        // Turned away it's clear again
        AngleState::from_array([90.0, 90.0, 0.0, 0.0, 0.0, 0.0]).apply(&mut scene);
        assert!(!collision_check(&arm_params, &scene));

        // Only the obstacle layer is considered
        let a = Vector3::new(0.0, 1.0, 0.0);
        let b = Vector3::new(0.0, 1.0, 3.0);
        assert!(scene.segment_blocked(&a, &b, arm_params.obstacle_layer));
        assert!(!scene.segment_blocked(&a, &b, arm_params.grabbable_layer));
    }

    #[test]
    fn test_attached_body_follows_arm() {
        let arm_params = arm_ctrl::Params::default();
        let params = Params {
            bodies: vec![body(
                "cube",
                [0.0, 3.4, 0.0],
                Shape::Sphere { radius_m: 0.1 },
                LayerMask(arm_params.grabbable_layer.0 | arm_params.obstacle_layer.0),
            )],
            ..Params::default()
        };
        let mut scene = SimScene::new(params).unwrap();
        let cube = scene.find_object("cube").unwrap();
        assert!(scene.find_object("sphere").is_none());

        let ee = scene.end_effector_position().unwrap();
        assert!(scene.sphere_blocked(&ee, 0.15, arm_params.obstacle_layer));

        let mut grasp = GraspState::default();
        grasp.force_grab(cube, &arm_params, &mut scene).unwrap();
        assert_eq!(scene.attached_to(cube), Some(AttachPoint::GripPoint));
        assert_eq!(scene.is_kinematic(cube), Some(true));
        assert_eq!(
            scene.attached_orientation_deg(cube),
            Some(Vector3::new(90.0, 0.0, 0.0))
        );

        // Held bodies don't block the arm
        assert!(!scene.sphere_blocked(&ee, 0.15, arm_params.obstacle_layer));

        AngleState::from_array([0.0, 90.0, 0.0, 0.0, 0.0, 0.0]).apply(&mut scene);
        assert_near(
            scene.object_position(cube).unwrap(),
            Vector3::new(0.0, 0.5, 2.8),
        );

        // Released bodies stay where they were let go
        grasp.release(&mut scene).unwrap();
        AngleState::default().apply(&mut scene);
        assert_near(
            scene.object_position(cube).unwrap(),
            Vector3::new(0.0, 0.5, 2.8),
        );
        assert_eq!(scene.is_kinematic(cube), Some(false));
        assert_eq!(scene.attached_to(cube), None);
    }

    #[test]
    fn test_sphere_overlaps_sorted() {
        let mask = LayerMask::layer(4);
        let params = Params {
            bodies: vec![
                body("far", [0.0, 3.3, 0.25], Shape::Sphere { radius_m: 0.05 }, mask),
                body("near", [0.0, 3.3, 0.1], Shape::Sphere { radius_m: 0.05 }, mask),
                body("out", [0.0, 3.3, 1.0], Shape::Sphere { radius_m: 0.05 }, mask),
            ],
            ..Params::default()
        };
        let scene = SimScene::new(params).unwrap();

        let ee = scene.end_effector_position().unwrap();
        let hits = scene.sphere_overlaps(&ee, 0.3, mask);

        assert_eq!(
            hits,
            vec![
                scene.find_object("near").unwrap(),
                scene.find_object("far").unwrap()
            ]
        );
        assert!(scene.sphere_overlaps(&ee, 0.3, LayerMask::layer(5)).is_empty());
    }

    #[test]
    fn test_invalid_scenes() {
        let dup = Params {
            bodies: vec![
                body("a", [0.0; 3], Shape::Sphere { radius_m: 0.1 }, LayerMask::ALL),
                body("a", [1.0; 3], Shape::Sphere { radius_m: 0.1 }, LayerMask::ALL),
            ],
            ..Params::default()
        };
        assert!(matches!(SimScene::new(dup), Err(SimError::DuplicateName(_))));

        let bad_shape = Params {
            bodies: vec![body("a", [0.0; 3], Shape::Sphere { radius_m: -0.1 }, LayerMask::ALL)],
            ..Params::default()
        };
        assert!(matches!(SimScene::new(bad_shape), Err(SimError::InvalidShape(_))));

        let bad_link = Params {
            forearm_m: std::f64::NAN,
            ..Params::default()
        };
        assert!(matches!(
            SimScene::new(bad_link),
            Err(SimError::InvalidLength("forearm_m", _))
        ));
    }

    #[test]
    fn test_params_file_loads() {
        let p: Params = util::params::from_toml_str(include_str!("../../../params/sim.toml")).unwrap();
        let scene = SimScene::new(p).unwrap();

        assert!(scene.find_object("cube").is_some());
        assert!(scene.find_object("drop_zone").is_some());
    }
}
