//! # Scene interfaces
//!
//! The arm does not own its physical world. Joint transforms, collision
//! queries and the objects it can pick up all live in a scene provided by the
//! host (a simulator, a renderer's scene graph or the real hardware). This
//! module defines the traits the arm control software uses to talk to that
//! scene.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// The number of joints on the arm.
pub const NUM_JOINTS: usize = 6;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Identifier of an object in the scene which the arm can interact with.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

/// A set of collision layers, one bit per layer.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone, Default)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of the joints of the arm, from the base to the gripper.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum JointId {
    Base,
    Shoulder,
    Elbow,
    Wrist,
    MiniElbow,
    Gripper,
}

/// The local axis a joint rotates about.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Copy, Clone)]
pub enum JointAxis {
    /// Rotation about the joint's local vertical axis (Euler Y)
    Yaw,

    /// Rotation about the joint's local lateral axis (Euler X)
    Pitch,
}

/// A point in the arm an object can be attached to.
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Copy, Clone)]
pub enum AttachPoint {
    /// The gripper's grip point, at the end effector
    GripPoint,

    /// The origin of one of the arm's joints
    Joint(JointId),
}

/// Errors reported by a scene.
#[derive(Debug, Error, Eq, PartialEq, Clone, Copy)]
pub enum SceneError {
    #[error("Joint {0:?} is not bound to a transform in the scene")]
    UnboundJoint(JointId),

    #[error("Object {0:?} does not exist in the scene")]
    UnknownObject(ObjectId),

    #[error("Object {0:?} has no physics body")]
    NoBody(ObjectId),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Collision and overlap queries against the scene's layers.
pub trait CollisionProbe {
    /// Returns true if the straight segment from `a_m` to `b_m` intersects
    /// anything on the layers in `mask`.
    fn segment_blocked(&self, a_m: &Vector3<f64>, b_m: &Vector3<f64>, mask: LayerMask) -> bool;

    /// Returns true if the sphere intersects anything on the layers in `mask`.
    fn sphere_blocked(&self, centre_m: &Vector3<f64>, radius_m: f64, mask: LayerMask) -> bool;

    /// Returns true if the capsule (the segment `a_m` to `b_m` swept by
    /// `radius_m`) intersects anything on the layers in `mask`.
    fn capsule_blocked(
        &self,
        a_m: &Vector3<f64>,
        b_m: &Vector3<f64>,
        radius_m: f64,
        mask: LayerMask,
    ) -> bool;

    /// Return all objects on the layers in `mask` which overlap the sphere,
    /// nearest first.
    fn sphere_overlaps(&self, centre_m: &Vector3<f64>, radius_m: f64, mask: LayerMask)
        -> Vec<ObjectId>;
}

/// Access to the transforms of the arm's joints.
pub trait PoseApplier {
    /// Set the local orientation of a joint, given as Euler angles in degrees
    /// (x = pitch, y = yaw, z = roll).
    fn set_joint_orientation(
        &mut self,
        joint: JointId,
        local_euler_deg: Vector3<f64>,
    ) -> Result<(), SceneError>;

    /// Read back the local orientation of a joint as Euler angles in degrees,
    /// each in the range [0, 360). `None` if the joint is not bound.
    fn joint_orientation(&self, joint: JointId) -> Option<Vector3<f64>>;

    /// World position of a joint's origin. `None` if the joint is not bound.
    fn joint_position(&self, joint: JointId) -> Option<Vector3<f64>>;

    /// World position of the end effector reference point.
    fn end_effector_position(&self) -> Option<Vector3<f64>>;

    /// World position of the arm's root (the point the base sits on).
    fn root_position(&self) -> Vector3<f64>;

    /// Move the arm's root by the given world-frame offset.
    fn translate_root(&mut self, delta_m: Vector3<f64>);
}

/// Reparenting and physics control of scene objects.
pub trait SceneAttach {
    /// Attach an object to a point on the arm with the given local offset and
    /// orientation (Euler degrees).
    fn attach(
        &mut self,
        object: ObjectId,
        parent: AttachPoint,
        local_offset_m: Vector3<f64>,
        local_orientation_deg: Vector3<f64>,
    ) -> Result<(), SceneError>;

    /// Detach an object from whatever it is attached to, leaving it in place
    /// in the world.
    fn detach(&mut self, object: ObjectId) -> Result<(), SceneError>;

    /// Enable or disable kinematic control of an object. A kinematic object is
    /// not moved by the physics simulation.
    fn set_kinematic(&mut self, object: ObjectId, kinematic: bool) -> Result<(), SceneError>;

    /// Get the kinematic flag of an object, or `None` if it has no physics
    /// body.
    fn is_kinematic(&self, object: ObjectId) -> Option<bool>;

    /// World position of an object, or `None` if it doesn't exist.
    fn object_position(&self, object: ObjectId) -> Option<Vector3<f64>>;
}

/// Everything the arm controller needs from a scene.
pub trait Scene: CollisionProbe + PoseApplier + SceneAttach {}

impl<T> Scene for T where T: CollisionProbe + PoseApplier + SceneAttach {}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl JointId {
    /// All joints, ordered from the base to the gripper.
    pub const ALL: [JointId; NUM_JOINTS] = [
        JointId::Base,
        JointId::Shoulder,
        JointId::Elbow,
        JointId::Wrist,
        JointId::MiniElbow,
        JointId::Gripper,
    ];

    /// Index of the joint in [`JointId::ALL`].
    pub fn index(&self) -> usize {
        match self {
            JointId::Base => 0,
            JointId::Shoulder => 1,
            JointId::Elbow => 2,
            JointId::Wrist => 3,
            JointId::MiniElbow => 4,
            JointId::Gripper => 5,
        }
    }

    /// The axis this joint rotates about.
    pub fn axis(&self) -> JointAxis {
        match self {
            JointId::Base | JointId::Wrist | JointId::Gripper => JointAxis::Yaw,
            JointId::Shoulder | JointId::Elbow | JointId::MiniElbow => JointAxis::Pitch,
        }
    }

    /// Build the local Euler angles (degrees) for this joint at the given
    /// angle.
    pub fn local_euler_deg(&self, angle_deg: f64) -> Vector3<f64> {
        match self.axis() {
            JointAxis::Yaw => Vector3::new(0.0, angle_deg, 0.0),
            JointAxis::Pitch => Vector3::new(angle_deg, 0.0, 0.0),
        }
    }

    /// Extract this joint's angle from a set of local Euler angles (degrees).
    pub fn angle_from_euler_deg(&self, euler_deg: &Vector3<f64>) -> f64 {
        match self.axis() {
            JointAxis::Yaw => euler_deg.y,
            JointAxis::Pitch => euler_deg.x,
        }
    }
}

impl LayerMask {
    /// A mask matching no layers.
    pub const NONE: LayerMask = LayerMask(0);

    /// A mask matching every layer.
    pub const ALL: LayerMask = LayerMask(u32::MAX);

    /// A mask containing only the given layer (0 to 31).
    pub fn layer(index: u32) -> Self {
        LayerMask(1u32.checked_shl(index).unwrap_or(0))
    }

    /// Returns true if the two masks share any layer.
    pub fn intersects(&self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }
}
