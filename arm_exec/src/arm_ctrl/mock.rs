//! Scripted scene used to test arm control without a simulator

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::{HashMap, HashSet};

use nalgebra::Vector3;

use arm_if::eqpt::scene::{
    AttachPoint, CollisionProbe, JointId, LayerMask, ObjectId, PoseApplier, SceneAttach,
    SceneError,
};
use util::maths::rem_euclid;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A scene whose collision answers are scripted by the test.
pub(crate) struct MockScene {
    /// Last orientation set on each joint
    eulers: HashMap<JointId, Vector3<f64>>,

    /// Joints which behave as if they are missing from the scene
    unbound: HashSet<JointId>,

    /// Number of calls to `set_joint_orientation` that succeeded
    pub apply_count: usize,

    /// Decides whether the arm's links collide, given the current joint
    /// angles of the scene.
    pub link_collision: fn(&MockScene) -> bool,

    /// Answer given to every segment query
    pub segment_blocked: bool,

    pub root_m: Vector3<f64>,

    pub end_effector_m: Option<Vector3<f64>>,

    pub objects: HashMap<ObjectId, MockObject>,
}

#[derive(Debug, Clone)]
pub(crate) struct MockObject {
    pub position_m: Vector3<f64>,
    pub kinematic: Option<bool>,
    pub attached_to: Option<AttachPoint>,
    pub local_orientation_deg: Vector3<f64>,
    pub layer: LayerMask,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MockScene {
    pub fn new() -> Self {
        Self {
            eulers: HashMap::new(),
            unbound: HashSet::new(),
            apply_count: 0,
            link_collision: |_| false,
            segment_blocked: false,
            root_m: Vector3::zeros(),
            end_effector_m: Some(Vector3::new(0.0, 3.0, 0.0)),
            objects: HashMap::new(),
        }
    }

    /// Make a joint behave as if it's missing from the scene.
    pub fn unbind(&mut self, joint: JointId) {
        self.unbound.insert(joint);
        self.eulers.remove(&joint);
    }

    /// The raw angle last set on a joint.
    pub fn joint_angle(&self, joint: JointId) -> Option<f64> {
        self.eulers
            .get(&joint)
            .map(|e| joint.angle_from_euler_deg(e))
    }

    /// The raw angle of a joint, or zero if it was never set.
    pub fn angle_or_zero(&self, joint: JointId) -> f64 {
        self.joint_angle(joint).unwrap_or(0.0)
    }

    /// Add an object to the scene.
    pub fn add_object(
        &mut self,
        id: u32,
        position_m: Vector3<f64>,
        kinematic: Option<bool>,
        layer: LayerMask,
    ) -> ObjectId {
        let id = ObjectId(id);
        self.objects.insert(
            id,
            MockObject {
                position_m,
                kinematic,
                attached_to: None,
                local_orientation_deg: Vector3::zeros(),
                layer,
            },
        );
        id
    }

    fn object_mut(&mut self, object: ObjectId) -> Result<&mut MockObject, SceneError> {
        self.objects
            .get_mut(&object)
            .ok_or(SceneError::UnknownObject(object))
    }
}

impl CollisionProbe for MockScene {
    fn segment_blocked(&self, _a_m: &Vector3<f64>, _b_m: &Vector3<f64>, _mask: LayerMask) -> bool {
        self.segment_blocked
    }

    fn sphere_blocked(&self, _centre_m: &Vector3<f64>, _radius_m: f64, _mask: LayerMask) -> bool {
        (self.link_collision)(self)
    }

    fn capsule_blocked(
        &self,
        _a_m: &Vector3<f64>,
        _b_m: &Vector3<f64>,
        _radius_m: f64,
        _mask: LayerMask,
    ) -> bool {
        (self.link_collision)(self)
    }

    fn sphere_overlaps(
        &self,
        centre_m: &Vector3<f64>,
        radius_m: f64,
        mask: LayerMask,
    ) -> Vec<ObjectId> {
        let mut hits: Vec<(f64, ObjectId)> = self
            .objects
            .iter()
            .filter(|(_, o)| o.layer.intersects(mask))
            .map(|(id, o)| ((o.position_m - centre_m).norm(), *id))
            .filter(|(d, _)| *d <= radius_m)
            .collect();

        hits.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        hits.into_iter().map(|(_, id)| id).collect()
    }
}

impl PoseApplier for MockScene {
    fn set_joint_orientation(
        &mut self,
        joint: JointId,
        local_euler_deg: Vector3<f64>,
    ) -> Result<(), SceneError> {
        if self.unbound.contains(&joint) {
            return Err(SceneError::UnboundJoint(joint));
        }

        self.eulers.insert(joint, local_euler_deg);
        self.apply_count += 1;
        Ok(())
    }

    fn joint_orientation(&self, joint: JointId) -> Option<Vector3<f64>> {
        if self.unbound.contains(&joint) {
            return None;
        }

        let e = self.eulers.get(&joint).copied().unwrap_or_else(Vector3::zeros);
        Some(e.map(|c| rem_euclid(c, 360.0)))
    }

    fn joint_position(&self, joint: JointId) -> Option<Vector3<f64>> {
        if self.unbound.contains(&joint) {
            return None;
        }

        Some(self.root_m + Vector3::new(0.0, joint.index() as f64 * 0.5, 0.0))
    }

    fn end_effector_position(&self) -> Option<Vector3<f64>> {
        self.end_effector_m
    }

    fn root_position(&self) -> Vector3<f64> {
        self.root_m
    }

    fn translate_root(&mut self, delta_m: Vector3<f64>) {
        self.root_m += delta_m;
        if let Some(ref mut ee) = self.end_effector_m {
            *ee += delta_m;
        }
    }
}

impl SceneAttach for MockScene {
    fn attach(
        &mut self,
        object: ObjectId,
        parent: AttachPoint,
        local_offset_m: Vector3<f64>,
        local_orientation_deg: Vector3<f64>,
    ) -> Result<(), SceneError> {
        let ee = self.end_effector_m.unwrap_or(self.root_m);
        let obj = self.object_mut(object)?;

        obj.attached_to = Some(parent);
        obj.position_m = ee + local_offset_m;
        obj.local_orientation_deg = local_orientation_deg;
        Ok(())
    }

    fn detach(&mut self, object: ObjectId) -> Result<(), SceneError> {
        self.object_mut(object)?.attached_to = None;
        Ok(())
    }

    fn set_kinematic(&mut self, object: ObjectId, kinematic: bool) -> Result<(), SceneError> {
        let obj = self.object_mut(object)?;

        match obj.kinematic {
            Some(_) => {
                obj.kinematic = Some(kinematic);
                Ok(())
            }
            None => Err(SceneError::NoBody(object)),
        }
    }

    fn is_kinematic(&self, object: ObjectId) -> Option<bool> {
        self.objects.get(&object).and_then(|o| o.kinematic)
    }

    fn object_position(&self, object: ObjectId) -> Option<Vector3<f64>> {
        self.objects.get(&object).map(|o| o.position_m)
    }
}
