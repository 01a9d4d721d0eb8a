//! Tracking of the object held by the gripper

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use nalgebra::Vector3;
use serde::Serialize;

// Internal
use super::Params;
use arm_if::eqpt::scene::{AttachPoint, ObjectId, Scene, SceneError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The gripper's hold on scene objects. At most one object is held.
#[derive(Debug, Clone, Default)]
pub struct GraspState {
    held: Option<HeldObject>,
}

/// An object held by the gripper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeldObject {
    pub object: ObjectId,

    /// The object's kinematic flag before it was grabbed, restored on
    /// release. `None` if the object has no physics body.
    pub was_kinematic: Option<bool>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl GraspState {
    /// The currently held object, if any.
    pub fn held(&self) -> Option<ObjectId> {
        self.held.map(|h| h.object)
    }

    /// Attach the object to the grip point regardless of how close it is.
    ///
    /// If another object is already held it is released first. Grabbing the
    /// held object again only re-applies the grasp pose.
    pub fn force_grab<S>(
        &mut self,
        object: ObjectId,
        params: &Params,
        scene: &mut S,
    ) -> Result<(), SceneError>
    where
        S: Scene + ?Sized,
    {
        if scene.object_position(object).is_none() {
            return Err(SceneError::UnknownObject(object));
        }

        match self.held {
            Some(h) if h.object == object => {
                debug!("{:?} is already held, re-applying the grasp pose", object);
                return Self::attach_to_grip(object, params, scene);
            }
            Some(h) => {
                info!("Releasing {:?} to grab {:?}", h.object, object);
                self.release(scene)?;
            }
            None => (),
        }

        let was_kinematic = scene.is_kinematic(object);
        match was_kinematic {
            Some(_) => scene.set_kinematic(object, true)?,
            None => debug!("{:?} has no physics body, attaching anyway", object),
        }

        Self::attach_to_grip(object, params, scene)?;

        self.held = Some(HeldObject {
            object,
            was_kinematic,
        });
        info!("Grabbed {:?}", object);

        Ok(())
    }

    /// Release the held object, restoring its kinematic flag and detaching it
    /// from the gripper.
    ///
    /// Returns the released object, or `None` if nothing was held.
    pub fn release<S>(&mut self, scene: &mut S) -> Result<Option<ObjectId>, SceneError>
    where
        S: Scene + ?Sized,
    {
        let held = match self.held.take() {
            Some(h) => h,
            None => return Ok(None),
        };

        if let Some(kinematic) = held.was_kinematic {
            scene.set_kinematic(held.object, kinematic)?;
        }
        scene.detach(held.object)?;

        info!("Released {:?}", held.object);

        Ok(Some(held.object))
    }

    fn attach_to_grip<S>(object: ObjectId, params: &Params, scene: &mut S) -> Result<(), SceneError>
    where
        S: Scene + ?Sized,
    {
        scene.attach(
            object,
            AttachPoint::GripPoint,
            Vector3::from(params.grasp_offset_m),
            Vector3::from(params.grasp_orientation_deg),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::arm_ctrl::mock::MockScene;
    use arm_if::eqpt::scene::{LayerMask, SceneAttach};

    fn scene_with_two_cubes() -> (MockScene, ObjectId, ObjectId) {
        let mut scene = MockScene::new();
        let a = scene.add_object(1, Vector3::new(0.0, 0.0, 1.0), Some(false), LayerMask::layer(4));
        let b = scene.add_object(2, Vector3::new(1.0, 0.0, 1.0), Some(true), LayerMask::layer(4));
        (scene, a, b)
    }

    #[test]
    fn test_grab_and_release() {
        let params = Params::default();
        let (mut scene, a, _) = scene_with_two_cubes();
        let mut grasp = GraspState::default();

        grasp.force_grab(a, &params, &mut scene).unwrap();
        assert_eq!(grasp.held(), Some(a));
        assert_eq!(scene.is_kinematic(a), Some(true));
        assert_eq!(scene.objects[&a].attached_to, Some(AttachPoint::GripPoint));
        assert_eq!(
            scene.objects[&a].local_orientation_deg,
            Vector3::new(90.0, 0.0, 0.0)
        );

        assert_eq!(grasp.release(&mut scene).unwrap(), Some(a));
        assert_eq!(grasp.held(), None);
        assert_eq!(scene.is_kinematic(a), Some(false));
        assert_eq!(scene.objects[&a].attached_to, None);
    }

    #[test]
    fn test_double_grab_replaces() {
        let params = Params::default();
        let (mut scene, a, b) = scene_with_two_cubes();
        let mut grasp = GraspState::default();

        grasp.force_grab(a, &params, &mut scene).unwrap();
        grasp.force_grab(b, &params, &mut scene).unwrap();

        assert_eq!(grasp.held(), Some(b));

        // The first object is let go with its physics restored
        assert_eq!(scene.objects[&a].attached_to, None);
        assert_eq!(scene.is_kinematic(a), Some(false));
        assert_eq!(scene.objects[&b].attached_to, Some(AttachPoint::GripPoint));

        // b was kinematic before the grab and stays so after release
        grasp.release(&mut scene).unwrap();
        assert_eq!(scene.is_kinematic(b), Some(true));
    }

    #[test]
    fn test_regrab_same_object() {
        let params = Params::default();
        let (mut scene, a, _) = scene_with_two_cubes();
        let mut grasp = GraspState::default();

        grasp.force_grab(a, &params, &mut scene).unwrap();
        grasp.force_grab(a, &params, &mut scene).unwrap();
        assert_eq!(grasp.held(), Some(a));

        // The original kinematic flag is still the one restored
        grasp.release(&mut scene).unwrap();
        assert_eq!(scene.is_kinematic(a), Some(false));
    }

    #[test]
    fn test_release_with_nothing_held() {
        let (mut scene, _, _) = scene_with_two_cubes();
        let mut grasp = GraspState::default();

        assert_eq!(grasp.release(&mut scene).unwrap(), None);
    }

    #[test]
    fn test_grab_unknown_and_bodiless_objects() {
        let params = Params::default();
        let (mut scene, _, _) = scene_with_two_cubes();
        let ghost = scene.add_object(3, Vector3::zeros(), None, LayerMask::layer(4));
        let mut grasp = GraspState::default();

        assert_eq!(
            grasp.force_grab(ObjectId(99), &params, &mut scene),
            Err(SceneError::UnknownObject(ObjectId(99)))
        );
        assert_eq!(grasp.held(), None);

        grasp.force_grab(ghost, &params, &mut scene).unwrap();
        assert_eq!(grasp.held(), Some(ghost));
        assert_eq!(grasp.release(&mut scene).unwrap(), Some(ghost));
    }
}
