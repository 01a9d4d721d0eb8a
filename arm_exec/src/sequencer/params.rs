//! Parameters structure for the pick and place sequence

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the pick and place sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Height above the object and drop zone the arm hovers at before
    /// descending.
    ///
    /// Units: meters
    pub hover_height_m: f64,

    /// Pause after reaching the object or drop zone, and after grabbing or
    /// releasing.
    ///
    /// Units: seconds
    pub settle_time_s: f64,

    /// Pause after the presentation poses.
    ///
    /// Units: seconds
    pub present_settle_time_s: f64,

    /// Poses the held object is shown in after it's lifted. The base keeps
    /// its current angle.
    pub present_poses: Vec<PresentPose>,
}

/// A pose used to present the held object.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PresentPose {
    /// Angles of the shoulder, elbow, wrist, mini elbow and gripper.
    ///
    /// Units: degrees
    pub angles_deg: [f64; 5],

    /// Units: seconds
    pub duration_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            hover_height_m: 0.5,
            settle_time_s: 0.5,
            present_settle_time_s: 0.2,
            present_poses: vec![
                PresentPose {
                    angles_deg: [-30.0, 45.0, 0.0, 45.0, 90.0],
                    duration_s: 1.0,
                },
                PresentPose {
                    angles_deg: [-30.0, 45.0, 0.0, 45.0, -90.0],
                    duration_s: 1.5,
                },
                PresentPose {
                    angles_deg: [-30.0, 45.0, 0.0, 45.0, 0.0],
                    duration_s: 0.5,
                },
            ],
        }
    }
}
