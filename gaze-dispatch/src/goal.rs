use gaze_core::nalgebra::Vector3;
use gaze_core::OpticalPoint;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// A 3d point tagged with the reference frame it is expressed in and the
/// wall-clock time of the click that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampedPoint {
    pub frame_id: String,
    pub stamp: SystemTime,
    pub point: OpticalPoint,
}

/// The goal message submitted to the head controller: "rotate the head so
/// that `pointing_axis` (in the head's own frame) aims at `target`".
///
/// `min_duration` and `max_velocity` bound the motion; they are fixed
/// configuration, not derived per goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointGoal {
    pub pointing_frame: String,
    pub pointing_axis: Vector3<f64>,
    pub target: StampedPoint,
    pub min_duration: Duration,
    pub max_velocity: f64,
}

/// The fixed per-goal constants, set once at startup.
#[derive(Debug, Clone)]
pub struct GoalConfig {
    /// Optical frame of the camera; used both as the pointing frame and
    /// as the target's reference frame.
    pub camera_frame: String,
    /// Lower bound on the motion duration in seconds.
    pub min_duration: Duration,
    /// Upper bound on the angular velocity in radians per second.
    pub max_velocity: f64,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            camera_frame: "stereo_optical_frame".into(),
            min_duration: Duration::from_millis(500),
            max_velocity: 1.0,
        }
    }
}

impl GoalConfig {
    /// Builds a fresh goal aiming the head's forward axis at `target`,
    /// stamped with the current wall-clock time.
    pub fn goal(&self, target: OpticalPoint) -> PointGoal {
        PointGoal {
            pointing_frame: self.camera_frame.clone(),
            // The head's forward (camera-bearing) axis.
            pointing_axis: Vector3::new(0.0, 0.0, 1.0),
            target: StampedPoint {
                frame_id: self.camera_frame.clone(),
                stamp: SystemTime::now(),
                point: target,
            },
            min_duration: self.min_duration,
            max_velocity: self.max_velocity,
        }
    }
}
