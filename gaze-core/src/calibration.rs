#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A raw camera calibration message as delivered by the calibration feed.
///
/// `k` is the 3×3 intrinsic projection matrix in row-major order:
///
/// ```text
/// fx  0 cx
///  0 fy cy
///  0  0  1
/// ```
///
/// This type is deliberately dumb. It carries exactly what was received;
/// decoding it into usable intrinsics is the camera model's job.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraCalibration {
    pub k: [f64; 9],
}

impl CameraCalibration {
    /// Builds a calibration message from the four pinhole parameters,
    /// filling in the constant entries of the matrix.
    pub fn from_pinhole(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self {
            k: [fx, 0.0, cx, 0.0, fy, cy, 0.0, 0.0, 1.0],
        }
    }
}
