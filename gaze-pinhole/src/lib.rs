//! This crate provides the pinhole camera model used to turn a pixel the
//! operator selected into a real 3d direction in the camera's optical
//! frame, pointing towards where the light that hit that pixel came from.
//! It also provides [`IntrinsicsStore`], the one-shot holder that buffers
//! the camera's intrinsic parameters until the calibration feed has
//! delivered them.
//!
//! Deprojection is the exact inverse of the pinhole projection: closed
//! form, deterministic, and free of side effects, so it is safe to call
//! from anywhere once intrinsics are available.

mod store;

pub use store::*;

use gaze_core::nalgebra::{Matrix3, Point2, Point3, Vector2};
use gaze_core::{ImagePoint, OpticalPoint, PixelSelection};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Failure modes of the pinhole model and the intrinsics store.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum PinholeError {
    /// Intrinsics were requested before the calibration feed delivered
    /// them. Recoverable: wait for readiness and try again.
    #[error("camera intrinsics have not been received yet")]
    NotReady,
    /// The intrinsics carry a focal length that is zero, negative, or
    /// non-finite. Deprojecting through such a matrix would silently
    /// produce infinities, so it is rejected instead.
    #[error("degenerate camera focal lengths fx={fx} fy={fy}")]
    DegenerateFocals { fx: f64, fy: f64 },
}

/// This contains intrinsic camera parameters as per
/// [this Wikipedia page](https://en.wikipedia.org/wiki/Camera_resectioning#Intrinsic_parameters).
///
/// Skew and lens distortion are not modeled; the calibration feed this
/// stack consumes only ever reports the four pinhole parameters.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraIntrinsics {
    pub focals: Vector2<f64>,
    pub principal_point: Point2<f64>,
}

impl CameraIntrinsics {
    /// Creates camera intrinsics that would create an identity intrinsic
    /// matrix. This would imply that the pixel positions have an origin at
    /// `0,0`, the pixel distance unit is the focal length, and pixels are
    /// square.
    pub fn identity() -> Self {
        Self {
            focals: Vector2::new(1.0, 1.0),
            principal_point: Point2::new(0.0, 0.0),
        }
    }

    pub fn focals(self, focals: Vector2<f64>) -> Self {
        Self { focals, ..self }
    }

    pub fn focal(self, focal: f64) -> Self {
        Self {
            focals: Vector2::new(focal, focal),
            ..self
        }
    }

    pub fn principal_point(self, principal_point: Point2<f64>) -> Self {
        Self {
            principal_point,
            ..self
        }
    }

    #[rustfmt::skip]
    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.focals.x,  0.0,            self.principal_point.x,
            0.0,            self.focals.y,  self.principal_point.y,
            0.0,            0.0,            1.0,
        )
    }

    fn validate_focals(&self) -> Result<(), PinholeError> {
        let fx = self.focals.x;
        let fy = self.focals.y;
        if fx.is_finite() && fy.is_finite() && fx > 0.0 && fy > 0.0 {
            Ok(())
        } else {
            Err(PinholeError::DegenerateFocals { fx, fy })
        }
    }

    /// Takes in a point from an image in pixel coordinates and converts it
    /// to an [`OpticalPoint`] at the given forward `depth`, using the
    /// inverse pinhole model. Only the direction of the resulting point is
    /// meaningful to a pointing actuator; the depth is an arbitrary
    /// distance along the optical axis.
    ///
    /// Pixel coordinates are not range-checked against the image bounds;
    /// whatever produced the selection is responsible for that.
    ///
    /// ```
    /// use gaze_core::nalgebra::{Point2, Vector2};
    /// use gaze_core::PixelSelection;
    /// use gaze_pinhole::CameraIntrinsics;
    /// let intrinsics = CameraIntrinsics {
    ///     focals: Vector2::new(525.0, 525.0),
    ///     principal_point: Point2::new(320.0, 240.0),
    /// };
    /// // The principal point deprojects straight down the optical axis.
    /// let target = intrinsics
    ///     .deproject(PixelSelection::from_click(320, 240), 1.0)
    ///     .unwrap();
    /// assert_eq!(target.0, gaze_core::nalgebra::Point3::new(0.0, 0.0, 1.0));
    /// ```
    pub fn deproject<P>(&self, point: P, depth: f64) -> Result<OpticalPoint, PinholeError>
    where
        P: ImagePoint,
    {
        self.validate_focals()?;
        let centered = point.image_point() - self.principal_point;
        let x = centered.x / self.focals.x * depth;
        let y = centered.y / self.focals.y * depth;
        Ok(OpticalPoint(Point3::new(x, y, depth)))
    }

    /// Converts an [`OpticalPoint`] back into pixel coordinates, the
    /// forward pinhole projection. Fails if the point is not in front of
    /// the camera.
    ///
    /// ```
    /// use gaze_core::nalgebra::{Point2, Vector2};
    /// use gaze_core::PixelSelection;
    /// use gaze_pinhole::CameraIntrinsics;
    /// let intrinsics = CameraIntrinsics {
    ///     focals: Vector2::new(800.0, 900.0),
    ///     principal_point: Point2::new(500.0, 600.0),
    /// };
    /// let selection = PixelSelection::from_click(471, 322);
    /// let target = intrinsics.deproject(selection, 1.0).unwrap();
    /// let reprojected = intrinsics.project(target).unwrap();
    /// assert!((selection.0 - reprojected.0).norm() < 1e-9);
    /// ```
    pub fn project(&self, point: OpticalPoint) -> Option<PixelSelection> {
        if point.z <= 0.0 {
            return None;
        }
        let u = point.x / point.z * self.focals.x + self.principal_point.x;
        let v = point.y / point.z * self.focals.y + self.principal_point.y;
        Some(PixelSelection(Point2::new(u, v)))
    }
}
