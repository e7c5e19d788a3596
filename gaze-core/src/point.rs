use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use nalgebra::{Point3, Unit, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A 3d point relative to the camera's optical center and orientation,
/// where positive X is right, positive Y is down, and positive Z is
/// forwards out of the lens.
///
/// The unit of distance is unspecified; a pointing target produced by
/// deprojecting a pixel carries direction information only, with its Z
/// fixed at an arbitrary assumed depth.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct OpticalPoint(pub Point3<f64>);

impl OpticalPoint {
    /// The unit direction from the optical center towards this point.
    pub fn bearing(self) -> Unit<Vector3<f64>> {
        Unit::new_normalize(self.0.coords)
    }
}
