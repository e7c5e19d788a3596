use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use nalgebra::Point2;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Allows the retrieval of the position on the image a selection refers to.
pub trait ImagePoint {
    /// Retrieves the point on the image.
    fn image_point(&self) -> Point2<f64>;
}

/// A pixel the operator selected on the live image, in raw pixel
/// coordinates. The selection is neither undistorted nor normalized;
/// feed it through a camera model to obtain an optical-frame bearing.
///
/// Clicks arrive as integer coordinates, but the selection is stored as
/// real-valued since the camera model operates on reals.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct PixelSelection(pub Point2<f64>);

impl PixelSelection {
    /// Creates a selection from integer click coordinates.
    pub fn from_click(u: u32, v: u32) -> Self {
        Self(Point2::new(f64::from(u), f64::from(v)))
    }
}

impl ImagePoint for PixelSelection {
    fn image_point(&self) -> Point2<f64> {
        self.0
    }
}
