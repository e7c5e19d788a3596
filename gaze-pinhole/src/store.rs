use crate::{CameraIntrinsics, PinholeError};

use gaze_core::nalgebra::{Point2, Vector2};
use gaze_core::CameraCalibration;

/// One-shot holder for the camera intrinsics delivered by the calibration
/// feed.
///
/// The store starts empty and becomes ready on the first [`update`]; no
/// consumer may deproject before that. Repeated updates are accepted with
/// last-write-wins semantics, but the surrounding system only ever
/// consumes the first one and then detaches the feed, so intrinsics are
/// effectively immutable for the life of the process.
///
/// The store is plain owned state. Readiness is established before click
/// processing begins, so under the single dispatch loop there is no
/// update/read race to arbitrate. If the store is ever shared across
/// threads instead, wrap it in a lock or publish the snapshot with
/// acquire/release ordering.
///
/// [`update`]: IntrinsicsStore::update
#[derive(Debug, Clone, Default)]
pub struct IntrinsicsStore {
    intrinsics: Option<CameraIntrinsics>,
}

impl IntrinsicsStore {
    /// Creates an empty, not-ready store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a raw calibration message and stores the result.
    ///
    /// The message carries the row-major 3×3 intrinsic matrix, from which
    /// the pinhole parameters sit at fixed offsets: fx at 0, cx at 2,
    /// fy at 4, cy at 5.
    pub fn update(&mut self, calibration: &CameraCalibration) {
        self.intrinsics = Some(CameraIntrinsics {
            focals: Vector2::new(calibration.k[0], calibration.k[4]),
            principal_point: Point2::new(calibration.k[2], calibration.k[5]),
        });
    }

    /// Whether intrinsics have been received.
    pub fn is_ready(&self) -> bool {
        self.intrinsics.is_some()
    }

    /// Returns a snapshot of the intrinsics, or [`PinholeError::NotReady`]
    /// if no calibration has arrived yet.
    pub fn get(&self) -> Result<CameraIntrinsics, PinholeError> {
        self.intrinsics.ok_or(PinholeError::NotReady)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_is_not_ready() {
        let store = IntrinsicsStore::new();
        assert!(!store.is_ready());
        assert_eq!(store.get(), Err(PinholeError::NotReady));
    }

    #[test]
    fn update_extracts_pinhole_parameters() {
        let mut store = IntrinsicsStore::new();
        store.update(&CameraCalibration {
            k: [525.0, 0.0, 320.0, 0.0, 526.5, 240.0, 0.0, 0.0, 1.0],
        });
        assert!(store.is_ready());
        let intrinsics = store.get().unwrap();
        assert_eq!(intrinsics.focals, Vector2::new(525.0, 526.5));
        assert_eq!(intrinsics.principal_point, Point2::new(320.0, 240.0));
    }

    #[test]
    fn repeated_update_last_write_wins() {
        let mut store = IntrinsicsStore::new();
        store.update(&CameraCalibration::from_pinhole(500.0, 500.0, 300.0, 200.0));
        store.update(&CameraCalibration::from_pinhole(525.0, 525.0, 320.0, 240.0));
        let intrinsics = store.get().unwrap();
        assert_eq!(intrinsics.focals, Vector2::new(525.0, 525.0));
    }
}
