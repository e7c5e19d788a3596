//! # gaze-core
//!
//! Core abstractions and types shared by the gaze pointing stack. Every
//! crate that produces or consumes pixel selections, optical-frame points,
//! or raw camera calibration depends on this crate, so it is kept very
//! small and `#![no_std]`.
//!
//! The coordinate conventions follow the usual computer-vision ones: on an
//! image, X points right and Y points down; in the camera's optical frame,
//! X points right, Y points down, and Z points forwards out of the lens.

#![no_std]

mod calibration;
mod point;
mod selection;

pub use calibration::*;
pub use nalgebra;
pub use point::*;
pub use selection::*;
