//! Concrete `Detector` implementations shipped with the core.
//!
//! The locale-specific pattern catalog lives outside this crate; what is here
//! is the generic regex adapter and the compiler that turns configured custom
//! patterns into detectors.

pub mod compiler;
pub mod regex_detector;
