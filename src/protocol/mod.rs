//! # Sensor Protocol Module
//!
//! Binary protocol spoken by the humidity sensor firmware.
//!
//! This module handles:
//! - Stream synchronization on the fixed sync marker
//! - Skipping the device header that follows the marker
//! - Decoding fixed-width 28-byte records into [`SensorReading`](crate::reading::SensorReading)

pub mod constants;
pub mod decoder;
pub mod sync;
