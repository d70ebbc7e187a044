//! # Garden Humidity Library
//!
//! Record soil humidity sensor telemetry from a serial device.
//!
//! This library provides the stream-to-archive pipeline: synchronizing on the
//! sensor's binary stream, decoding fixed-width records and writing them to
//! hourly ZIP archives of CSV rows.

pub mod archive;
pub mod clock;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod protocol;
pub mod reading;
pub mod rotation;
pub mod serial;
