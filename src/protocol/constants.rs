//! # Sensor Protocol Constants
//!
//! Wire layout of the humidity sensor stream.

/// Marker emitted by the firmware before the record stream
pub const SYNC_MARKER: [u8; 6] = [0x9A, 0x16, 0x52, 0x76, 0xA8, 0x1B];

/// Device header following the sync marker (not interpreted)
pub const HEADER_SIZE: usize = 22;

/// Number of u16 fields per record
pub const RECORD_U16_FIELDS: usize = 8;

/// Number of leading u16 fields that are not part of the reading
pub const RECORD_SKIPPED_FIELDS: usize = 3;

/// Number of f32 fields per record
pub const RECORD_F32_FIELDS: usize = 3;

/// Record size on the wire: 8 × u16 + 3 × f32
pub const RECORD_SIZE: usize = RECORD_U16_FIELDS * 2 + RECORD_F32_FIELDS * 4;

/// Raw record buffer
pub type RawRecord = [u8; RECORD_SIZE];
