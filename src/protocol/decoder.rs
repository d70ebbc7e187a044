//! # Sensor Record Decoder
//!
//! Decodes 28-byte sensor records into [`SensorReading`]s.

use bytes::Buf;
use chrono::{DateTime, Utc};

use super::constants::*;
use crate::clock::Clock;
use crate::error::{HumidityError, Result};
use crate::reading::SensorReading;
use crate::serial::port_trait::ByteSource;

/// Decode a raw record
///
/// Layout (little-endian): 8 × u16 then 3 × f32. The first three integers
/// are firmware bookkeeping and are dropped.
///
/// # Arguments
///
/// * `record` - Raw record bytes
/// * `timestamp` - Capture time to stamp on the reading
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use garden_humidity::protocol::decoder::decode_record;
///
/// let reading = decode_record(&[0u8; 28], Utc::now());
/// assert_eq!(reading.pot_id, Some(0));
/// ```
pub fn decode_record(record: &RawRecord, timestamp: DateTime<Utc>) -> SensorReading {
    let mut buf = &record[..];

    buf.advance(RECORD_SKIPPED_FIELDS * 2);

    SensorReading {
        timestamp,
        pot_id: Some(buf.get_u16_le()),
        air_level: Some(buf.get_u16_le()),
        water_level: Some(buf.get_u16_le()),
        soil_humidity: Some(buf.get_u16_le()),
        soil_humidity_percent: Some(buf.get_u16_le()),
        air_temperature: Some(buf.get_f32_le()),
        air_humidity: Some(buf.get_f32_le()),
        heat_index: Some(buf.get_f32_le()),
    }
}

/// Read and decode the next record from the stream
///
/// The reading is stamped with `clock.now()` once all bytes have arrived.
///
/// # Errors
///
/// - `TruncatedRecord` if the source closes mid-record
/// - `Io` on any other read failure
pub async fn read_reading<S, C>(source: &mut S, clock: &C) -> Result<SensorReading>
where
    S: ByteSource + ?Sized,
    C: Clock + ?Sized,
{
    let mut record: RawRecord = [0u8; RECORD_SIZE];

    source.read_exact(&mut record).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            HumidityError::TruncatedRecord {
                expected: RECORD_SIZE,
                source: e,
            }
        } else {
            HumidityError::Io(e)
        }
    })?;

    Ok(decode_record(&record, clock.now()))
}

/// Encode a record the way the firmware does (test helper)
#[cfg(test)]
pub(crate) fn encode_record(ints: [u16; RECORD_U16_FIELDS], floats: [f32; RECORD_F32_FIELDS]) -> RawRecord {
    use bytes::BufMut;

    let mut out = Vec::with_capacity(RECORD_SIZE);
    for value in ints {
        out.put_u16_le(value);
    }
    for value in floats {
        out.put_f32_le(value);
    }

    let mut record = [0u8; RECORD_SIZE];
    record.copy_from_slice(&out);
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::serial::port_trait::mocks::MockByteSource;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, s).unwrap()
    }

    #[test]
    fn test_decode_field_mapping() {
        let record = encode_record(
            [0xDEAD, 0xBEEF, 0xCAFE, 7, 620, 280, 410, 61],
            [21.5, 48.25, 20.75],
        );
        let reading = decode_record(&record, at(12, 0, 0));

        assert_eq!(reading.timestamp, at(12, 0, 0));
        assert_eq!(reading.pot_id, Some(7));
        assert_eq!(reading.air_level, Some(620));
        assert_eq!(reading.water_level, Some(280));
        assert_eq!(reading.soil_humidity, Some(410));
        assert_eq!(reading.soil_humidity_percent, Some(61));
        assert_eq!(reading.air_temperature, Some(21.5));
        assert_eq!(reading.air_humidity, Some(48.25));
        assert_eq!(reading.heat_index, Some(20.75));
    }

    #[test]
    fn test_decode_discards_leading_integers() {
        let record = encode_record([0xDEAD, 0xBEEF, 0xCAFE, 1, 2, 3, 4, 5], [0.0; 3]);
        let reading = decode_record(&record, at(12, 0, 0));

        let ints = [
            reading.pot_id,
            reading.air_level,
            reading.water_level,
            reading.soil_humidity,
            reading.soil_humidity_percent,
        ];
        assert_eq!(ints, [Some(1), Some(2), Some(3), Some(4), Some(5)]);
        for discarded in [0xDEAD, 0xBEEF, 0xCAFE] {
            assert!(!ints.contains(&Some(discarded)));
        }
    }

    #[test]
    fn test_decode_little_endian() {
        let mut record = [0u8; RECORD_SIZE];
        // pot_id lives at byte offset 6
        record[6] = 0x34;
        record[7] = 0x12;
        let reading = decode_record(&record, at(12, 0, 0));
        assert_eq!(reading.pot_id, Some(0x1234));
    }

    #[tokio::test]
    async fn test_read_reading_stamps_clock_time() {
        let record = encode_record([0, 0, 0, 9, 1, 1, 1, 1], [1.0, 2.0, 3.0]);
        let mut source = MockByteSource::new(&record);

        let mut clock = MockClock::new();
        clock.expect_now().times(1).returning(|| at(12, 17, 45));

        let reading = read_reading(&mut source, &clock).await.unwrap();
        assert_eq!(reading.timestamp, at(12, 17, 45));
        assert_eq!(reading.pot_id, Some(9));
        assert_eq!(source.remaining(), 0);
    }

    #[tokio::test]
    async fn test_read_reading_consecutive_records() {
        let mut bytes = encode_record([0, 0, 0, 1, 0, 0, 0, 0], [0.0; 3]).to_vec();
        bytes.extend_from_slice(&encode_record([0, 0, 0, 2, 0, 0, 0, 0], [0.0; 3]));
        let mut source = MockByteSource::new(&bytes);

        let mut clock = MockClock::new();
        clock.expect_now().returning(|| at(12, 0, 0));

        assert_eq!(read_reading(&mut source, &clock).await.unwrap().pot_id, Some(1));
        assert_eq!(read_reading(&mut source, &clock).await.unwrap().pot_id, Some(2));
    }

    #[tokio::test]
    async fn test_read_reading_truncated() {
        let mut source = MockByteSource::new(&[0u8; RECORD_SIZE - 1]);
        let mut clock = MockClock::new();
        clock.expect_now().never();

        match read_reading(&mut source, &clock).await {
            Err(HumidityError::TruncatedRecord { expected, .. }) => assert_eq!(expected, 28),
            other => panic!("Expected TruncatedRecord, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_reading_io_error() {
        let mut source = MockByteSource::new(&[0u8; RECORD_SIZE]);
        source.set_read_error(std::io::ErrorKind::BrokenPipe);
        let clock = MockClock::new();

        assert!(matches!(
            read_reading(&mut source, &clock).await,
            Err(HumidityError::Io(_))
        ));
    }
}
