//! FILETIME conversion: 100-nanosecond ticks since 1601-01-01 UTC.

use chrono::{DateTime, TimeZone, Utc};

/// Ticks between 1601-01-01 and the Unix epoch.
const EPOCH_DELTA: i64 = 116_444_736_000_000_000;
const TICKS_PER_SECOND: i64 = 10_000_000;

/// Convert a FILETIME to an instant. Zero means "unset" and yields `None`.
pub fn filetime_to_datetime(filetime: u64) -> Option<DateTime<Utc>> {
    if filetime == 0 {
        return None;
    }
    let relative = filetime as i64 - EPOCH_DELTA;
    let seconds = relative.div_euclid(TICKS_PER_SECOND);
    let nanos = (relative.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
    Utc.timestamp_opt(seconds, nanos).single()
}

/// Convert an instant to a FILETIME.
pub fn datetime_to_filetime(instant: &DateTime<Utc>) -> u64 {
    let ticks = instant.timestamp() * TICKS_PER_SECOND
        + i64::from(instant.timestamp_subsec_nanos()) / 100
        + EPOCH_DELTA;
    ticks.max(0) as u64
}

/// Decode an 8-byte little-endian FILETIME column value.
pub fn filetime_from_bytes(bytes: &[u8]) -> Option<DateTime<Utc>> {
    let raw: [u8; 8] = bytes.try_into().ok()?;
    filetime_to_datetime(u64::from_le_bytes(raw))
}

/// The current instant as a FILETIME.
pub fn filetime_now() -> u64 {
    datetime_to_filetime(&Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_value() {
        // 0x01D706E500000000 = 16_137_558_647_996_416 ticks past the Unix
        // epoch, a February 2021 Exchange timestamp.
        let instant = filetime_to_datetime(0x01D7_06E5_0000_0000).unwrap();
        assert_eq!(instant.timestamp(), 1_613_755_864);
        assert_eq!(instant.date_naive().to_string(), "2021-02-19");
    }

    #[test]
    fn test_zero_is_unset() {
        assert_eq!(filetime_to_datetime(0), None);
        assert_eq!(filetime_from_bytes(&[0; 8]), None);
    }

    #[test]
    fn test_round_trip_second_aligned() {
        for timestamp in [0_i64, 1, 1_613_952_000, 253_402_300_799] {
            let instant = Utc.timestamp_opt(timestamp, 0).single().unwrap();
            let filetime = datetime_to_filetime(&instant);
            assert_eq!(filetime_to_datetime(filetime), Some(instant));
        }
    }

    #[test]
    fn test_truncated_bytes_rejected() {
        assert_eq!(filetime_from_bytes(&[1, 2, 3]), None);
    }
}
