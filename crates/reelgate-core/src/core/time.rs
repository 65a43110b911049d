// crates/reelgate-core/src/core/time.rs
// ============================================================================
// Module: Reelgate Time Model
// Description: Canonical UTC timestamps for history entries and manifests.
// Purpose: Provide deterministic, replayable time values across Reelgate records.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Reelgate writes timestamps as second-precision UTC with a `Z` suffix
//! (`2026-01-01T12:00:00Z`) and accepts any RFC 3339 value on read. The core
//! never reads wall-clock time directly; hosts supply timestamps on every
//! request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de;
use thiserror::Error;
use time::OffsetDateTime;
use time::UtcOffset;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Timestamp parse or construction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid timestamp {value}: {message}")]
pub struct TimestampError {
    /// Offending input.
    pub value: String,
    /// Parser message.
    pub message: String,
}

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Second-precision UTC timestamp.
///
/// # Invariants
/// - Always normalized to UTC with sub-second precision dropped.
/// - Values are explicitly provided by callers; the core never reads wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcTimestamp(OffsetDateTime);

impl UtcTimestamp {
    /// Normalizes an arbitrary date-time to a UTC timestamp.
    #[must_use]
    pub fn from_datetime(value: OffsetDateTime) -> Self {
        let utc = value.to_offset(UtcOffset::UTC);
        Self(utc.replace_nanosecond(0).unwrap_or(utc))
    }

    /// Builds a timestamp from unix seconds.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError`] when the value is out of range.
    pub fn from_unix_seconds(seconds: i64) -> Result<Self, TimestampError> {
        OffsetDateTime::from_unix_timestamp(seconds).map(Self).map_err(|err| TimestampError {
            value: seconds.to_string(),
            message: err.to_string(),
        })
    }

    /// Parses an RFC 3339 timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError`] when the value is not valid RFC 3339.
    pub fn parse(value: &str) -> Result<Self, TimestampError> {
        OffsetDateTime::parse(value.trim(), &Rfc3339).map(Self::from_datetime).map_err(|err| {
            TimestampError {
                value: value.to_string(),
                message: err.to_string(),
            }
        })
    }

    /// Returns true when `value` is already in canonical `Z` form.
    #[must_use]
    pub fn is_canonical(value: &str) -> bool {
        Self::parse(value).is_ok_and(|parsed| parsed.to_string() == value)
    }

    /// Returns the compact form used for default release identifiers.
    #[must_use]
    pub fn compact(&self) -> String {
        let format = format_description!("[year][month][day]T[hour][minute][second]Z");
        self.0.format(&format).unwrap_or_default()
    }

    /// Returns seconds since the unix epoch.
    #[must_use]
    pub const fn unix_seconds(&self) -> i64 {
        self.0.unix_timestamp()
    }
}

impl fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");
        let rendered = self.0.format(&format).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

impl Serialize for UtcTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UtcTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(de::Error::custom)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use super::*;

    #[test]
    fn renders_second_precision_z_form() {
        let ts = UtcTimestamp::parse("2026-03-04T05:06:07.891+02:00").unwrap();
        assert_eq!(ts.to_string(), "2026-03-04T03:06:07Z");
        assert_eq!(ts.compact(), "20260304T030607Z");
    }

    #[test]
    fn canonical_check_requires_z_form() {
        assert!(UtcTimestamp::is_canonical("2026-01-01T00:00:00Z"));
        assert!(!UtcTimestamp::is_canonical("2026-01-01T00:00:00+00:00"));
        assert!(!UtcTimestamp::is_canonical("yesterday"));
    }

    #[test]
    fn orders_chronologically() {
        let early = UtcTimestamp::from_unix_seconds(10).unwrap();
        let late = UtcTimestamp::from_unix_seconds(20).unwrap();
        assert!(early < late);
    }

    #[test]
    fn serde_round_trips_through_string() {
        let ts = UtcTimestamp::from_unix_seconds(0).unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"1970-01-01T00:00:00Z\"");
        let back: UtcTimestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }
}
