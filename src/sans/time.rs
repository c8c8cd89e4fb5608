//! Conversion of broken-down record timestamps to epoch microseconds.

use chrono::NaiveDate;

/// A broken-down timestamp as stored in a record.
///
/// The month is zero-based. The sub-second part is `subsecond` units of
/// `unit` microseconds each, so that milliseconds are carried with a `unit` of
/// 1000 and microseconds with a `unit` of 1.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CivilTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub subsecond: u32,
    pub unit: u32,
}

impl CivilTime {
    /// Build a timestamp from the one-based month stored in records.
    ///
    /// Returns `None` for a month of zero.
    pub(crate) fn from_record(
        year: u16,
        month: u8,
        [day, hour, minute, second]: [u8; 4],
        subsecond: u32,
        unit: u32,
    ) -> Option<Self> {
        Some(Self {
            year,
            month: month.checked_sub(1)?,
            day,
            hour,
            minute,
            second,
            subsecond,
            unit,
        })
    }
}

/// Convert broken-down timestamps to microseconds since an epoch.
///
/// Every time-bearing record passes through this trait, which lets
/// applications substitute their own time base.
pub trait EpochBuilder {
    /// Microseconds since the epoch, or `None` if the timestamp cannot be
    /// represented.
    fn epoch_micros(&self, t: &CivilTime) -> Option<u64>;
}

impl<E: EpochBuilder + ?Sized> EpochBuilder for &E {
    fn epoch_micros(&self, t: &CivilTime) -> Option<u64> {
        (**self).epoch_micros(t)
    }
}

/// Interpret timestamps as UTC, counting from the Unix epoch.
#[derive(Debug, Default, Clone, Copy)]
pub struct Utc;

impl EpochBuilder for Utc {
    fn epoch_micros(&self, t: &CivilTime) -> Option<u64> {
        let micros = NaiveDate::from_ymd_opt(t.year.into(), u32::from(t.month) + 1, t.day.into())?
            .and_hms_opt(t.hour.into(), t.minute.into(), t.second.into())?
            .and_utc()
            .timestamp_micros();

        let fraction = u64::from(t.subsecond).checked_mul(t.unit.into())?;

        u64::try_from(micros).ok()?.checked_add(fraction)
    }
}
