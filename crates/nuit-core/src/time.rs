//! Canonical broadcast timestamps.
//!
//! Tracks are keyed by whole epoch seconds so that two extractions of the
//! same entry always collide exactly, whatever page they came from. Delays
//! and pagination steps are applied to the epoch value, never to the wall
//! clock, so a DST change inside the night cannot produce a local time that
//! does not exist.

use chrono::{Duration, Local, LocalResult, NaiveDateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, ScrapeError};

/// Longest stretch of wall-clock time a DST gap can swallow.
const MAX_GAP_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Sentinel used while nothing has been collected yet.
    pub const EPOCH: Timestamp = Timestamp(0);

    pub fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    pub fn secs(self) -> i64 {
        self.0
    }

    /// Interpret a wall-clock time in the local timezone.
    ///
    /// Repeated times (DST fall-back) take the first pass. Skipped times
    /// (DST spring-forward) resolve to the first instant after the gap.
    pub fn from_local(dt: NaiveDateTime) -> Result<Self> {
        match Local.from_local_datetime(&dt) {
            LocalResult::Single(t) => Ok(Self(t.timestamp())),
            LocalResult::Ambiguous(first, _) => Ok(Self(first.timestamp())),
            LocalResult::None => Self::after_gap(dt),
        }
    }

    /// Like [`Timestamp::from_local`], but a repeated time takes the latest
    /// pass that is not after `reference`. Pages list tracks aired before
    /// the time they were requested for, so the request instant tells which
    /// pass an `HH:MM` belongs to.
    pub fn from_local_before(dt: NaiveDateTime, reference: Timestamp) -> Result<Self> {
        match Local.from_local_datetime(&dt) {
            LocalResult::Ambiguous(first, second) => {
                let second = second.timestamp();
                if second <= reference.0 {
                    Ok(Self(second))
                } else {
                    Ok(Self(first.timestamp()))
                }
            }
            _ => Self::from_local(dt),
        }
    }

    fn after_gap(dt: NaiveDateTime) -> Result<Self> {
        let minute = dt.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(dt);
        for step in 1..=MAX_GAP_MINUTES {
            let probe = minute
                .checked_add_signed(Duration::minutes(step))
                .ok_or(ScrapeError::LocalTime(dt))?;
            if let Some(t) = Local.from_local_datetime(&probe).earliest() {
                return Ok(Self(t.timestamp()));
            }
        }
        Err(ScrapeError::LocalTime(dt))
    }

    pub fn to_local(self) -> Result<NaiveDateTime> {
        Local
            .timestamp_opt(self.0, 0)
            .earliest()
            .map(|t| t.naive_local())
            .ok_or(ScrapeError::TimestampRange(self.0))
    }

    /// `self + minutes`, as elapsed time.
    pub fn plus_minutes(self, minutes: i64) -> Result<Self> {
        minutes
            .checked_mul(60)
            .and_then(|secs| self.0.checked_add(secs))
            .map(Self)
            .ok_or(ScrapeError::TimestampRange(self.0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
