//! Run-scoped state: clock, cutoff date and counters
//!
//! A sync run observes one instant in a fixed civil timezone. That instant is
//! stamped on every record the run produces and drives the cutoff date used
//! to prune folders that were not modified recently.

use chrono::{
    DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
    Weekday,
};
use chrono_tz::Tz;
use serde::Serialize;

use super::errors::DomainError;

/// Days subtracted from today on a normal run day
const CUTOFF_LOOKBACK_DAYS: u64 = 3;

/// Days subtracted on Saturday, compensating for the weekend gap in the run schedule
const SATURDAY_LOOKBACK_DAYS: u64 = 2;

/// Computes the cutoff date for a run happening on `today`
///
/// Today minus three days, except minus two days on Saturday.
pub fn compute_cutoff(today: NaiveDate) -> NaiveDate {
    let lookback = if today.weekday() == Weekday::Sat {
        SATURDAY_LOOKBACK_DAYS
    } else {
        CUTOFF_LOOKBACK_DAYS
    };
    today
        .checked_sub_days(Days::new(lookback))
        .unwrap_or(NaiveDate::MIN)
}

/// The instant a run observes, fixed at service construction
#[derive(Debug, Clone)]
pub struct RunClock {
    timezone: Tz,
    now: DateTime<Tz>,
    cutoff: NaiveDate,
}

impl RunClock {
    /// Captures the current instant in the named IANA timezone
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidTimezone`] if the zone name is unknown
    pub fn now_in(timezone: &str) -> Result<Self, DomainError> {
        let tz = parse_timezone(timezone)?;
        Ok(Self::at(Utc::now().with_timezone(&tz)))
    }

    /// Builds a clock frozen at the given instant
    pub fn at(now: DateTime<Tz>) -> Self {
        Self {
            timezone: now.timezone(),
            cutoff: compute_cutoff(now.date_naive()),
            now,
        }
    }

    /// The run instant in the civil timezone
    pub fn now(&self) -> DateTime<Tz> {
        self.now
    }

    /// The run instant with its offset fixed, as stored on records
    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.now.with_timezone(&self.now.offset().fix())
    }

    /// The civil date of the run
    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// Folders last modified before this date are pruned in incremental mode
    pub fn cutoff(&self) -> NaiveDate {
        self.cutoff
    }

    /// The civil timezone of the run
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Returns true if a folder modified at `modified_at` is recent enough to visit
    ///
    /// The comparison uses the folder's civil date in the run timezone.
    pub fn is_on_or_after_cutoff(&self, modified_at: &DateTime<FixedOffset>) -> bool {
        modified_at.with_timezone(&self.timezone).date_naive() >= self.cutoff
    }

    /// Interprets a timezone-less wall-clock value in the run timezone
    pub fn localize(&self, naive: NaiveDateTime) -> DateTime<FixedOffset> {
        localize_in(self.timezone, naive)
    }

    /// Reads a stored run timestamp back as an instant
    ///
    /// A non-zero offset was written by this service and is kept as is, which
    /// keeps the repeated hour of a DST fall-back unambiguous. A zero offset
    /// marks a value stored without a zone; its wall-clock time is read in
    /// the run timezone.
    pub fn interpret_stored(&self, stored: &DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        if stored.offset().local_minus_utc() == 0 {
            self.localize(stored.naive_local())
        } else {
            *stored
        }
    }
}

/// Parses an IANA zone name such as `America/New_York`
pub fn parse_timezone(name: &str) -> Result<Tz, DomainError> {
    name.parse::<Tz>()
        .map_err(|_| DomainError::InvalidTimezone(name.to_string()))
}

/// Interprets a wall-clock value in `tz`
///
/// Ambiguous values (DST fall-back) resolve to the earlier instant; values in a
/// DST gap are read as UTC.
pub fn localize_in(tz: Tz, naive: NaiveDateTime) -> DateTime<FixedOffset> {
    let local = tz
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive));
    local.with_timezone(&local.offset().fix())
}

/// Per-run upload counters
///
/// Reset at the start of every `sync()` call so a long-lived service does not
/// leak totals from a previous run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounters {
    /// Every upload attempt sequence started
    pub total_processed: u64,
    /// Uploads accepted by the index
    pub successful: u64,
    /// Content rejections and retry exhaustion
    pub invalid: u64,
}

impl RunCounters {
    /// Zeroes all counters
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
