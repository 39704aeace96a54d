use hifitime::prelude::{Epoch, TimeScale};

use crate::{error::Error, request::calendar_date};

/// Naive wall clock hour: no time scale attached. It is expressed in
/// the time scale of the observations it is compared to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WallClock {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
}

impl std::fmt::Display for WallClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:00:00",
            self.year, self.month, self.day, self.hour
        )
    }
}

impl WallClock {
    pub fn new(year: i32, month: i32, day: i32, hour: i32) -> Result<Self, Error> {
        calendar_date(year, month, day)?;

        if !(0..=23).contains(&hour) {
            return Err(Error::InvalidHour(hour));
        }

        Ok(Self {
            year,
            month: month as u8,
            day: day as u8,
            hour: hour as u8,
        })
    }

    /// Expresses this [WallClock] in given [TimeScale]
    pub fn to_epoch(&self, timescale: TimeScale) -> Epoch {
        Epoch::from_gregorian(
            self.year, self.month, self.day, self.hour, 0, 0, 0, timescale,
        )
    }
}

/// Inclusive time window: both bounds are part of it.
/// `start <= end` is not enforced, an inverted window is simply empty.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: WallClock,
    pub end: WallClock,
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

impl TimeWindow {
    /// Builds a [TimeWindow] within a single day
    pub fn from_day(
        year: i32,
        month: i32,
        day: i32,
        start_hour: i32,
        end_hour: i32,
    ) -> Result<Self, Error> {
        Ok(Self {
            start: WallClock::new(year, month, day, start_hour)?,
            end: WallClock::new(year, month, day, end_hour)?,
        })
    }

    /// Returns (start, end) expressed in given [TimeScale]
    pub fn bounds(&self, timescale: TimeScale) -> (Epoch, Epoch) {
        (self.start.to_epoch(timescale), self.end.to_epoch(timescale))
    }

    /// True if this [Epoch] lies within the window,
    /// compared in its own time scale.
    pub fn contains(&self, t: Epoch) -> bool {
        let (start, end) = self.bounds(t.time_scale);
        start <= t && t <= end
    }

    /// True when start > end
    pub fn is_inverted(&self) -> bool {
        let (start, end) = self.bounds(TimeScale::GPST);
        start > end
    }
}
