use std::path::{Path, PathBuf};

use hifitime::prelude::{Epoch, TimeScale};

use crate::error::Error;

/// NOAA CORS public archive
pub const ARCHIVE_URL: &str = "https://geodesy.noaa.gov";

/// Daily observation file of one CORS station, as published by the archive.
/// Everything is derived from the station code and the calendar date.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    /// Station code, lowercase
    pub station: String,
    pub year: i32,
    pub month: u8,
    pub day: u8,
    /// Day of year (1..=366)
    pub day_of_year: u16,
    /// Remote (and local) file name
    pub filename: String,
    /// Remote URL
    pub url: String,
}

/// Returns midnight of this calendar date, or [Error::InvalidDate].
pub(crate) fn calendar_date(year: i32, month: i32, day: i32) -> Result<Epoch, Error> {
    let invalid = || Error::InvalidDate(year, month, day);

    let m = u8::try_from(month).map_err(|_| invalid())?;
    let d = u8::try_from(day).map_err(|_| invalid())?;

    // GPST is free of leap seconds: whole days between two midnights
    Epoch::maybe_from_gregorian(year, m, d, 0, 0, 0, 0, TimeScale::GPST).map_err(|_| invalid())
}

/// 1-based day of year of this calendar date
pub(crate) fn day_of_year(year: i32, month: i32, day: i32) -> Result<u16, Error> {
    let t = calendar_date(year, month, day)?;
    let jan1 = calendar_date(year, 1, 1)?;
    let days = ((t - jan1).to_seconds() / 86_400.0).round() as u16;
    Ok(days + 1)
}

impl DownloadRequest {
    /// Builds the [DownloadRequest] for this station and date, on the NOAA archive.
    pub fn build(year: i32, month: i32, day: i32, station: &str) -> Result<Self, Error> {
        Self::build_with_archive(ARCHIVE_URL, year, month, day, station)
    }

    /// Builds the [DownloadRequest] for this station and date,
    /// using a custom archive (mirror) base URL.
    pub fn build_with_archive(
        archive: &str,
        year: i32,
        month: i32,
        day: i32,
        station: &str,
    ) -> Result<Self, Error> {
        let day_of_year = day_of_year(year, month, day)?;

        let station = station.trim().to_lowercase();
        let yy = year.rem_euclid(100);

        let filename = format!("{}{:03}0.{:02}o.gz", station, day_of_year, yy);

        let url = format!(
            "{}/corsdata/rinex/{:04}/{:03}/{}/{}",
            archive.trim_end_matches('/'),
            year,
            day_of_year,
            station,
            filename
        );

        Ok(Self {
            year,
            month: month as u8,
            day: day as u8,
            day_of_year,
            station,
            filename,
            url,
        })
    }

    /// Local file path, within given download directory
    pub fn local_path(&self, downloads: &Path) -> PathBuf {
        downloads.join(&self.filename)
    }
}
