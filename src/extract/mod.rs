//! Windowed SNR extraction
use std::path::Path;

use hifitime::prelude::Epoch;

use rinex::prelude::SV;

use crate::error::Error;

mod dataset;
mod input;
mod policy;
mod window;

pub use dataset::Dataset;
pub use policy::{Band, MAX_BANDS, SelectionPolicy};
pub use window::TimeWindow;

/// Provides the [Dataset] contained in a downloaded file,
/// restricted to what the [SelectionPolicy] retains.
pub trait ObservationSource {
    fn load(&self, path: &Path, policy: &SelectionPolicy) -> Result<Dataset, Error>;
}

/// [ObservationSource] backed by the RINEX parser
#[derive(Debug, Default, Copy, Clone)]
pub struct RinexSource;

impl ObservationSource for RinexSource {
    fn load(&self, path: &Path, policy: &SelectionPolicy) -> Result<Dataset, Error> {
        Dataset::from_file(path, policy)
    }
}

/// Opens this file and extracts one [ChannelSeries] per selected band,
/// restricted to the [TimeWindow]. The source file is not modified.
pub fn extract<S: ObservationSource>(
    source: &S,
    path: &Path,
    window: &TimeWindow,
    policy: &SelectionPolicy,
) -> Result<Vec<ChannelSeries>, Error> {
    let dataset = source.load(path, policy)?;
    dataset.extract(window, policy)
}

/// SNR table of one frequency band: one row per [Epoch],
/// one column per [SV]. Missing cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSeries {
    /// Band label, for example "L1"
    pub label: String,

    /// Observable code, for example "S1"
    pub observable: String,

    /// Rows
    pub epochs: Vec<Epoch>,

    /// Columns
    pub satellites: Vec<SV>,

    values: Vec<Vec<Option<f64>>>,
}

impl ChannelSeries {
    /// New empty [ChannelSeries] for this [Band] and these columns
    pub fn new(band: &Band, satellites: Vec<SV>) -> Self {
        Self {
            label: band.label.clone(),
            observable: band.observable.clone(),
            epochs: Vec::new(),
            satellites,
            values: Vec::new(),
        }
    }

    /// Appends one row. Values are given in column order.
    pub fn push_row(&mut self, t: Epoch, values: Vec<Option<f64>>) {
        debug_assert_eq!(values.len(), self.satellites.len());
        self.epochs.push(t);
        self.values.push(values);
    }

    pub fn rows(&self) -> usize {
        self.epochs.len()
    }

    pub fn columns(&self) -> usize {
        self.satellites.len()
    }

    /// True if this table does not contain a single value
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(|row| row.iter().all(Option::is_none))
    }

    /// Value at this row, for this satellite
    #[cfg(test)]
    pub fn value(&self, row: usize, sv: &SV) -> Option<f64> {
        let column = self.satellites.iter().position(|s| s == sv)?;
        self.values.get(row)?.get(column).copied().flatten()
    }

    /// Time series of this satellite, missing samples omitted
    pub fn column(&self, sv: &SV) -> Vec<(Epoch, f64)> {
        let Some(column) = self.satellites.iter().position(|s| s == sv) else {
            return Vec::new();
        };

        self.epochs
            .iter()
            .zip(self.values.iter())
            .filter_map(|(t, row)| row[column].map(|value| (*t, value)))
            .collect()
    }

    /// Panel title
    pub fn title(&self) -> String {
        format!("SNR over time ({})", self.label)
    }
}
