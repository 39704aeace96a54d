use log::{debug, info, warn};

use std::{
    collections::{BTreeMap, HashMap},
    io::BufReader,
    panic::{AssertUnwindSafe, catch_unwind},
    path::Path,
};

use itertools::Itertools;

use hifitime::prelude::{Epoch, TimeScale};

use rinex::prelude::{Observable, Rinex, SV};

use crate::{
    error::Error,
    extract::{
        ChannelSeries, input::Input, policy::SelectionPolicy, window::TimeWindow,
    },
};

/// Observations of one satellite at one [Epoch]: (observable code, value),
/// in order of appearance.
pub type Signals = Vec<(String, f64)>;

/// In memory observations, indexed by [Epoch] then [SV]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Dataset {
    epochs: BTreeMap<Epoch, BTreeMap<SV, Signals>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a sampling [Epoch], possibly without observations
    pub fn insert_epoch(&mut self, t: Epoch) {
        self.epochs.entry(t).or_default();
    }

    /// Stores one observation
    pub fn insert(&mut self, t: Epoch, sv: SV, observable: &str, value: f64) {
        self.epochs
            .entry(t)
            .or_default()
            .entry(sv)
            .or_default()
            .push((observable.to_string(), value));
    }

    /// Number of sampling epochs
    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    /// [TimeScale] in which the observations are expressed
    pub fn time_scale(&self) -> Option<TimeScale> {
        self.epochs.keys().next().map(|t| t.time_scale)
    }

    /// All satellites, sorted
    pub fn satellites(&self) -> Vec<SV> {
        self.epochs
            .values()
            .flat_map(|svs| svs.keys())
            .copied()
            .unique()
            .sorted()
            .collect()
    }

    /// All observable codes, sorted
    pub fn observables(&self) -> Vec<String> {
        self.epochs
            .values()
            .flat_map(|svs| svs.values())
            .flat_map(|signals| signals.iter().map(|(code, _)| code.clone()))
            .unique()
            .sorted()
            .collect()
    }

    /// Converts parsed Observation [Rinex], retaining the satellites and
    /// observables this [SelectionPolicy] may select.
    pub fn from_rinex(rinex: &Rinex, policy: &SelectionPolicy) -> Self {
        let mut dataset = Self::new();

        // decisions are made once per satellite and per observable
        let mut selected = HashMap::<SV, bool>::new();
        let mut retained = HashMap::<Observable, Option<String>>::new();

        for key in rinex.observation_keys() {
            dataset.insert_epoch(key.epoch);
        }

        for (key, signal) in rinex.signal_observations_iter() {
            let sv = signal.sv;

            if !*selected.entry(sv).or_insert_with(|| policy.selects(&sv)) {
                continue;
            }

            let code = retained
                .entry(signal.observable.clone())
                .or_insert_with(|| {
                    let code = signal.observable.to_string();
                    policy.retains(&code).then_some(code)
                });

            if let Some(code) = code.as_deref() {
                dataset.insert(key.epoch, sv, code, signal.value);
            }
        }

        debug!(
            "observables: {}",
            retained.keys().map(|observable| observable.to_string()).sorted().join(", ")
        );

        dataset
    }

    /// Parses this Observation RINEX file, which may be gzip compressed.
    pub fn from_file(path: &Path, policy: &SelectionPolicy) -> Result<Self, Error> {
        let name = path.display().to_string();

        let mut reader = BufReader::new(Input::open(path)?);

        // the parser is an external component: contain its panics
        let rinex = match catch_unwind(AssertUnwindSafe(|| Rinex::parse(&mut reader))) {
            Ok(parsed) => parsed?,
            Err(_) => return Err(Error::ParserAborted(name)),
        };

        if !rinex.is_observation_rinex() {
            return Err(Error::NotObservation(name));
        }

        let dataset = Self::from_rinex(&rinex, policy);

        if dataset.is_empty() {
            warn!("{}: no observations", name);
        }

        info!(
            "{}: {} epochs, retained: {}",
            name,
            dataset.len(),
            dataset.observables().join(", ")
        );

        Ok(dataset)
    }

    /// Slices this [Dataset] to the [TimeWindow] and extracts one [ChannelSeries]
    /// per band of the [SelectionPolicy]. Columns are all satellites of the
    /// selected constellation, whether they were sampled in the window or not.
    /// Fails if one band observable is not found at all.
    pub fn extract(
        &self,
        window: &TimeWindow,
        policy: &SelectionPolicy,
    ) -> Result<Vec<ChannelSeries>, Error> {
        let observables = self.observables();

        for band in policy.bands.iter() {
            if !observables.iter().any(|code| band.matches(code)) {
                return Err(Error::MissingObservable(band.observable.clone()));
            }
        }

        let satellites = self
            .satellites()
            .into_iter()
            .filter(|sv| policy.selects(sv))
            .collect::<Vec<_>>();

        let in_window = if window.is_inverted() {
            warn!("{}: inverted time window", window);
            Vec::new()
        } else {
            let timescale = self.time_scale().unwrap_or(TimeScale::GPST);
            let (start, end) = window.bounds(timescale);
            self.epochs.range(start..=end).collect::<Vec<_>>()
        };

        debug!(
            "{}: {} epochs, {} {} satellites",
            window,
            in_window.len(),
            satellites.len(),
            policy.constellation_name()
        );

        let channels = policy
            .bands
            .iter()
            .map(|band| {
                let mut series = ChannelSeries::new(band, satellites.clone());

                for (t, svs) in in_window.iter() {
                    debug_assert!(window.contains(**t));

                    let row = satellites
                        .iter()
                        .map(|sv| {
                            svs.get(sv).and_then(|signals| {
                                signals
                                    .iter()
                                    .find(|(code, _)| band.matches(code))
                                    .map(|(_, value)| *value)
                            })
                        })
                        .collect();

                    series.push_row(**t, row);
                }

                series
            })
            .collect();

        Ok(channels)
    }
}
