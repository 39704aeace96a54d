use std::{fs::File, io::BufReader, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use rinex::prelude::{Constellation, SV};

use crate::error::Error;

/// Maximal number of [Band]s: one chart row (and y axis) each
pub const MAX_BANDS: usize = 8;

/// Frequency band, and the signal strength observable that describes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    /// Band label, for example "L1"
    pub label: String,

    /// Observable code, for example "S1"
    pub observable: String,
}

impl Band {
    pub fn new(label: &str, observable: &str) -> Self {
        Self {
            label: label.to_string(),
            observable: observable.to_string(),
        }
    }

    /// True if this observable code describes this [Band].
    /// RINEX3 codes carry a tracking attribute: "S1C" matches "S1".
    pub fn matches(&self, code: &str) -> bool {
        if code == self.observable {
            return true;
        }
        code.len() == self.observable.len() + 1 && code.starts_with(&self.observable)
    }
}

/// Defines which satellites and signals are extracted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionPolicy {
    /// Satellite identifier prefix, for example "G" for GPS
    pub constellation: String,

    /// Extracted [Band]s, one chart panel each
    pub bands: Vec<Band>,
}

impl Default for SelectionPolicy {
    /// GPS L1, L2 and L5 signal strength
    fn default() -> Self {
        Self {
            constellation: "G".to_string(),
            bands: vec![
                Band::new("L1", "S1"),
                Band::new("L2", "S2"),
                Band::new("L5", "S5"),
            ],
        }
    }
}

impl SelectionPolicy {
    /// Loads a [SelectionPolicy] from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let fd = File::open(path)?;
        let policy: Self = serde_json::from_reader(BufReader::new(fd))?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.constellation.trim().is_empty() {
            return Err(Error::Policy("empty constellation prefix".to_string()));
        }
        if self.bands.is_empty() {
            return Err(Error::Policy("no frequency band selected".to_string()));
        }
        if self.bands.len() > MAX_BANDS {
            return Err(Error::Policy(format!(
                "{} bands selected, {} at most",
                self.bands.len(),
                MAX_BANDS
            )));
        }
        for band in self.bands.iter() {
            if band.observable.trim().is_empty() {
                return Err(Error::Policy(format!("{}: empty observable", band.label)));
            }
        }
        Ok(())
    }

    /// True if this satellite is selected
    pub fn selects(&self, sv: &SV) -> bool {
        sv.to_string().starts_with(&self.constellation)
    }

    /// True if one of the [Band]s is described by this observable code
    pub fn retains(&self, code: &str) -> bool {
        self.bands.iter().any(|band| band.matches(code))
    }

    /// Readable constellation name
    pub fn constellation_name(&self) -> String {
        match Constellation::from_str(&self.constellation) {
            Ok(constellation) => constellation.to_string(),
            Err(_) => self.constellation.clone(),
        }
    }
}
