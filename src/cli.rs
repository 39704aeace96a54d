use clap::{Arg, ArgAction, ArgMatches, ColorChoice, Command};

use hifitime::prelude::Duration;

use std::{path::Path, str::FromStr};

use crate::{
    error::Error, extract::SelectionPolicy, runtime::Runtime, settings::Settings,
    shell::{CleanupPolicy, FieldValues},
};

pub struct Cli {
    /// Arguments passed by user
    matches: ArgMatches,
}

/// Parses a network timeout: either a number of seconds ("30"),
/// or any duration description ("1 min", "45 s").
fn parse_timeout(value: &str) -> Result<std::time::Duration, Error> {
    let value = value.trim();
    let invalid = || Error::InvalidDuration(value.to_string());

    let seconds = match value.parse::<f64>() {
        Ok(seconds) => seconds,
        Err(_) => Duration::from_str(value)
            .map_err(|_| invalid())?
            .to_seconds(),
    };

    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(invalid());
    }

    Ok(std::time::Duration::from_secs_f64(seconds))
}

impl Cli {
    /// Command line definition
    pub fn command() -> Command {
        Command::new("cors2snr")
            .version(env!("CARGO_PKG_VERSION"))
            .about("CORS observation downloader and SNR time series viewer")
            .color(ColorChoice::Always)
            .next_help_heading("Form fields (prompted when missing)")
            .arg(
                Arg::new("station")
                    .short('s')
                    .long("station")
                    .value_name("CODE")
                    .action(ArgAction::Set)
                    .help("CORS station (site) code, for example \"ABCD\". Case insensitive."),
            )
            .arg(
                Arg::new("year")
                    .short('y')
                    .long("year")
                    .value_name("YYYY")
                    .action(ArgAction::Set)
                    .help("Year of observation"),
            )
            .arg(
                Arg::new("month")
                    .short('m')
                    .long("month")
                    .value_name("MM")
                    .action(ArgAction::Set)
                    .help("Month of observation (1-12)"),
            )
            .arg(
                Arg::new("day")
                    .short('d')
                    .long("day")
                    .value_name("DD")
                    .action(ArgAction::Set)
                    .help("Day of month"),
            )
            .arg(
                Arg::new("start")
                    .long("start")
                    .value_name("HOUR")
                    .action(ArgAction::Set)
                    .help("First hour of the time window (0-23), included"),
            )
            .arg(
                Arg::new("end")
                    .long("end")
                    .value_name("HOUR")
                    .action(ArgAction::Set)
                    .help("Last hour of the time window (0-23), included"),
            )
            .arg(
                Arg::new("quiet")
                    .short('q')
                    .long("quiet")
                    .action(ArgAction::SetTrue)
                    .help("Do not prompt. Single run, requires all six form fields."),
            )
            .arg(
                Arg::new("map")
                    .long("map")
                    .action(ArgAction::SetTrue)
                    .help("Open the map of the NOAA CORS network with your web browser, then exit."),
            )
            .next_help_heading("Download")
            .arg(
                Arg::new("archive")
                    .long("archive")
                    .value_name("URL")
                    .action(ArgAction::Set)
                    .help("Custom archive base URL (mirror). Default is \"https://geodesy.noaa.gov\"."),
            )
            .arg(
                Arg::new("downloads")
                    .long("downloads")
                    .value_name("DIR")
                    .action(ArgAction::Set)
                    .help("Custom download directory.
Default is \"downloads\" next to the executable."),
            )
            .arg(
                Arg::new("timeout")
                    .long("timeout")
                    .value_name("DURATION")
                    .action(ArgAction::Set)
                    .help("Network timeout, in seconds (\"30\") or as a duration (\"2 min\").
By default, there is no timeout and a stalled transfer blocks."),
            )
            .arg(
                Arg::new("keep-on-failure")
                    .long("keep-on-failure")
                    .action(ArgAction::SetTrue)
                    .help("Keep the downloaded file when the analysis fails, for inspection.
By default, it is always removed."),
            )
            .next_help_heading("Analysis")
            .arg(
                Arg::new("policy")
                    .long("policy")
                    .value_name("FILE")
                    .action(ArgAction::Set)
                    .help("Load a JSON selection policy (constellation and frequency bands).
Default is GPS L1 (S1), L2 (S2) and L5 (S5)."),
            )
            .arg(
                Arg::new("html")
                    .long("html")
                    .value_name("FILE")
                    .action(ArgAction::Set)
                    .help("Chart page location. Default is \"snr.html\" next to the executable."),
            )
            .arg(
                Arg::new("no-open")
                    .long("no-open")
                    .action(ArgAction::SetTrue)
                    .help("Do not open the chart with your web browser"),
            )
    }

    /// Build new command line interface
    pub fn new() -> Self {
        Self {
            matches: Self::command().get_matches(),
        }
    }

    /// Build command line interface from these arguments
    pub fn from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Ok(Self {
            matches: Self::command().try_get_matches_from(args)?,
        })
    }

    fn field(&self, key: &str) -> String {
        self.matches
            .get_one::<String>(key)
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    }

    /// Prefilled form fields
    pub fn fields(&self) -> FieldValues {
        FieldValues {
            station: self.field("station"),
            year: self.field("year"),
            month: self.field("month"),
            day: self.field("day"),
            start_hour: self.field("start"),
            end_hour: self.field("end"),
        }
    }

    /// Interactive form loop, unless quiet and fully defined
    pub fn interactive(&self) -> bool {
        !(self.matches.get_flag("quiet") && self.fields().is_complete())
    }

    pub fn map(&self) -> bool {
        self.matches.get_flag("map")
    }

    /// [Settings] defined by the user, defaults resolved from [Runtime]
    pub fn settings(&self, runtime: &Runtime) -> Result<Settings, Error> {
        let mut settings = Settings::new(runtime);

        if let Some(archive) = self.matches.get_one::<String>("archive") {
            settings.archive = archive.trim().to_string();
        }

        if let Some(downloads) = self.matches.get_one::<String>("downloads") {
            settings.downloads = Path::new(downloads.trim()).to_path_buf();
        }

        if let Some(timeout) = self.matches.get_one::<String>("timeout") {
            settings.timeout = Some(parse_timeout(timeout)?);
        }

        if let Some(policy) = self.matches.get_one::<String>("policy") {
            settings.policy = SelectionPolicy::from_file(Path::new(policy.trim()))?;
        }

        if self.matches.get_flag("keep-on-failure") {
            settings.cleanup = CleanupPolicy::SuccessOnly;
        }

        if let Some(html) = self.matches.get_one::<String>("html") {
            settings.html = Path::new(html.trim()).to_path_buf();
        }

        settings.open_browser = !self.matches.get_flag("no-open");

        Ok(settings)
    }
}
