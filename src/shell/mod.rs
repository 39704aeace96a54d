//! Form driven download and analysis
use log::{debug, error, info, warn};

use std::path::{Path, PathBuf};

use crate::{
    download::Downloader,
    error::{Error, ErrorKind},
    extract::{self, ChannelSeries, ObservationSource, SelectionPolicy, TimeWindow},
    request::DownloadRequest,
    runtime::Runtime,
    settings::Settings,
    utils::{open_with_web_browser, parse_integer},
};

pub mod terminal;

/// NOAA CORS network map
pub const MAP_URL: &str =
    "https://www.arcgis.com/apps/mapviewer/index.html?webmap=261ff9458fd740d6a01b89558b8be1c5";

pub const STATUS_DOWNLOADING: &str = "Downloading file...";
pub const STATUS_DOWNLOAD_FAILED: &str = "Download failed. Check inputs and try again.";
pub const STATUS_ANALYZING: &str = "Analyzing data...This may take a minute or two.";
pub const STATUS_COMPLETE: &str = "Analysis complete.";

/// Status line severity
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Level {
    /// Work in progress
    Progress,
    Error,
    Success,
}

/// Raw form content, not validated
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FieldValues {
    pub station: String,
    pub year: String,
    pub month: String,
    pub day: String,
    pub start_hour: String,
    pub end_hour: String,
}

impl FieldValues {
    /// True when all fields are filled
    pub fn is_complete(&self) -> bool {
        [
            &self.station,
            &self.year,
            &self.month,
            &self.day,
            &self.start_hour,
            &self.end_hour,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }

    fn date(&self) -> Result<(i32, i32, i32), Error> {
        Ok((
            parse_integer("year", &self.year)?,
            parse_integer("month", &self.month)?,
            parse_integer("day", &self.day)?,
        ))
    }

    /// Builds the [DownloadRequest] described by the station and date fields
    pub fn request(&self, archive: &str) -> Result<DownloadRequest, Error> {
        let (year, month, day) = self.date()?;
        DownloadRequest::build_with_archive(archive, year, month, day, &self.station)
    }

    /// Builds the [TimeWindow] described by the date and hour fields
    pub fn window(&self) -> Result<TimeWindow, Error> {
        let (year, month, day) = self.date()?;
        let start_hour = parse_integer("start hour", &self.start_hour)?;
        let end_hour = parse_integer("end hour", &self.end_hour)?;
        TimeWindow::from_day(year, month, day, start_hour, end_hour)
    }
}

/// User facing surface of the [Controller]
pub trait FormView {
    /// Current content of the six form fields
    fn field_values(&mut self) -> FieldValues;

    /// Updates the status line
    fn set_status(&mut self, status: &str, level: Level);

    /// Displays the SNR chart. Returns once the user dismissed it.
    fn show_modal_chart(&mut self, title: &str, channels: &[ChannelSeries]) -> Result<(), Error>;

    /// Opens an external link
    fn open_link(&mut self, url: &str) -> Result<(), Error> {
        open_with_web_browser(url)
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum State {
    #[default]
    Idle,
    Downloading,
    Analyzing,
    Done,
    Failed,
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Downloading => write!(f, "downloading"),
            Self::Analyzing => write!(f, "analyzing"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Retention of the downloaded file
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum CleanupPolicy {
    /// Removed once the run terminates, whatever the outcome
    #[default]
    Always,

    /// Removed on success only, kept for inspection otherwise
    SuccessOnly,
}

/// Downloaded file, owned by one run. Removed when dropped,
/// according to the [CleanupPolicy].
#[derive(Debug)]
pub struct DownloadedFile {
    path: PathBuf,
    cleanup: CleanupPolicy,
    removed: bool,
}

impl DownloadedFile {
    pub fn new(path: PathBuf, cleanup: CleanupPolicy) -> Self {
        Self {
            path,
            cleanup,
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run completed: the file is no longer needed
    pub fn complete(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(_) => debug!("{} removed", self.path.display()),
            Err(e) => warn!("failed to remove {}: {}", self.path.display(), e),
        }
        self.removed = true;
    }
}

impl Drop for DownloadedFile {
    fn drop(&mut self) {
        match self.cleanup {
            CleanupPolicy::Always => self.remove(),
            CleanupPolicy::SuccessOnly => {
                if !self.removed {
                    warn!("{} kept for inspection", self.path.display());
                }
            },
        }
    }
}

/// One submission, from download to chart
#[derive(Debug)]
pub struct Session {
    pub request: DownloadRequest,
    pub file: DownloadedFile,
    pub window: Option<TimeWindow>,
}

impl Session {
    /// Chart title
    pub fn title(&self, policy: &SelectionPolicy) -> String {
        format!(
            "{} {:04}-{:02}-{:02} (DOY {:03}) {}",
            self.request.station.to_uppercase(),
            self.request.year,
            self.request.month,
            self.request.day,
            self.request.day_of_year,
            policy.constellation_name(),
        )
    }
}

/// Drives the pipeline, one handler per user action
pub struct Controller<F: FormView, S: ObservationSource> {
    form: F,
    source: S,
    settings: Settings,
    downloader: Downloader,
    runtime: Runtime,
    state: State,
}

impl<F: FormView, S: ObservationSource> Controller<F, S> {
    pub fn new(form: F, source: S, settings: Settings, runtime: Runtime) -> Result<Self, Error> {
        let downloader = Downloader::new(settings.timeout)?;
        Ok(Self {
            form,
            source,
            settings,
            downloader,
            runtime,
            state: State::Idle,
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut F {
        &mut self.form
    }

    fn transition(&mut self, state: State) -> State {
        debug!("{} - {} -> {}", self.runtime.now(), self.state, state);
        self.state = state;
        state
    }

    /// "Map of NOAA CORS network" action
    pub fn open_map(&mut self) -> Result<(), Error> {
        info!("{} - opening {}", self.runtime.now(), MAP_URL);
        self.form.open_link(MAP_URL)
    }

    /// Submit action: download, analyze, display, clean up.
    /// Failures always resolve to a status message.
    pub async fn submit(&mut self) -> State {
        let fields = self.form.field_values();

        self.transition(State::Downloading);
        self.form.set_status(STATUS_DOWNLOADING, Level::Progress);

        let session = match self.download(&fields).await {
            Ok(session) => session,
            Err(e) => {
                match e.kind() {
                    ErrorKind::InputParse => {
                        error!("{} - invalid request: {}", self.runtime.now(), e)
                    },
                    _ => error!("{} - download failed: {}", self.runtime.now(), e),
                }
                self.form.set_status(STATUS_DOWNLOAD_FAILED, Level::Error);
                return self.transition(State::Failed);
            },
        };

        self.transition(State::Analyzing);
        self.form.set_status(STATUS_ANALYZING, Level::Progress);

        match self.analyze(&fields, session) {
            Ok(_) => {
                info!("{} - analysis complete", self.runtime.now());
                self.form.set_status(STATUS_COMPLETE, Level::Success);
                self.transition(State::Done)
            },
            Err(e) => {
                error!("{} - analysis failed ({:?}): {}", self.runtime.now(), e.kind(), e);
                self.form.set_status(&format!("Error: {}", e), Level::Error);
                self.transition(State::Failed)
            },
        }
    }

    async fn download(&self, fields: &FieldValues) -> Result<Session, Error> {
        let request = fields.request(&self.settings.archive)?;
        let destination = request.local_path(&self.settings.downloads);

        info!("{} - downloading {}", self.runtime.now(), request.url);

        let path = self.downloader.download(&request.url, &destination).await?;

        Ok(Session {
            request,
            file: DownloadedFile::new(path, self.settings.cleanup),
            window: None,
        })
    }

    fn analyze(&mut self, fields: &FieldValues, mut session: Session) -> Result<(), Error> {
        let window = *session.window.insert(fields.window()?);

        debug!("{} - time window {}", self.runtime.now(), window);

        let channels = extract::extract(
            &self.source,
            session.file.path(),
            &window,
            &self.settings.policy,
        )?;

        let title = session.title(&self.settings.policy);
        self.form.show_modal_chart(&title, &channels)?;

        session.file.complete();
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{
        CleanupPolicy, Controller, DownloadedFile, FieldValues, FormView, Level, MAP_URL, State,
        STATUS_ANALYZING, STATUS_COMPLETE, STATUS_DOWNLOAD_FAILED, STATUS_DOWNLOADING,
    };
    use crate::{
        error::Error,
        extract::{ChannelSeries, Dataset, ObservationSource, SelectionPolicy},
        mock::MockArchive,
        runtime::Runtime,
        settings::Settings,
    };
    use hifitime::prelude::{Duration, Epoch, TimeScale};
    use rinex::prelude::SV;
    use std::{path::Path, str::FromStr};

    #[derive(Default)]
    struct RecordingForm {
        fields: FieldValues,
        statuses: Vec<(String, Level)>,
        charts: Vec<(String, Vec<ChannelSeries>)>,
        links: Vec<String>,
        fail_chart: bool,
    }

    impl FormView for RecordingForm {
        fn field_values(&mut self) -> FieldValues {
            self.fields.clone()
        }

        fn set_status(&mut self, status: &str, level: Level) {
            self.statuses.push((status.to_string(), level));
        }

        fn show_modal_chart(
            &mut self,
            title: &str,
            channels: &[ChannelSeries],
        ) -> Result<(), Error> {
            if self.fail_chart {
                return Err(Error::Render("display unavailable".to_string()));
            }
            self.charts.push((title.to_string(), channels.to_vec()));
            Ok(())
        }

        fn open_link(&mut self, url: &str) -> Result<(), Error> {
            self.links.push(url.to_string());
            Ok(())
        }
    }

    impl RecordingForm {
        fn last_status(&self) -> (String, Level) {
            self.statuses.last().cloned().unwrap()
        }
    }

    /// Serves a synthetic [Dataset], provided the downloaded file exists
    struct Synthetic(Dataset);

    impl ObservationSource for Synthetic {
        fn load(&self, path: &Path, _: &SelectionPolicy) -> Result<Dataset, Error> {
            std::fs::metadata(path)?;
            Ok(self.0.clone())
        }
    }

    fn sv(s: &str) -> SV {
        SV::from_str(s).unwrap()
    }

    fn dataset(observables: &[&str]) -> Dataset {
        let mut dataset = Dataset::new();
        let t0 = Epoch::from_gregorian(2025, 3, 10, 0, 0, 0, 0, TimeScale::GPST);
        for i in 0..4 {
            let t = t0 + Duration::from_seconds(3600.0 * i as f64);
            for code in observables {
                dataset.insert(t, sv("G05"), code, 42.0);
                dataset.insert(t, sv("E11"), code, 39.0);
            }
        }
        dataset
    }

    fn abcd_fields() -> FieldValues {
        FieldValues {
            station: "ABCD".to_string(),
            year: "2025".to_string(),
            month: "3".to_string(),
            day: "10".to_string(),
            start_hour: "0".to_string(),
            end_hour: "23".to_string(),
        }
    }

    fn settings(resources: &Path, archive: &str, cleanup: CleanupPolicy) -> Settings {
        let t0 = Epoch::from_gregorian_utc_at_midnight(2025, 3, 10);
        let runtime = Runtime::new(t0).with_resources(resources);
        let mut settings = Settings::new(&runtime);
        settings.archive = archive.to_string();
        settings.cleanup = cleanup;
        settings.open_browser = false;
        settings
    }

    fn controller(
        settings: Settings,
        form: RecordingForm,
        source: Synthetic,
    ) -> Controller<RecordingForm, Synthetic> {
        let t0 = Epoch::from_gregorian_utc_at_midnight(2025, 3, 10);
        Controller::new(form, source, settings, Runtime::new(t0)).unwrap()
    }

    fn remaining_files(dir: &Path) -> usize {
        match std::fs::read_dir(dir) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    #[test]
    fn field_values() {
        let fields = abcd_fields();
        assert!(fields.is_complete());

        let request = fields.request("https://geodesy.noaa.gov").unwrap();
        assert_eq!(
            request.url,
            "https://geodesy.noaa.gov/corsdata/rinex/2025/069/abcd/abcd0690.25o.gz"
        );

        let window = fields.window().unwrap();
        assert_eq!(window.start.hour, 0);
        assert_eq!(window.end.hour, 23);

        let mut fields = abcd_fields();
        fields.end_hour = " ".to_string();
        assert!(!fields.is_complete());
        assert!(fields.request("https://geodesy.noaa.gov").is_ok());
        assert!(fields.window().is_err());
    }

    #[test]
    fn downloaded_file_cleanup() {
        let tmp = tempfile::tempdir().unwrap();

        let path = tmp.path().join("always.25o.gz");
        std::fs::write(&path, b"rinex").unwrap();
        drop(DownloadedFile::new(path.clone(), CleanupPolicy::Always));
        assert!(!path.exists());

        let path = tmp.path().join("kept.25o.gz");
        std::fs::write(&path, b"rinex").unwrap();
        drop(DownloadedFile::new(path.clone(), CleanupPolicy::SuccessOnly));
        assert!(path.exists());

        DownloadedFile::new(path.clone(), CleanupPolicy::SuccessOnly).complete();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn end_to_end() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = MockArchive::serve(200, b"compressed observations".to_vec()).await;

        let settings = settings(tmp.path(), &archive.base_url(), CleanupPolicy::Always);
        let downloads = settings.downloads.clone();

        let form = RecordingForm {
            fields: abcd_fields(),
            ..Default::default()
        };

        let mut controller = controller(settings, form, Synthetic(dataset(&["S1", "S2", "S5"])));
        assert_eq!(controller.state(), State::Idle);

        assert_eq!(controller.submit().await, State::Done);
        assert_eq!(controller.state(), State::Done);

        assert_eq!(
            archive.requested().await.as_deref(),
            Some("/corsdata/rinex/2025/069/abcd/abcd0690.25o.gz")
        );

        let form = controller.form();
        assert_eq!(
            form.statuses,
            vec![
                (STATUS_DOWNLOADING.to_string(), Level::Progress),
                (STATUS_ANALYZING.to_string(), Level::Progress),
                (STATUS_COMPLETE.to_string(), Level::Success),
            ]
        );

        assert_eq!(form.charts.len(), 1);
        let (title, channels) = &form.charts[0];
        assert_eq!(title, "ABCD 2025-03-10 (DOY 069) GPS");
        assert_eq!(channels.len(), 3);
        for channel in channels.iter() {
            assert_eq!(channel.satellites, vec![sv("G05")]);
            assert_eq!(channel.rows(), 4);
        }

        // downloaded file was analyzed, then removed
        assert!(!downloads.join("abcd0690.25o.gz").exists());
        assert_eq!(remaining_files(&downloads), 0);
    }

    #[tokio::test]
    async fn file_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = MockArchive::serve(404, b"not found".to_vec()).await;

        let settings = settings(tmp.path(), &archive.base_url(), CleanupPolicy::Always);
        let downloads = settings.downloads.clone();

        let form = RecordingForm {
            fields: abcd_fields(),
            ..Default::default()
        };

        let mut controller = controller(settings, form, Synthetic(dataset(&["S1", "S2", "S5"])));

        assert_eq!(controller.submit().await, State::Failed);
        assert_eq!(
            controller.form().last_status(),
            (STATUS_DOWNLOAD_FAILED.to_string(), Level::Error)
        );
        assert!(controller.form().charts.is_empty());
        assert_eq!(remaining_files(&downloads), 0);
    }

    #[tokio::test]
    async fn invalid_date() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = settings(tmp.path(), "http://127.0.0.1:9", CleanupPolicy::Always);

        for (month, day) in [("2", "30"), ("march", "10")] {
            let mut fields = abcd_fields();
            fields.month = month.to_string();
            fields.day = day.to_string();

            let form = RecordingForm {
                fields,
                ..Default::default()
            };

            let mut controller = controller(
                settings.clone(),
                form,
                Synthetic(dataset(&["S1", "S2", "S5"])),
            );

            assert_eq!(controller.submit().await, State::Failed);
            assert_eq!(
                controller.form().last_status(),
                (STATUS_DOWNLOAD_FAILED.to_string(), Level::Error)
            );
        }
    }

    #[tokio::test]
    async fn invalid_hour() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = MockArchive::serve(200, b"compressed observations".to_vec()).await;

        let settings = settings(tmp.path(), &archive.base_url(), CleanupPolicy::Always);
        let downloads = settings.downloads.clone();

        let mut fields = abcd_fields();
        fields.end_hour = "24".to_string();

        let form = RecordingForm {
            fields,
            ..Default::default()
        };

        let mut controller = controller(settings, form, Synthetic(dataset(&["S1", "S2", "S5"])));

        assert_eq!(controller.submit().await, State::Failed);

        let (status, level) = controller.form().last_status();
        assert_eq!(level, Level::Error);
        assert_eq!(
            status,
            "Error: invalid hour 24: expecting a value between 0 and 23"
        );

        assert_eq!(remaining_files(&downloads), 0);
    }

    #[tokio::test]
    async fn analysis_failure_cleanup() {
        for (cleanup, kept) in [
            (CleanupPolicy::Always, false),
            (CleanupPolicy::SuccessOnly, true),
        ] {
            let tmp = tempfile::tempdir().unwrap();
            let archive = MockArchive::serve(200, b"compressed observations".to_vec()).await;

            let settings = settings(tmp.path(), &archive.base_url(), cleanup);
            let downloads = settings.downloads.clone();

            let form = RecordingForm {
                fields: abcd_fields(),
                ..Default::default()
            };

            // no L5 signal strength in this file
            let mut controller = controller(settings, form, Synthetic(dataset(&["S1", "S2"])));

            assert_eq!(controller.submit().await, State::Failed);

            let (status, level) = controller.form().last_status();
            assert_eq!(level, Level::Error);
            assert_eq!(status, "Error: observable \"S5\" not found in file");
            assert!(controller.form().charts.is_empty());

            assert_eq!(
                downloads.join("abcd0690.25o.gz").exists(),
                kept,
                "{:?}",
                cleanup
            );
        }
    }

    #[tokio::test]
    async fn chart_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = MockArchive::serve(200, b"compressed observations".to_vec()).await;

        let settings = settings(tmp.path(), &archive.base_url(), CleanupPolicy::Always);

        let form = RecordingForm {
            fields: abcd_fields(),
            fail_chart: true,
            ..Default::default()
        };

        let mut controller = controller(settings, form, Synthetic(dataset(&["S1", "S2", "S5"])));

        assert_eq!(controller.submit().await, State::Failed);
        assert_eq!(
            controller.form().last_status().0,
            "Error: failed to render chart: display unavailable"
        );
    }

    #[tokio::test]
    async fn resubmission() {
        let tmp = tempfile::tempdir().unwrap();

        let settings = settings(tmp.path(), "http://127.0.0.1:9", CleanupPolicy::Always);

        let mut fields = abcd_fields();
        fields.year = "20x5".to_string();

        let form = RecordingForm {
            fields,
            ..Default::default()
        };

        let mut controller = controller(settings, form, Synthetic(dataset(&["S1", "S2", "S5"])));
        assert_eq!(controller.submit().await, State::Failed);

        // form stays populated: correct the faulty field only
        controller.form_mut().fields.year = "2025".to_string();
        assert_eq!(controller.form().fields.station, "ABCD");

        // nothing listens on port 9
        assert_eq!(controller.submit().await, State::Failed);
        assert_eq!(controller.form().statuses.len(), 4);
    }

    #[test]
    fn open_map() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = settings(tmp.path(), "http://127.0.0.1:9", CleanupPolicy::Always);

        let mut controller = controller(
            settings,
            RecordingForm::default(),
            Synthetic(Dataset::new()),
        );

        controller.open_map().unwrap();
        assert_eq!(controller.form().links, vec![MAP_URL.to_string()]);
        assert_eq!(controller.state(), State::Idle);
    }
}
