use std::{path::PathBuf, time::Duration};

use crate::{
    extract::SelectionPolicy, request::ARCHIVE_URL, runtime::Runtime, shell::CleanupPolicy,
};

/// Default chart page name, within the resource root
pub const HTML_FILE: &str = "snr.html";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Archive base URL
    pub archive: String,

    /// Downloads directory
    pub downloads: PathBuf,

    /// Optional network timeout. None: a stalled transfer blocks.
    pub timeout: Option<Duration>,

    /// Satellites and signals to extract
    pub policy: SelectionPolicy,

    /// Downloaded file retention
    pub cleanup: CleanupPolicy,

    /// Chart page location
    pub html: PathBuf,

    /// Open chart page with web browser
    pub open_browser: bool,

    /// Header image location
    pub header_image: PathBuf,
}

impl Settings {
    /// Default [Settings], resolved from this [Runtime]
    pub fn new(runtime: &Runtime) -> Self {
        Self {
            archive: ARCHIVE_URL.to_string(),
            downloads: runtime.downloads(),
            timeout: None,
            policy: SelectionPolicy::default(),
            cleanup: CleanupPolicy::default(),
            html: runtime.resources().join(HTML_FILE),
            open_browser: true,
            header_image: runtime.header_image(),
        }
    }
}
