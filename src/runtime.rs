use std::path::{Path, PathBuf};

use hifitime::prelude::{Duration, Epoch, TimeScale};

/// Downloads directory, within the resource root
pub const DOWNLOADS_DIR: &str = "downloads";

/// Header image, within the resource root
pub const HEADER_IMAGE: &str = "header_image.PNG";

#[derive(Debug, Clone)]
pub struct Runtime {
    /// Epoch of deployment
    deploy_time: Epoch,

    /// Resource root: downloads and header image are resolved from here
    resources: PathBuf,
}

/// Directory of the running executable, or current directory
fn executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Runtime {
    /// New [Runtime], deployed now, resources next to the executable
    pub fn new(deploy_time: Epoch) -> Self {
        Self {
            deploy_time: deploy_time.to_time_scale(TimeScale::UTC),
            resources: executable_dir(),
        }
    }

    /// Copies and returns [Runtime] with custom resource root
    #[cfg(test)]
    pub fn with_resources(&self, resources: &Path) -> Self {
        let mut s = self.clone();
        s.resources = resources.to_path_buf();
        s
    }

    pub fn resources(&self) -> &Path {
        &self.resources
    }

    /// Returns current epoch in [TimeScale::UTC]. Falls back to
    /// deployment time when the system time is not available.
    pub fn utc_time(&self) -> Epoch {
        Epoch::now()
            .map(|t| t.to_time_scale(TimeScale::UTC))
            .unwrap_or(self.deploy_time)
    }

    /// Time since deployment
    pub fn uptime(&self) -> Duration {
        self.utc_time() - self.deploy_time
    }

    /// Current epoch, as printed in log lines (rounded to the second)
    pub fn now(&self) -> Epoch {
        self.utc_time().round(Duration::from_seconds(1.0))
    }

    /// Downloads directory
    pub fn downloads(&self) -> PathBuf {
        self.resources.join(DOWNLOADS_DIR)
    }

    /// Header image location
    pub fn header_image(&self) -> PathBuf {
        self.resources.join(HEADER_IMAGE)
    }
}
