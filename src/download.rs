use log::{debug, error};

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use reqwest::{Client, Response, StatusCode};

use crate::error::Error;

/// Body is written to disk in chunks of this size
pub const CHUNK_SIZE: usize = 8192;

/// Streams archive files to local storage.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
}

impl Downloader {
    /// Builds a new [Downloader]. Requests never time out unless
    /// a timeout is specified.
    pub fn new(timeout: Option<Duration>) -> Result<Self, Error> {
        let mut builder = Client::builder();

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Downloads `url` into `destination`, returns the destination on success.
    /// The destination is only created once the archive replied with status 200.
    /// A partially written file is removed.
    pub async fn download(&self, url: &str, destination: &Path) -> Result<PathBuf, Error> {
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::HttpStatus(status.as_u16()));
        }

        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).map_err(Error::Storage)?;
        }

        let fd = File::create(destination).map_err(Error::Storage)?;
        let mut writer = BufWriter::with_capacity(CHUNK_SIZE, fd);

        match Self::stream(response, &mut writer).await {
            Ok(size) => {
                debug!("{} - {} bytes", destination.display(), size);
                Ok(destination.to_path_buf())
            },
            Err(e) => {
                drop(writer);
                if let Err(e) = std::fs::remove_file(destination) {
                    error!("failed to remove {}: {}", destination.display(), e);
                }
                Err(e)
            },
        }
    }

    async fn stream<W: Write>(mut response: Response, writer: &mut W) -> Result<usize, Error> {
        let mut size = 0;

        while let Some(bytes) = response.chunk().await? {
            for chunk in bytes.chunks(CHUNK_SIZE) {
                writer.write_all(chunk).map_err(Error::Storage)?;
                size += chunk.len();
            }
        }

        writer.flush().map_err(Error::Storage)?;
        Ok(size)
    }
}
