use flate2::read::MultiGzDecoder;
use std::{fs::File, io::Read, path::Path};

/// Read-only handle to a downloaded observation file
pub enum Input {
    /// Readable file
    Plain(File),

    /// Gzip compressed file, possibly made of several members,
    /// decompressed on the fly
    Gzip(MultiGzDecoder<File>),
}

impl Input {
    /// Opens this file. Gzip compressed files must be terminated with '.gz'.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let handle = File::open(path)?;

        let gzip = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("gz"))
            .unwrap_or(false);

        if gzip {
            Ok(Self::Gzip(MultiGzDecoder::new(handle)))
        } else {
            Ok(Self::Plain(handle))
        }
    }
}

impl Read for Input {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Plain(r) => r.read(buf),
            Self::Gzip(r) => r.read(buf),
        }
    }
}
