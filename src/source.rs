use std::fs;
use std::path::PathBuf;

use reqwest::blocking::Client;
use tracing::debug;

use crate::domain::{SongListError, SourceError, SourceLocation};

/// A place the raw song list text can be fetched from.
pub trait Source: Send {
    fn fetch(&self) -> Result<String, SourceError>;
    fn location(&self) -> String;
}

pub struct HttpSource {
    url: String,
    http: Client,
}

impl HttpSource {
    pub fn new(url: &str) -> Result<Self, SongListError> {
        Ok(Self::with_client(url, Client::builder().build()?))
    }

    pub fn with_client(url: &str, http: Client) -> Self {
        Self {
            url: url.to_string(),
            http,
        }
    }
}

impl Source for HttpSource {
    fn fetch(&self) -> Result<String, SourceError> {
        let response = self.http.get(&self.url).send()?;
        let status = response.status();
        debug!("GET {} -> {}", self.url, status);
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }
        Ok(response.text()?)
    }

    fn location(&self) -> String {
        self.url.clone()
    }
}

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Expands `~` and environment variables in `path`.
    pub fn new(path: &str) -> Result<Self, SongListError> {
        let expanded = shellexpand::full(path)
            .map_err(|e| SongListError::Config(format!("cannot expand {path}: {e}")))?;
        Ok(Self {
            path: PathBuf::from(expanded.as_ref()),
        })
    }
}

impl Source for FileSource {
    fn fetch(&self) -> Result<String, SourceError> {
        Ok(fs::read_to_string(&self.path)?)
    }

    fn location(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}

pub fn from_location(location: &SourceLocation) -> Result<Box<dyn Source>, SongListError> {
    Ok(match location {
        SourceLocation::Url(url) => Box::new(HttpSource::new(url)?),
        SourceLocation::File(path) => Box::new(FileSource::new(&path.to_string_lossy())?),
    })
}
