//! Source fetching.
//!
//! Downloads (or copies) the five BDPM files, transcodes them to UTF-8 and
//! stages them in a scratch directory for the parsers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bdpm_loader::{decode_to_utf8, SourceEncoding, SourceFile, SourceFiles};
use futures::future::try_join_all;
use reqwest::Client;

use crate::error::FetchError;

/// Default hard timeout for one fetch attempt.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(300);

/// Default number of attempts per file.
pub const DEFAULT_FETCH_ATTEMPTS: u32 = 3;

/// Delay before the first retry, doubled after each failed attempt.
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Where one source file comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// An HTTP(S) URL.
    Url(String),
    /// A file on the local filesystem.
    Path(PathBuf),
}

impl SourceLocation {
    /// Interprets a configured string as a URL or a local path.
    pub fn parse(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            Self::Url(value.to_string())
        } else {
            Self::Path(PathBuf::from(value))
        }
    }
}

/// The locations of the five source files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocations {
    entries: Vec<(SourceFile, SourceLocation)>,
}

impl SourceLocations {
    /// Locations under a base URL or directory, using the canonical file names.
    pub fn from_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        let entries = SourceFile::ALL
            .into_iter()
            .map(|file| {
                let location = SourceLocation::parse(&format!("{}/{}", base, file.file_name()));
                (file, location)
            })
            .collect();
        Self { entries }
    }

    /// Locations of the canonical file names inside a local directory.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        let entries = SourceFile::ALL
            .into_iter()
            .map(|file| (file, SourceLocation::Path(dir.join(file.file_name()))))
            .collect();
        Self { entries }
    }

    /// Returns the location of one file.
    pub fn get(&self, file: SourceFile) -> Option<&SourceLocation> {
        self.entries
            .iter()
            .find(|(f, _)| *f == file)
            .map(|(_, location)| location)
    }

    /// Iterates over the five locations in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (SourceFile, &SourceLocation)> {
        self.entries.iter().map(|(file, location)| (*file, location))
    }
}

/// Produces five local, UTF-8 source files for one update cycle.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetches all five files. Any single failure fails the whole fetch.
    async fn fetch_all(&self) -> Result<SourceFiles, FetchError>;
}

/// Fetches sources over HTTP(S) or from local paths.
pub struct HttpFetcher {
    client: Client,
    sources: SourceLocations,
    scratch_dir: PathBuf,
    timeout: Duration,
    attempts: u32,
    backoff: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher staging files into `scratch_dir`.
    pub fn new<P: Into<PathBuf>>(sources: SourceLocations, scratch_dir: P) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("bdpm-service/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            sources,
            scratch_dir: scratch_dir.into(),
            timeout: DEFAULT_FETCH_TIMEOUT,
            attempts: DEFAULT_FETCH_ATTEMPTS,
            backoff: INITIAL_BACKOFF,
        })
    }

    /// Sets the hard timeout applied to every attempt.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the number of attempts per HTTP file (at least 1).
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Sets the delay before the first retry.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// The directory scratch files are written to.
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    async fn fetch_one(&self, file: SourceFile, location: &SourceLocation) -> Result<PathBuf, FetchError> {
        let bytes = match location {
            SourceLocation::Url(url) => self.download(file, url).await?,
            SourceLocation::Path(path) => {
                tokio::time::timeout(self.timeout, tokio::fs::read(path))
                    .await
                    .map_err(|_| self.timeout_error(file))??
            }
        };

        let (text, encoding) = tokio::task::spawn_blocking(move || decode_to_utf8(bytes)).await?;
        if encoding == SourceEncoding::Windows1252 {
            tracing::info!(file = %file, "transcoded source file from {}", encoding);
        }

        let target = self.scratch_dir.join(file.file_name());
        let partial = self.scratch_dir.join(format!("{}.part", file.file_name()));
        if let Err(e) = stage(&partial, &target, text.as_bytes()).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }

        tracing::debug!(file = %file, path = %target.display(), "staged source file");
        Ok(target)
    }

    async fn download(&self, file: SourceFile, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut delay = self.backoff;
        let mut attempt = 1;

        loop {
            match self.attempt(file, url).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) if attempt < self.attempts => {
                    tracing::warn!(
                        file = %file,
                        attempt,
                        error = %e,
                        "fetch attempt failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt(&self, file: SourceFile, url: &str) -> Result<Vec<u8>, FetchError> {
        let request = async {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    file,
                    status: status.as_u16(),
                });
            }
            Ok(response.bytes().await?.to_vec())
        };

        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| self.timeout_error(file))?
    }

    fn timeout_error(&self, file: SourceFile) -> FetchError {
        FetchError::Timeout {
            file,
            timeout: self.timeout,
        }
    }
}

/// Writes `contents` next to `target` and renames it into place.
async fn stage(partial: &Path, target: &Path, contents: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(partial, contents).await?;
    tokio::fs::rename(partial, target).await
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch_all(&self) -> Result<SourceFiles, FetchError> {
        tokio::fs::create_dir_all(&self.scratch_dir).await?;

        let fetches = self
            .sources
            .iter()
            .map(|(file, location)| async move {
                self.fetch_one(file, location).await.map(|path| (file, path))
            });
        let staged = try_join_all(fetches).await?;

        let mut files = SourceFiles::new();
        for (file, path) in staged {
            files.set(file, path);
        }
        files.staged_utf8 = true;
        Ok(files)
    }
}
